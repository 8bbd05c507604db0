use clap::ArgMatches;
use commands::command_argument_builder;
use handlers::{
    DATABASE_FILE, colored_grade, load_documents, parse_format, render_report, resolve_db_path,
    resolve_dir,
};
use indicatif::{ProgressBar, ProgressStyle};
use sitegrade_core::audit::{AuditOptions, run_audit_with_progress};
use sitegrade_core::data::Database;
use sitegrade_core::report::{AuditReport, save_report};
use sitegrade_core::{AuditConfig, kb, print_banner};
use std::sync::Arc;
use std::time::Duration;

mod commands;
mod handlers;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    if chosen_command.subcommand().is_none() {
        // No subcommand provided, just show the banner
        return;
    }

    let outcome = match chosen_command.subcommand() {
        Some(("init", primary_command)) => handle_init(primary_command),
        Some(("audit", primary_command)) => handle_audit(primary_command, quiet).await,
        Some(("report", primary_command)) => handle_report(primary_command),
        Some(("fix", primary_command)) => handle_fix(primary_command),
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = outcome {
        eprintln!("✗ {e:#}");
        std::process::exit(1);
    }
}

fn handle_init(args: &ArgMatches) -> anyhow::Result<()> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message("Setting up sitegrade...");

    let config_dir = resolve_dir(args.get_one::<String>("PATH").unwrap());
    let force = args.get_flag("force");
    let db_path = config_dir.join(DATABASE_FILE);

    if Database::exists(&db_path) && !force {
        spinner.finish_and_clear();
        anyhow::bail!(
            "database already exists at {}; use --force to recreate it",
            db_path.display()
        );
    }

    std::fs::create_dir_all(&config_dir)?;
    std::fs::create_dir_all(config_dir.join("kb"))?;

    if Database::exists(&db_path) {
        spinner.set_message("Deleting existing database...");
        Database::drop(&db_path);
    }

    spinner.set_message(format!("Initializing database at: {}", db_path.display()));
    let db = Database::new(&db_path)?;
    db.default_user()?;

    spinner.finish_with_message(format!(
        r#"
    ✓ sitegrade initialization complete!
    ✓ Config directory: {}
    ✓ Database: {}
    "#,
        config_dir.display(),
        db_path.display()
    ));
    Ok(())
}

async fn handle_audit(args: &ArgMatches, quiet: bool) -> anyhow::Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let url = args.get_one::<String>("url").unwrap().clone();
    let plan = args.get_one::<String>("plan").unwrap().clone();
    let format = parse_format(args.get_one::<String>("format").unwrap())?;

    let config = AuditConfig::default();
    let max_pages = args
        .get_one::<usize>("max-pages")
        .copied()
        .unwrap_or(config.default_max_pages_free);
    let max_depth = args
        .get_one::<usize>("max-depth")
        .copied()
        .unwrap_or(config.default_max_depth);

    let (checks_doc, scoring_doc) = load_documents(
        args.get_one::<std::path::PathBuf>("checks"),
        args.get_one::<std::path::PathBuf>("scoring"),
    )?;

    if !quiet {
        println!("\nAuditing {url}");
        println!("Pages: up to {max_pages}, depth {max_depth}, plan {plan}\n");
    }

    let spinner = if quiet {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap(),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(format!("Crawling {url}..."));
        Some(pb)
    };
    let progress = spinner.as_ref().map(|pb| {
        let pb = pb.clone();
        Arc::new(move |count: usize, crawling: String| {
            pb.set_message(format!("Crawling page {}: {crawling}", count + 1));
        }) as sitegrade_scanner::crawler::ProgressCallback
    });

    let options = AuditOptions {
        target_url: url.clone(),
        plan,
        max_pages,
        max_depth,
    };
    let report =
        run_audit_with_progress(&options, &checks_doc, &scoring_doc, &config, progress).await?;

    if let Some(ref pb) = spinner {
        pb.finish_and_clear();
    }

    let rendered = render_report(&report, &format)?;
    match args.get_one::<std::path::PathBuf>("output") {
        Some(path) => {
            save_report(&rendered, path)?;
            if !quiet {
                println!("Report written to {}", path.display());
            }
        }
        None => print!("{rendered}"),
    }

    if !quiet {
        println!(
            "\nScore: {:.0} / 100   Grade: {}",
            report.summary.overall_score,
            colored_grade(&report.summary.grade)
        );
    }

    if !args.get_flag("no-save") {
        let db_path = resolve_db_path(args.get_one::<String>("db").unwrap());
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::new(&db_path)?;
        let user_id = db.default_user()?;
        let report_json = serde_json::to_string(&report)?;
        let report_id = db.insert_report(user_id, &report.audit_meta.target.url, &report_json)?;
        if !quiet {
            println!("Saved as report {report_id} (sitegrade report -i {report_id})");
        }
    }

    Ok(())
}

fn handle_report(args: &ArgMatches) -> anyhow::Result<()> {
    let report_id = args.get_one::<String>("id").unwrap();
    let format = parse_format(args.get_one::<String>("format").unwrap())?;
    let db_path = resolve_db_path(args.get_one::<String>("db").unwrap());

    if !Database::exists(&db_path) {
        anyhow::bail!(
            "no database at {}; run `sitegrade audit` first",
            db_path.display()
        );
    }
    let db = Database::new(&db_path)?;
    let user_id = db.default_user()?;

    let Some(report_json) = db.get_report(report_id, user_id)? else {
        anyhow::bail!("report {report_id} not found");
    };
    let report: AuditReport = serde_json::from_str(&report_json)?;
    print!("{}", render_report(&report, &format)?);
    Ok(())
}

fn handle_fix(args: &ArgMatches) -> anyhow::Result<()> {
    let report_id = args.get_one::<String>("id").unwrap();
    let check_id = args.get_one::<String>("check").unwrap();
    let kb_dir = resolve_dir(args.get_one::<String>("kb").unwrap());
    let db_path = resolve_db_path(args.get_one::<String>("db").unwrap());

    if !Database::exists(&db_path) {
        anyhow::bail!(
            "no database at {}; run `sitegrade audit` first",
            db_path.display()
        );
    }
    let db = Database::new(&db_path)?;
    let user_id = db.default_user()?;

    // the report must belong to this identity before anything is revealed
    if db.get_report(report_id, user_id)?.is_none() {
        anyhow::bail!("report {report_id} not found");
    }

    if !db.is_user_pro(user_id)? {
        println!("Upgrade to Pro to unlock step-by-step fix instructions.");
        return Ok(());
    }

    match kb::load_fix(&kb_dir, check_id) {
        Some(content) => {
            print!("{content}");
            Ok(())
        }
        None => anyhow::bail!("no remediation content for check {check_id}"),
    }
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
