//! Helpers shared by the CLI entry point: document loading, database
//! resolution and report rendering.

use anyhow::{Context, Result, bail};
use colored::{ColoredString, Colorize};
use sitegrade_core::model::{ChecksDocument, ScoringDocument};
use sitegrade_core::report::{
    AuditReport, ReportFormat, generate_json_report, generate_markdown_report,
    generate_text_report,
};
use std::path::{Path, PathBuf};

/// Built-in check set, used unless --checks overrides it.
pub const DEFAULT_CHECKS: &str = include_str!("../data/seo_checks.json");
/// Built-in scoring model, used unless --scoring overrides it.
pub const DEFAULT_SCORING: &str = include_str!("../data/scoring_model.json");

pub const DATABASE_FILE: &str = "sitegrade.db";

/// Expand `~` and resolve the database file inside the config directory.
pub fn resolve_db_path(config_dir: &str) -> PathBuf {
    let expanded = shellexpand::tilde(config_dir);
    Path::new(expanded.as_ref()).join(DATABASE_FILE)
}

pub fn resolve_dir(dir: &str) -> PathBuf {
    let expanded = shellexpand::tilde(dir);
    PathBuf::from(expanded.as_ref())
}

/// Load the declarative documents, from override paths when given, else
/// the embedded defaults. Malformed documents abort before any crawl.
pub fn load_documents(
    checks_path: Option<&PathBuf>,
    scoring_path: Option<&PathBuf>,
) -> Result<(ChecksDocument, ScoringDocument)> {
    let checks = match checks_path {
        Some(path) => ChecksDocument::from_path(path),
        None => ChecksDocument::from_json(DEFAULT_CHECKS),
    }
    .context("failed to load check definitions")?;

    let scoring = match scoring_path {
        Some(path) => ScoringDocument::from_path(path),
        None => ScoringDocument::from_json(DEFAULT_SCORING),
    }
    .context("failed to load scoring model")?;

    Ok((checks, scoring))
}

pub fn render_report(report: &AuditReport, format: &ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(report)),
        ReportFormat::Markdown => Ok(generate_markdown_report(report)),
        ReportFormat::Json => generate_json_report(report).context("failed to serialize report"),
    }
}

pub fn parse_format(raw: &str) -> Result<ReportFormat> {
    match ReportFormat::from_str(raw) {
        Some(format) => Ok(format),
        None => bail!("unknown report format: {raw}"),
    }
}

/// Grade letter colored for terminal display.
pub fn colored_grade(grade: &str) -> ColoredString {
    match grade {
        "A" => grade.green().bold(),
        "B" => grade.cyan().bold(),
        "C" => grade.yellow().bold(),
        _ => grade.red().bold(),
    }
}
