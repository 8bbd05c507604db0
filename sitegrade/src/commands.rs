use crate::CLAP_STYLING;
use clap::{arg, command};

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("sitegrade")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("sitegrade")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Initializes the sitegrade database and config directory")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Location to store the sitegrade database")
                        .default_value("~/.config/sitegrade/"),
                )
                .arg(
                    arg!(-f - -"force")
                        .help("Forces the overwriting of any existing database at the specified location.")
                        .required(false),
                ),
        )
        .subcommand(
            command!("audit")
                .about("Crawl a site, run the SEO check set against it and grade the result")
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The site to audit; the scheme may be omitted"),
                )
                .arg(
                    arg!(--"plan" <PLAN>)
                        .required(false)
                        .help("Plan tier recorded in the report")
                        .value_parser(["free", "pro"])
                        .default_value("free"),
                )
                .arg(
                    arg!(--"max-pages" <N>)
                        .required(false)
                        .help("Maximum number of pages to crawl")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"max-depth" <N>)
                        .required(false)
                        .help("Maximum link depth from the seed page")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"checks" <PATH>)
                        .required(false)
                        .help("Path to a check-definitions document (default: built-in set)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(--"scoring" <PATH>)
                        .required(false)
                        .help("Path to a scoring-model document (default: built-in model)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json, markdown")
                        .value_parser(["text", "json", "markdown"])
                        .default_value("text"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save the rendered report to a file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(--"db" <PATH>)
                        .required(false)
                        .help("Config directory holding the report database")
                        .default_value("~/.config/sitegrade/"),
                )
                .arg(
                    arg!(--"no-save")
                        .required(false)
                        .help("Do not persist the report to the database")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            command!("report")
                .about("Re-render a stored audit report")
                .arg(
                    arg!(-i --"id" <REPORT_ID>)
                        .required(true)
                        .help("The report id printed when the audit was saved"),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json, markdown")
                        .value_parser(["text", "json", "markdown"])
                        .default_value("text"),
                )
                .arg(
                    arg!(--"db" <PATH>)
                        .required(false)
                        .help("Config directory holding the report database")
                        .default_value("~/.config/sitegrade/"),
                ),
        )
        .subcommand(
            command!("fix")
                .about("Show step-by-step remediation content for a failed check (pro)")
                .arg(
                    arg!(-i --"id" <REPORT_ID>)
                        .required(true)
                        .help("The report the check belongs to"),
                )
                .arg(
                    arg!(-c --"check" <CHECK_ID>)
                        .required(true)
                        .help("The check id to look up"),
                )
                .arg(
                    arg!(--"kb" <DIR>)
                        .required(false)
                        .help("Knowledge-base directory")
                        .default_value("~/.config/sitegrade/kb/"),
                )
                .arg(
                    arg!(--"db" <PATH>)
                        .required(false)
                        .help("Config directory holding the report database")
                        .default_value("~/.config/sitegrade/"),
                ),
        )
}
