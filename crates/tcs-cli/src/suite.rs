//! # Suite Subcommand
//!
//! Checks the fixture files under a data directory against the schema and
//! prints one line per type id followed by a summary.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;

use tcs_core::render_report;
use tcs_schema::suite::{CategoryReport, FixtureOutcome};
use tcs_schema::SchemaCatalog;

use crate::output::print_error;

/// Fixture directory used when none is given, relative to the repository
/// root.
pub const DEFAULT_DATA_DIR: &str = "test/data";

/// Arguments for the `tcs suite` subcommand.
#[derive(Args, Debug)]
pub struct SuiteArgs {
    /// Type ids to check. Every sub-directory of the data directory when
    /// omitted.
    #[arg(value_name = "ID")]
    pub ids: Vec<String>,

    /// Directory holding one fixture directory per type id.
    #[arg(long, value_name = "DIR", default_value = DEFAULT_DATA_DIR)]
    pub data: PathBuf,

    /// Use this schema directory instead of `schema/1.0.1`.
    #[arg(short, long, value_name = "DIR")]
    pub schema: Option<PathBuf>,

    /// Also list passing fixtures and the failures bad fixtures produced.
    #[arg(short, long)]
    pub verbose: bool,
}

impl SuiteArgs {
    /// Default log level for this subcommand.
    pub fn log_level(&self) -> &'static str {
        "warn"
    }
}

/// Execute the suite subcommand.
///
/// Returns exit code: 0 when every fixture behaves as expected, 1 otherwise.
pub async fn run_suite(args: &SuiteArgs, repo_root: &Path) -> Result<u8> {
    let settings = crate::schema_settings(args.schema.as_deref(), repo_root);
    let catalog = match SchemaCatalog::load(settings).await {
        Ok(catalog) => catalog,
        Err(e) => {
            print_error(&e);
            return Ok(1);
        }
    };

    let data_dir = crate::resolve_path(&args.data, repo_root);
    let report = match tcs_schema::run_suite(&catalog, &data_dir, &args.ids).await {
        Ok(report) => report,
        Err(e) => {
            print_error(&e);
            return Ok(1);
        }
    };

    for category in &report.categories {
        print_category(category, args.verbose);
    }
    println!("\n{}", report.summary());

    Ok(if report.all_passed() { 0 } else { 1 })
}

fn print_category(category: &CategoryReport, verbose: bool) {
    for result in &category.results {
        let path = result.info.path.display();
        match &result.outcome {
            FixtureOutcome::Failed(err) => {
                println!("FAILED: {path}");
                println!("{}", render_report(err));
            }
            FixtureOutcome::Passed { expected_error } if verbose => {
                println!("OK:     {path}");
                if let Some(err) = expected_error {
                    println!("{}", render_report(err));
                }
            }
            FixtureOutcome::Passed { .. } => {}
        }
    }
    println!("{category}");
}
