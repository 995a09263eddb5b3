//! # Split Subcommand
//!
//! Writes each top-level property of a composite schema to
//! `<dst_dir>/<name>.json`, creating the directory if needed.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use tcs_core::SchemaError;
use tcs_schema::{SchemaFiles, SchemaRepository, SchemaSplitter, Validator};

use crate::output::print_error;

/// Arguments for the `tcs split` subcommand.
#[derive(Args, Debug)]
pub struct SplitArgs {
    /// Composite schema file to read.
    #[arg(value_name = "SRC_FILE")]
    pub src_file: PathBuf,

    /// Directory to write fragment schemas into.
    #[arg(value_name = "DST_DIR")]
    pub dst_dir: PathBuf,

    /// Silence most messages.
    #[arg(short, long)]
    pub quiet: bool,

    /// Skip metaschema checks of the fragments.
    #[arg(long)]
    pub no_validate: bool,
}

impl SplitArgs {
    /// Default log level for this subcommand.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            "warn"
        } else {
            "info"
        }
    }
}

/// Execute the split subcommand.
///
/// Returns exit code: 0 once every fragment is written, 1 otherwise.
pub async fn run_split(args: &SplitArgs) -> Result<u8> {
    let validator = Arc::new(Validator::new(Arc::new(SchemaRepository::new())));
    let files = SchemaFiles::new(validator).with_validation(!args.no_validate);

    match SchemaSplitter::new(files)
        .split_file(&args.src_file, &args.dst_dir)
        .await
    {
        Ok(written) => {
            tracing::debug!(fragments = written.len(), dst = %args.dst_dir.display(), "split schema");
            Ok(0)
        }
        Err(e) => {
            if missing_source(&e, args) {
                eprintln!("ERROR: File '{}' does not exist", args.src_file.display());
            } else {
                print_error(&e);
            }
            Ok(1)
        }
    }
}

/// True when `err` is the source file not existing.
fn missing_source(err: &SchemaError, args: &SplitArgs) -> bool {
    matches!(
        err.root_cause(),
        SchemaError::Io { path, .. } if *path == args.src_file && err.root_cause().code() == Some("ENOENT")
    )
}
