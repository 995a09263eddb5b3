//! # Join Subcommand
//!
//! Reads a directory of fragment schemas and saves them as one composite
//! schema file. Nothing is written unless every fragment loads, carries the
//! `id` its file name implies, and passes the draft-04 metaschema.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use tcs_schema::{SchemaComposer, SchemaFiles, SchemaRepository, Validator};

use crate::output::print_error;

/// Arguments for the `tcs join` subcommand.
#[derive(Args, Debug)]
pub struct JoinArgs {
    /// Directory of fragment schemas (`<name>.json`, each with `"id": "#<name>"`).
    #[arg(value_name = "SRC_DIR")]
    pub src_dir: PathBuf,

    /// Composite schema file to write.
    #[arg(value_name = "DST_FILE")]
    pub dst_file: PathBuf,

    /// Silence most messages.
    #[arg(short, long)]
    pub quiet: bool,

    /// Skip metaschema checks of the fragments and the composite.
    #[arg(long)]
    pub no_validate: bool,
}

impl JoinArgs {
    /// Default log level for this subcommand.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            "warn"
        } else {
            "info"
        }
    }
}

/// Execute the join subcommand.
///
/// Returns exit code: 0 once the composite is written, 1 otherwise.
pub async fn run_join(args: &JoinArgs) -> Result<u8> {
    let validator = Arc::new(Validator::new(Arc::new(SchemaRepository::new())));
    let files = SchemaFiles::new(validator).with_validation(!args.no_validate);

    match SchemaComposer::new(files)
        .join(&args.src_dir, &args.dst_file)
        .await
    {
        Ok(composite) => {
            let count = composite
                .get("properties")
                .and_then(|p| p.as_object())
                .map_or(0, |p| p.len());
            tracing::debug!(fragments = count, dst = %args.dst_file.display(), "joined schema");
            Ok(0)
        }
        Err(e) => {
            print_error(&e);
            Ok(1)
        }
    }
}
