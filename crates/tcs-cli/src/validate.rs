//! # Validate Subcommand
//!
//! Checks the structure of a TinCan JSON document against the composite
//! schema, either as one named type id or as every type id in turn.
//!
//! The document comes from a file (`.yaml`/`.yml` files are read as YAML)
//! or from stdin when no file is given. Output on stdout is one of:
//!
//! ```text
//! VALID as a tcapi:1.0.1#statement
//! INVALID JSON file 'statement.json' as a tcapi:1.0.1#statement
//! UNKNOWN schema type id 'statment'
//! See 'schema/1.0.1' for allowed type ids.
//! ```

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use serde_json::Value;

use tcs_core::{render_report, SchemaError};
use tcs_schema::io::{parse_json, read_instance_file, read_stdin, STDIN_ORIGIN};
use tcs_schema::SchemaCatalog;

use crate::output::print_error;

/// Arguments for the `tcs validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Document to check. Reads stdin when omitted.
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Check against this type id. Every type id is tried when omitted.
    #[arg(short = 't', long = "type", value_name = "ID")]
    pub type_id: Option<String>,

    /// Use this schema directory instead of `schema/1.0.1`.
    #[arg(short, long, value_name = "DIR")]
    pub schema: Option<PathBuf>,

    /// More informative messages, including the error report.
    #[arg(short, long)]
    pub verbose: bool,

    /// Even more messages.
    #[arg(short, long)]
    pub debug: bool,
}

impl ValidateArgs {
    /// Default log level for this subcommand.
    pub fn log_level(&self) -> &'static str {
        if self.debug {
            "debug"
        } else if self.verbose {
            "info"
        } else {
            "warn"
        }
    }

    fn shows_report(&self) -> bool {
        self.verbose || self.debug
    }
}

/// Execute the validate subcommand.
///
/// Returns exit code: 0 when the document is valid, 1 otherwise.
pub async fn run_validate(args: &ValidateArgs, repo_root: &Path) -> Result<u8> {
    let settings = crate::schema_settings(args.schema.as_deref(), repo_root);
    let catalog = match SchemaCatalog::load(settings).await {
        Ok(catalog) => catalog,
        Err(e) => {
            print_error(&e);
            return Ok(1);
        }
    };

    let (instance, origin) = match read_instance(args.file.as_deref()).await {
        Ok(read) => read,
        Err(e) => {
            print_error(&e);
            return Ok(1);
        }
    };
    tracing::info!("Processing '{origin}' ...");

    let Some(id) = args.type_id.as_deref() else {
        tracing::warn!("WARNING: No schema id provided; trying all possibilities (may take a while...)");
        return match catalog.validate_as_any(&instance) {
            Ok(ids) => {
                for id in ids {
                    println!("VALID as a {}", catalog.uri_for(&id));
                }
                Ok(0)
            }
            Err(e) => {
                report_invalid(args, &catalog, &e, &origin, None);
                Ok(1)
            }
        };
    };

    match catalog.validate_with_id(&instance, id) {
        Ok(()) => {
            println!("VALID as a {}", catalog.uri_for(id));
            Ok(0)
        }
        Err(SchemaError::UnknownSchemaReference { .. }) => {
            println!(
                "UNKNOWN schema type id '{id}'\nSee '{}' for allowed type ids.",
                catalog.schema_dir().display()
            );
            Ok(1)
        }
        Err(e) => {
            report_invalid(args, &catalog, &e, &origin, Some(id));
            Ok(1)
        }
    }
}

/// Read the document from `file`, or stdin when `None`. Returns the value
/// and the name to report it under.
async fn read_instance(file: Option<&Path>) -> Result<(Value, String), SchemaError> {
    match file {
        Some(path) => {
            let value = read_instance_file(path).await?;
            Ok((value, path.display().to_string()))
        }
        None => {
            let text = read_stdin().await?;
            Ok((parse_json(&text, STDIN_ORIGIN)?, STDIN_ORIGIN.to_string()))
        }
    }
}

fn report_invalid(args: &ValidateArgs, catalog: &SchemaCatalog, err: &SchemaError, origin: &str, id: Option<&str>) {
    if args.shows_report() {
        println!("{}", render_report(&err.to_report()));
    }
    println!("{}", invalid_line(catalog.schema_name(), origin, id));
}

/// `INVALID JSON file '<origin>'`, naming the type when one was given.
pub fn invalid_line(schema_name: &str, origin: &str, id: Option<&str>) -> String {
    match id {
        Some(id) => format!("INVALID JSON file '{origin}' as a {schema_name}#{id}"),
        None => format!("INVALID JSON file '{origin}'"),
    }
}
