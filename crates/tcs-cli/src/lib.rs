//! # tcs-cli — CLI Tool for the TinCan Schema Toolkit
//!
//! Provides the `tcs` command-line interface over `tcs-schema`.
//!
//! ## Subcommands
//!
//! - `tcs join`: Compose a directory of fragments into one schema file.
//! - `tcs split`: Write a composite schema back out as fragments.
//! - `tcs validate`: Check a statement (file or stdin) by type id.
//! - `tcs suite`: Run the good/bad fixture suite.
//!
//! ```bash
//! tcs join schema/1.0.1 tcapi.json
//! tcs split tcapi.json schema/1.0.1
//! tcs validate statement.json --type statement
//! cat statement.json | tcs validate -t statement -v
//! tcs suite statement agent --data test/data
//! ```
//!
//! Each subcommand returns an exit code rather than exiting: 0 on success,
//! 1 on any failure. Errors are rendered here and nowhere else.

pub mod join;
pub mod output;
pub mod split;
pub mod suite;
pub mod validate;

use std::path::{Path, PathBuf};

use tcs_schema::{SchemaSettings, DEFAULT_SCHEMA_DIR};

/// Resolve a path that may be relative to the repository root.
///
/// If the path is absolute, returns it as-is. If relative and the file
/// exists relative to `repo_root`, uses that. Otherwise returns the path
/// relative to the current directory.
pub fn resolve_path(path: &Path, repo_root: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let repo_relative = repo_root.join(path);
    if repo_relative.exists() {
        repo_relative
    } else {
        path.to_path_buf()
    }
}

/// Schema settings for an optional `--schema` directory.
///
/// Paths given on the command line are taken relative to the current
/// directory first; the default directory lives under `repo_root`.
pub fn schema_settings(schema_dir: Option<&Path>, repo_root: &Path) -> SchemaSettings {
    match schema_dir {
        Some(dir) if dir.exists() => SchemaSettings::new(dir),
        Some(dir) => SchemaSettings::new(resolve_path(dir, repo_root)),
        None => SchemaSettings::new(repo_root.join(DEFAULT_SCHEMA_DIR)),
    }
}
