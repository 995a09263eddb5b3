//! # tcs CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.
//! Uses clap derive macros for argument parsing.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tcs_cli::join::{run_join, JoinArgs};
use tcs_cli::split::{run_split, SplitArgs};
use tcs_cli::suite::{run_suite, SuiteArgs};
use tcs_cli::validate::{run_validate, ValidateArgs};

/// TinCan schema toolkit
///
/// Joins and splits draft-04 schema directories, validates TinCan JSON
/// documents against them, and runs the fixture suite.
#[derive(Parser, Debug)]
#[command(name = "tcs", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read a directory of JSON schema and save them in a single file.
    Join(JoinArgs),

    /// Read a single JSON schema file and save its properties as separate files.
    Split(SplitArgs),

    /// Check the structure of TinCan JSON data (file or stdin).
    Validate(ValidateArgs),

    /// Check the fixture JSONs against the TinCan schema.
    Suite(SuiteArgs),
}

impl Commands {
    fn log_level(&self) -> &'static str {
        match self {
            Self::Join(args) => args.log_level(),
            Self::Split(args) => args.log_level(),
            Self::Validate(args) => args.log_level(),
            Self::Suite(args) => args.log_level(),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over the subcommand's flags.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.command.log_level()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("tcs CLI v{} starting", env!("CARGO_PKG_VERSION"));

    let result = match &cli.command {
        Commands::Join(args) => run_join(args).await,
        Commands::Split(args) => run_split(args).await,
        Commands::Validate(args) => run_validate(args, &repo_root()).await,
        Commands::Suite(args) => run_suite(args, &repo_root()).await,
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

/// Repository root, or the current directory when none is found.
fn repo_root() -> PathBuf {
    let root = resolve_repo_root().unwrap_or_else(|| {
        tracing::debug!("Could not locate repository root; using current directory");
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    });
    tracing::debug!(repo_root = %root.display(), "resolved repository root");
    root
}

/// Walk up from the current directory to find the repository root.
///
/// The repo root is identified by the presence of a `schema/` directory.
fn resolve_repo_root() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    let mut dir = cwd.as_path();
    loop {
        if dir.join("schema").is_dir() {
            return Some(dir.to_path_buf());
        }
        dir = dir.parent()?;
    }
}
