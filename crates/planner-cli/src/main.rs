//! Extension Planner CLI
//!
//! Checks which extensions can be installed into a namespace, and how.

mod cli;
mod commands;
mod error;

use std::io;

use clap::{CommandFactory, Parser};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use error::{CliError, Result};

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Commands::Resolve {
            catalog,
            namespace,
            query,
            known,
        } => commands::run_resolve(&catalog, &namespace, query.as_deref(), &known),
        Commands::Plan {
            catalog,
            namespace,
            extension,
        } => commands::run_plan(&catalog, &namespace, &extension),
        Commands::Versions {
            catalog,
            namespace,
            name,
        } => commands::run_versions(&catalog, namespace.as_deref(), &name),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "planner", &mut io::stdout());
            Ok(())
        }
    }
}

/// Logs go to stderr so `--json` output stays parseable.
///
/// `RUST_LOG` wins over the default level; `--verbose` raises the default
/// to debug.
fn init_logging(verbose: bool) -> Result<()> {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|e| CliError::user(format!("failed to set up logging: {e}")))?;

    tracing::debug!("Verbose mode enabled");
    Ok(())
}
