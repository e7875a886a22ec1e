//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Extension Planner - Check which extensions can be installed, and how
#[derive(Parser, Debug)]
#[command(name = "planner")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by commands reading a catalog
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct CatalogArgs {
    /// Extension catalog file (TOML)
    #[arg(short, long, env = "PLANNER_CATALOG")]
    pub catalog: PathBuf,

    /// Resolver configuration file (TOML)
    #[arg(long, env = "PLANNER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output as JSON for scripting
    #[arg(long)]
    pub json: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Find every flavor installable in a namespace
    ///
    /// Examples:
    ///   planner resolve -c catalog.toml -n wiki:main --query flavor
    ///   planner resolve -c catalog.toml -n wiki:main --known blog@2.0 --known wiki-kit
    Resolve {
        #[command(flatten)]
        catalog: CatalogArgs,

        /// Target namespace
        #[arg(short, long)]
        namespace: String,

        /// Search text used to discover candidates
        #[arg(short, long)]
        query: Option<String>,

        /// Known candidate, as name or name@version (repeatable)
        #[arg(short, long)]
        known: Vec<String>,
    },

    /// Show the installation plan of one extension
    ///
    /// Without a version, the newest installable version is used.
    Plan {
        #[command(flatten)]
        catalog: CatalogArgs,

        /// Target namespace
        #[arg(short, long)]
        namespace: String,

        /// Extension, as name or name@version
        extension: String,
    },

    /// List the known versions of an extension, newest first
    Versions {
        #[command(flatten)]
        catalog: CatalogArgs,

        /// Mark the version installed in this namespace
        #[arg(short, long)]
        namespace: Option<String>,

        /// Extension name
        name: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
