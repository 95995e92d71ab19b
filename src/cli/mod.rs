//! Command-line interface for config-aggregator
//!
//! Provides `get`, `sources`, `compare` and `stats` subcommands over one
//! configuration root.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::ConfigError;

mod compare;
mod get;
mod sources;
mod stats;
mod utils;

/// Merge per-application configuration by profile and compare profiles
#[derive(Parser)]
#[command(name = "config-aggregator")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration root (overrides settings and CONFIG_ROOT_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Settings file (TOML or YAML)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the merged configuration for an application and profile
    Get(get::GetArgs),

    /// List the files that contribute to an application and profile
    Sources(sources::SourcesArgs),

    /// Compare two profiles for one application or all of them
    Compare(compare::CompareArgs),

    /// Print cache statistics
    Stats,
}

/// Options shared by every subcommand.
pub(crate) struct GlobalArgs {
    pub root: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG in the environment always takes precedence; --verbose falls back to DEBUG.
    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    let global = GlobalArgs { root: cli.root, config: cli.config };
    match cli.command {
        Commands::Get(args) => get::run(&global, args),
        Commands::Sources(args) => sources::run(&global, args),
        Commands::Compare(args) => compare::run(&global, args),
        Commands::Stats => stats::run(&global),
    }
}

/// `2` when the failure is a missing configuration, `1` otherwise.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    let not_found = err
        .chain()
        .filter_map(|cause| cause.downcast_ref::<ConfigError>())
        .any(ConfigError::is_not_found);
    if not_found {
        2
    } else {
        1
    }
}
