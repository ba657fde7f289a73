//! FlatDB CLI
//!
//! Command-line tools for housing data directories.
//!
//! # Commands
//!
//! - `inspect` - Per-type backing file size and row count
//! - `verify` - Load every type and check that every foreign key resolves
//! - `dump` - Print every row of one type with its field names

mod commands;
mod error;

use clap::{Parser, Subcommand, ValueEnum};
use error::{CliError, CliResult};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// FlatDB command-line tools.
#[derive(Parser)]
#[command(name = "flatdb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the data directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Output format of the reporting commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// Pretty-printed JSON
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Show backing file sizes and row counts
    Inspect {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Load the store and check every foreign key
    Verify,

    /// Print every row of an entity type
    Dump {
        /// Entity type name, e.g. `Project`
        entity_type: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show version information
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    match cli.command {
        Commands::Inspect { format } => {
            let path = cli.path.ok_or(CliError::MissingPath("inspect"))?;
            commands::inspect::run(&path, format)
        }
        Commands::Verify => {
            let path = cli.path.ok_or(CliError::MissingPath("verify"))?;
            commands::verify::run(&path)
        }
        Commands::Dump {
            entity_type,
            format,
        } => {
            let path = cli.path.ok_or(CliError::MissingPath("dump"))?;
            commands::dump::run(&path, &entity_type, format)
        }
        Commands::Version => {
            println!("FlatDB CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("FlatDB Core v{}", flatdb_core::VERSION);
            Ok(())
        }
    }
}
