//! schema-graph CLI - entry point for the schema graph construction engine
//!
//! # Usage
//!
//! ```bash
//! # Build a graph artifact from a SQLite database
//! schema-graph build --db bank.sqlite --output bank.json
//!
//! # Re-check an already-serialized artifact
//! schema-graph validate --artifact bank.json
//!
//! # Run the pipeline over every database in a directory
//! schema-graph batch --dir databases/ --output-dir artifacts/
//! ```

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod commands;
mod progress;

/// schema-graph - SQLite schema graph construction engine
#[derive(Parser, Debug)]
#[command(name = "schema-graph")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOptions,
}

/// Global options available to all commands.
#[derive(Args, Debug, Clone)]
struct GlobalOptions {
    /// Enable verbose (debug-level) output.
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Suppress non-essential output.
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Path to a TOML configuration file, overriding global/local discovery.
    #[arg(long, short = 'c', global = true, env = "SCHEMA_GRAPH_CONFIG")]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a schema graph artifact from a single SQLite database.
    Build(commands::build::BuildArgs),

    /// Re-check invariants against an already-serialized artifact.
    Validate(commands::validate::ValidateArgs),

    /// Run the pipeline over every database in a directory.
    Batch(commands::batch::BatchArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.global.quiet {
        Level::ERROR
    } else if cli.global.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Build(args) => commands::build::execute(args, &cli.global),
        Commands::Validate(args) => commands::validate::execute(args, &cli.global),
        Commands::Batch(args) => commands::batch::execute(args, &cli.global),
    }
}
