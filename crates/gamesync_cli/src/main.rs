//! GameSync CLI
//!
//! Command-line tools for inspecting a device's local save store.
//!
//! # Commands
//!
//! - `inspect` - Display the cached snapshot and queue length
//! - `dump-queue` - List pending sync operations

mod commands;

use clap::{Parser, Subcommand};
use gamesync_engine::SyncConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// GameSync local store tools.
#[derive(Parser)]
#[command(name = "gamesync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the local store directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display the cached snapshot and queue length
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List pending sync operations, oldest first
    DumpQueue {
        /// Maximum number of operations to show
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = SyncConfig::default();
    match cli.command {
        Commands::Inspect { format } => {
            let path = cli.path.ok_or("Store path required for inspect")?;
            commands::inspect::run(&path, &config, &format)?;
        }
        Commands::DumpQueue { limit, format } => {
            let path = cli.path.ok_or("Store path required for dump-queue")?;
            commands::dump_queue::run(&path, &config, limit, &format)?;
        }
        Commands::Version => {
            println!("GameSync CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
