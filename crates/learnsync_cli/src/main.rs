//! learnsync CLI
//!
//! Command-line tools for inspecting and maintaining the persisted sync
//! state of a learnsync client.
//!
//! # Commands
//!
//! - `stats` - Display queue size, success rate, and per-type tallies
//! - `queue` - List pending sync items
//! - `history` - Dump recent sync attempts
//! - `clear` - Drop the queue and/or history snapshots

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// learnsync sync-state maintenance tools.
#[derive(Parser)]
#[command(name = "learnsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the sync data directory
    #[arg(global = true, short, long, default_value = "./learnsync-data")]
    path: PathBuf,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display queue size, success rate, and per-type tallies
    Stats {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List pending sync items
    Queue,

    /// Dump recent sync attempts
    History {
        /// Maximum number of records to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,

        /// Show only failed attempts
        #[arg(long)]
        failures_only: bool,
    },

    /// Drop the queue and/or history snapshots
    Clear {
        /// Clear the pending queue snapshot
        #[arg(long)]
        queue: bool,

        /// Clear the history snapshot
        #[arg(long)]
        history: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = match cli.command {
        Commands::Stats { format } => commands::stats::run(&cli.path, &format).await,
        Commands::Queue => commands::queue::run(&cli.path).await,
        Commands::History {
            limit,
            failures_only,
        } => commands::history::run(&cli.path, limit, failures_only).await,
        Commands::Clear { queue, history } => {
            // With no flags, clear both
            let all = !queue && !history;
            commands::clear::run(&cli.path, queue || all, history || all).await
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
