//! Ober CLI - Headless driver for the player core
//!
//! Features:
//! - Track normalization of engine dumps
//! - Scenario replay against the in-memory engine and media element
//! - Event channel listing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod output;
mod scenario;

/// Ober CLI - Player core toolkit
#[derive(Parser)]
#[command(name = "ober-cli")]
#[command(author = "Purple Squirrel Media")]
#[command(version)]
#[command(about = "Replay and inspect the ober player core", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json, table)
    #[arg(short, long, default_value = "table")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a track snapshot (JSON) into settings menu lists
    Tracks {
        /// Path to the snapshot JSON
        snapshot: PathBuf,

        /// Interface language for labels (en, fr, de)
        #[arg(short, long, default_value = "en")]
        lang: String,
    },

    /// Replay a scenario (JSON) and print the phase after every step
    Simulate {
        /// Path to the scenario JSON
        scenario: PathBuf,

        /// Also print every event published on the bus
        #[arg(short, long)]
        events: bool,
    },

    /// List the public event channels
    Events,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_writer(std::io::stderr)
        .init();
    ober_core::init();

    match cli.command {
        Commands::Tracks { snapshot, lang } => {
            commands::tracks(&snapshot, &lang, &cli.format)?;
        }
        Commands::Simulate { scenario, events } => {
            commands::simulate(&scenario, events, &cli.format).await?;
        }
        Commands::Events => {
            commands::events(&cli.format)?;
        }
    }

    Ok(())
}
