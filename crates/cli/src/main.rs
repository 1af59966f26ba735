//! Replay binary for the hunter arena.
//!
//! ```bash
//! HUNT_DATA_DIR=data hunt replay --blocks blocks --states states
//! hunt show-state 120 --format json
//! ```
mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Replay, ShowState};
use config::CliConfig;

/// Deterministic replay of hunter arena blocks
#[derive(Parser)]
#[command(name = "hunt")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Apply block files to the stored chain
    Replay(Replay),

    /// Print a stored state
    ShowState(ShowState),
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = CliConfig::from_env();
    let cli = Cli::parse();

    match cli.command {
        Command::Replay(cmd) => cmd.execute(config),
        Command::ShowState(cmd) => cmd.execute(config),
    }
}
