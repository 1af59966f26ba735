//! Print a stored snapshot.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use hunt_core::{GameState, format_money, state_view};
use hunt_runtime::{FileStateRepository, StateRepository};

use crate::config::CliConfig;

/// Read and inspect a stored state
#[derive(Parser)]
pub struct ShowState {
    /// Height of the state to read; the latest when omitted
    #[arg(value_name = "HEIGHT")]
    height: Option<u64>,

    /// Snapshot directory
    #[arg(long, value_name = "DIR")]
    states: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary")]
    format: OutputFormat,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    /// Counts and totals
    Summary,
    /// The JSON state view
    Json,
}

impl ShowState {
    pub fn execute(self, config: CliConfig) -> Result<()> {
        let states = self.states.unwrap_or(config.state_dir);
        let repo = FileStateRepository::new(&states)?;
        let state = match self.height {
            Some(h) => repo.load(h)?,
            None => repo.latest()?,
        }
        .with_context(|| format!("No matching state in {}", states.display()))?;

        match self.format {
            OutputFormat::Summary => print_summary(&state),
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&state_view(&state))?);
            }
        }
        Ok(())
    }
}

fn print_summary(state: &GameState) {
    let characters: usize = state.players.values().map(|p| p.characters.len()).sum();
    println!("Height:      {}", state.height);
    println!("Block hash:  {}", state.hash_block);
    println!("Players:     {}", state.players.len());
    println!("Characters:  {}", characters);
    println!("Loot piles:  {}", state.loot.len());
    println!("Hearts:      {}", state.hearts.len());
    println!("Coins:       {}", format_money(state.coins_on_map()));
    println!("Game fund:   {}", format_money(state.game_fund));
    if !state.crown_holder.player.is_empty() {
        println!(
            "Crown:       {}.{}",
            state.crown_holder.player, state.crown_holder.index
        );
    }
}
