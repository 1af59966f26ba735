//! Replay a directory of block files into the snapshot directory.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use hunt_content::ContentFactory;
use hunt_core::GameEngine;
use hunt_runtime::{FileStateRepository, Replayer};

use crate::config::CliConfig;

/// Replay block files on top of the stored chain head
#[derive(Parser)]
pub struct Replay {
    /// Content directory (world.ron, config.toml)
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Directory of block_{height}.json files
    #[arg(long, value_name = "DIR")]
    blocks: Option<PathBuf>,

    /// Snapshot directory
    #[arg(long, value_name = "DIR")]
    states: Option<PathBuf>,

    /// Write stats_*.html pages into this directory
    #[arg(long, value_name = "DIR")]
    stats: Option<PathBuf>,
}

impl Replay {
    pub fn execute(self, config: CliConfig) -> Result<()> {
        let data_dir = self.data_dir.unwrap_or(config.data_dir);
        let blocks = self.blocks.unwrap_or(config.blocks_dir);
        let states = self.states.unwrap_or(config.state_dir);
        let stats = self.stats.or(config.stats_dir);

        let factory = ContentFactory::new(&data_dir);
        let game_config = factory.load_config()?;
        let world = factory
            .load_world()
            .with_context(|| format!("Failed to load world from {}", data_dir.display()))?;
        tracing::info!(network = %game_config.network, "content loaded");

        let engine = GameEngine::new(&world, game_config);
        let repo = FileStateRepository::new(&states)?;
        let mut replayer = Replayer::open(engine, repo)?;
        if let Some(dir) = stats {
            replayer = replayer.with_stats_dir(dir);
        }

        let applied = replayer
            .replay_dir(&blocks)
            .with_context(|| format!("Replay of {} stopped", blocks.display()))?;
        tracing::info!(applied, height = replayer.head().height, "replay finished");
        println!("{} blocks applied, head at height {}", applied, replayer.head().height);
        Ok(())
    }
}
