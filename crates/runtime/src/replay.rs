//! The replay driver: applies blocks to the head of a state chain.

use std::fs;
use std::path::{Path, PathBuf};

use hunt_core::{GameEngine, GameState, StepResult};

use crate::digest::state_digest;
use crate::error::{Result, RuntimeError};
use crate::input::BlockInput;
use crate::repository::StateRepository;
use crate::stats::write_stats;

/// Owns the chain head and persists every state it produces.
pub struct Replayer<'w, R> {
    engine: GameEngine<'w>,
    repo: R,
    head: GameState,
    stats_dir: Option<PathBuf>,
}

impl<'w, R: StateRepository> Replayer<'w, R> {
    /// Resumes from the highest stored state, or from before genesis.
    pub fn open(engine: GameEngine<'w>, repo: R) -> Result<Self> {
        let head = repo.latest()?.unwrap_or_default();
        tracing::info!(height = head.height, "replay head");
        Ok(Self {
            engine,
            repo,
            head,
            stats_dir: None,
        })
    }

    /// Writes the stats pages of every applied block into `dir`.
    pub fn with_stats_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.stats_dir = Some(dir.into());
        self
    }

    pub fn head(&self) -> &GameState {
        &self.head
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Steps the head with `block` and stores the new state.
    ///
    /// A rejected batch leaves the head and the repository untouched.
    pub fn apply(&mut self, block: &BlockInput) -> Result<StepResult> {
        let data = block.to_step_data()?;

        let (state, result) = match &self.stats_dir {
            Some(dir) => {
                let outcome = self.engine.step_with_summary(&self.head, &data)?;
                write_stats(dir, &outcome.stats);
                (outcome.state, outcome.result)
            }
            None => self.engine.step(&self.head, &data)?,
        };

        let height = u64::try_from(state.height)
            .map_err(|_| RuntimeError::Input(format!("stepped to height {}", state.height)))?;
        self.repo.save(height, &state)?;
        tracing::info!(
            height,
            players = state.players.len(),
            killed = result.killed_players().len(),
            digest = %state_digest(&state)?,
            "block applied"
        );
        self.head = state;
        Ok(result)
    }

    /// Applies `block_{height}.json` files from `dir` that lie above the
    /// head, in height order. Returns the number of blocks applied.
    pub fn replay_dir(&mut self, dir: &Path) -> Result<usize> {
        let mut blocks = Vec::new();
        let entries = fs::read_dir(dir)
            .map_err(|e| RuntimeError::Input(format!("{}: {}", dir.display(), e)))?;
        for entry in entries {
            let path = entry
                .map_err(|e| RuntimeError::Input(format!("{}: {}", dir.display(), e)))?
                .path();
            if let Some(height) = block_height(&path) {
                blocks.push((height, path));
            }
        }
        blocks.sort();

        let mut applied = 0;
        for (height, path) in blocks {
            if height <= i64::from(self.head.height) {
                continue;
            }
            let expected = i64::from(self.head.height) + 1;
            if height != expected {
                return Err(RuntimeError::Input(format!(
                    "missing block {expected} before {}",
                    path.display()
                )));
            }
            self.apply(&BlockInput::from_file(&path)?)?;
            applied += 1;
        }
        Ok(applied)
    }
}

fn block_height(path: &Path) -> Option<i64> {
    path.file_name()?
        .to_str()?
        .strip_prefix("block_")?
        .strip_suffix(".json")?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::MoveInput;
    use crate::repository::InMemoryStateRepository;
    use hunt_core::GameConfig;
    use hunt_core::testing::open_world;

    fn block(hash_byte: u8, moves: Vec<(&str, &str)>) -> BlockInput {
        BlockInput {
            hash: hex::encode([hash_byte; 32]),
            treasure: 0,
            moves: moves
                .into_iter()
                .map(|(player, json)| MoveInput {
                    player: player.into(),
                    json: json.into(),
                    coins: GameConfig::COIN,
                })
                .collect(),
        }
    }

    fn replayer() -> Replayer<'static, InMemoryStateRepository> {
        let engine = GameEngine::new(open_world(), GameConfig::new());
        Replayer::open(engine, InMemoryStateRepository::new()).unwrap()
    }

    #[test]
    fn applied_blocks_are_stored_by_height() {
        let mut r = replayer();
        r.apply(&block(1, vec![("ann", r#"{"color": 0}"#)])).unwrap();
        r.apply(&block(2, Vec::new())).unwrap();
        assert_eq!(r.head().height, 1);
        assert_eq!(r.repository().list_heights().unwrap(), vec![0, 1]);
    }

    #[test]
    fn rejected_block_keeps_the_head() {
        let mut r = replayer();
        r.apply(&block(1, vec![("ann", r#"{"color": 0}"#)])).unwrap();
        let head = r.head().clone();

        let err = r.apply(&block(2, vec![("ann", r#"{"color": 1}"#)])).unwrap_err();
        assert!(matches!(err, RuntimeError::Step(_)));
        assert_eq!(r.head(), &head);
        assert_eq!(r.repository().list_heights().unwrap(), vec![0]);
    }

    #[test]
    fn block_names_carry_the_height() {
        assert_eq!(block_height(Path::new("/x/block_12.json")), Some(12));
        assert_eq!(block_height(Path::new("block_x.json")), None);
        assert_eq!(block_height(Path::new("state_1.bin")), None);
    }
}
