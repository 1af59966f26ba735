//! Repository contract for the chain of game states.

use hunt_core::GameState;

use crate::repository::Result;

/// Stores one game state per block height.
///
/// Heights are those of the stepped states, so the state before genesis is
/// never stored.
pub trait StateRepository: Send + Sync {
    fn save(&self, height: u64, state: &GameState) -> Result<()>;

    fn load(&self, height: u64) -> Result<Option<GameState>>;

    fn exists(&self, height: u64) -> bool;

    fn delete(&self, height: u64) -> Result<()>;

    /// All stored heights in ascending order.
    fn list_heights(&self) -> Result<Vec<u64>>;

    /// The highest stored state, if any.
    fn latest(&self) -> Result<Option<GameState>> {
        match self.list_heights()?.last() {
            Some(&height) => self.load(height),
            None => Ok(None),
        }
    }

    /// Delete all states in a range `[start, end]`, returning how many existed.
    fn delete_range(&self, start: u64, end: u64) -> Result<usize> {
        let mut deleted = 0;
        for height in start..=end {
            if self.exists(height) {
                self.delete(height)?;
                deleted += 1;
            }
        }
        Ok(deleted)
    }
}
