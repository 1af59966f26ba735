//! In-memory StateRepository implementation for tests and dry runs.

use std::collections::BTreeMap;
use std::sync::RwLock;

use hunt_core::GameState;

use crate::repository::{RepositoryError, Result, StateRepository};

/// In-memory implementation of StateRepository.
#[derive(Default)]
pub struct InMemoryStateRepository {
    states: RwLock<BTreeMap<u64, GameState>>,
}

impl InMemoryStateRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateRepository for InMemoryStateRepository {
    fn save(&self, height: u64, state: &GameState) -> Result<()> {
        let mut states = self
            .states
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        states.insert(height, state.clone());
        Ok(())
    }

    fn load(&self, height: u64) -> Result<Option<GameState>> {
        let states = self
            .states
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(states.get(&height).cloned())
    }

    fn exists(&self, height: u64) -> bool {
        self.states
            .read()
            .map(|states| states.contains_key(&height))
            .unwrap_or(false)
    }

    fn delete(&self, height: u64) -> Result<()> {
        let mut states = self
            .states
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        states.remove(&height);
        Ok(())
    }

    fn list_heights(&self) -> Result<Vec<u64>> {
        let states = self
            .states
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(states.keys().copied().collect())
    }
}
