//! File-based StateRepository implementation.

use std::fs;
use std::path::{Path, PathBuf};

use hunt_core::{GameState, decode_state, encode_state};

use crate::repository::{RepositoryError, Result, StateRepository};

/// File-based implementation of StateRepository.
///
/// Stores game states as individual files indexed by height.
///
/// # File Format
///
/// States are stored as `state_{height}.bin` in the versioned snapshot
/// layout of [`hunt_core::codec`]: a 4-byte schema version followed by the
/// bincode body. Writes go to a temporary file first and are renamed into
/// place, so a crash never leaves a half-written snapshot behind.
pub struct FileStateRepository {
    base_dir: PathBuf,
}

impl FileStateRepository {
    /// Create a new file-based state repository.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn state_path(&self, height: u64) -> PathBuf {
        self.base_dir.join(format!("state_{}.bin", height))
    }
}

impl StateRepository for FileStateRepository {
    fn save(&self, height: u64, state: &GameState) -> Result<()> {
        let path = self.state_path(height);
        let temp_path = path.with_extension("bin.tmp");

        let bytes = encode_state(state)?;
        fs::write(&temp_path, bytes)?;
        fs::rename(&temp_path, &path)?;

        tracing::debug!("Saved state[{}] to {}", height, path.display());
        Ok(())
    }

    fn load(&self, height: u64) -> Result<Option<GameState>> {
        let path = self.state_path(height);
        if !path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(&path)?;
        let state = decode_state(&bytes)?;
        if u64::try_from(state.height).ok() != Some(height) {
            return Err(RepositoryError::CorruptedData(format!(
                "{} holds height {}",
                path.display(),
                state.height
            )));
        }

        tracing::debug!("Loaded state[{}] from {}", height, path.display());
        Ok(Some(state))
    }

    fn exists(&self, height: u64) -> bool {
        self.state_path(height).exists()
    }

    fn delete(&self, height: u64) -> Result<()> {
        let path = self.state_path(height);
        if path.exists() {
            fs::remove_file(&path)?;
            tracing::debug!("Deleted state[{}]", height);
        }
        Ok(())
    }

    fn list_heights(&self) -> Result<Vec<u64>> {
        let mut heights = Vec::new();
        for entry in fs::read_dir(&self.base_dir)? {
            let path = entry?.path();
            if let Some(filename) = path.file_name().and_then(|s| s.to_str())
                && let Some(height) = filename
                    .strip_prefix("state_")
                    .and_then(|s| s.strip_suffix(".bin"))
                && let Ok(height) = height.parse::<u64>()
            {
                heights.push(height);
            }
        }
        heights.sort_unstable();
        Ok(heights)
    }
}
