//! Content factory for loading everything a node needs from one directory.

use std::path::{Path, PathBuf};

use hunt_core::{GameConfig, World};

use crate::loaders::{ConfigLoader, LoadResult, WorldLoader};

/// Content factory that loads all game content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml        (optional)
/// ├── world.ron
/// └── obstacles502.txt   (referenced from world.ron)
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load engine configuration from `config.toml`, or the defaults when the
    /// file does not exist.
    pub fn load_config(&self) -> LoadResult<GameConfig> {
        let path = self.data_dir.join("config.toml");
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(GameConfig::new());
        }
        ConfigLoader::load(&path)
    }

    /// Load the static world from `world.ron`.
    pub fn load_world(&self) -> LoadResult<World> {
        WorldLoader::load(&self.data_dir.join("world.ron"))
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let factory = ContentFactory::new(dir.path());
        assert_eq!(factory.data_dir(), dir.path());
        assert_eq!(factory.load_config().unwrap(), GameConfig::new());
        assert!(factory.load_world().is_err());
    }
}
