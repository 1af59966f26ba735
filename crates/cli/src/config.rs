//! Environment configuration for the replay binary.
use std::env;
use std::path::PathBuf;

/// Directories the binary works with. Command-line flags override these.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CliConfig {
    /// Content directory holding `world.ron` and `config.toml`.
    pub data_dir: PathBuf,
    /// Directory of `block_{height}.json` files.
    pub blocks_dir: PathBuf,
    /// Snapshot directory.
    pub state_dir: PathBuf,
    /// Stats pages are only written when this is set.
    pub stats_dir: Option<PathBuf>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            blocks_dir: PathBuf::from("blocks"),
            state_dir: PathBuf::from("states"),
            stats_dir: None,
        }
    }
}

impl CliConfig {
    /// Construct configuration from environment variables.
    ///
    /// Environment variables:
    /// - `HUNT_DATA_DIR` - Content directory (default: `data`)
    /// - `HUNT_BLOCKS_DIR` - Block files (default: `blocks`)
    /// - `HUNT_STATE_DIR` - Snapshots (default: `states`)
    /// - `HUNT_STATS_DIR` - Stats pages (default: none)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let path = |key: &str| lookup(key).filter(|v| !v.is_empty()).map(PathBuf::from);

        if let Some(dir) = path("HUNT_DATA_DIR") {
            config.data_dir = dir;
        }
        if let Some(dir) = path("HUNT_BLOCKS_DIR") {
            config.blocks_dir = dir;
        }
        if let Some(dir) = path("HUNT_STATE_DIR") {
            config.state_dir = dir;
        }
        config.stats_dir = path("HUNT_STATS_DIR");

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_variables_keep_the_defaults() {
        assert_eq!(CliConfig::from_lookup(|_| None), CliConfig::default());
    }

    #[test]
    fn empty_values_are_ignored() {
        let config = CliConfig::from_lookup(|key| match key {
            "HUNT_STATE_DIR" => Some("/var/hunt".into()),
            "HUNT_STATS_DIR" => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.state_dir, PathBuf::from("/var/hunt"));
        assert_eq!(config.stats_dir, None);
    }
}
