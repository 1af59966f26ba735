//! World file loader.
//!
//! A world file carries the parts of the static world that are too large for
//! the built-in tables: the obstacle grid, the harvest areas and the crown
//! spawn candidates. POIs and merchants always come from [`crate::tables`].

use std::path::{Path, PathBuf};

use hunt_core::env::{HarvestArea, HarvestAreas, ObstacleMap};
use hunt_core::{Coord, World};
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};
use crate::tables::{builtin_merchants, builtin_pois};

/// World data structure for RON files.
///
/// ```ron
/// (
///     obstacle_rows: Some("obstacles502.txt"),
///     blocked: [(10, 12), (10, 13)],
///     harvest: [(portion: 59, tiles: [(x: 250, y: 300)]), ...],
///     crown_spawns: [(x: 208, y: 265), ...],
/// )
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldFile {
    /// Text grid with one row of `0` (walkable) and `1` (blocked) per line,
    /// relative to the world file. Without it the map starts fully walkable.
    #[serde(default)]
    pub obstacle_rows: Option<PathBuf>,
    /// Extra blocked tiles applied on top of the grid.
    #[serde(default)]
    pub blocked: Vec<(i32, i32)>,
    pub harvest: Vec<HarvestArea>,
    pub crown_spawns: Vec<Coord>,
}

/// Loader for the static world from RON files.
pub struct WorldLoader;

impl WorldLoader {
    pub fn load(path: &Path) -> LoadResult<World> {
        let content = read_file(path)?;
        let file: WorldFile = ron::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse world RON: {}", e))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::build(file, base)
    }

    /// Builds the world from parsed data; `base` resolves the obstacle file.
    pub fn build(file: WorldFile, base: &Path) -> LoadResult<World> {
        let mut obstacles = match &file.obstacle_rows {
            Some(rows) => {
                let rows_path = base.join(rows);
                let text = read_file(&rows_path)?;
                let lines: Vec<&str> = text.lines().collect();
                ObstacleMap::from_rows(&lines).map_err(|e| {
                    anyhow::anyhow!("Invalid obstacle grid {}: {}", rows_path.display(), e)
                })?
            }
            None => ObstacleMap::open(),
        };
        for &(x, y) in &file.blocked {
            let tile = Coord::new(x, y);
            if !tile.is_inside_map() {
                anyhow::bail!("Blocked tile {} lies outside the map", tile);
            }
            obstacles.set_walkable(tile, false);
        }

        let pois = builtin_pois()?;
        let merchants = builtin_merchants()?;
        let harvest = HarvestAreas::new(file.harvest, file.crown_spawns)
            .map_err(|e| anyhow::anyhow!("Invalid harvest data: {}", e))?;

        tracing::info!(blocked = file.blocked.len(), "world loaded");
        Ok(World::new(obstacles, pois, merchants, harvest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hunt_core::{GameConfig, MapOracle};

    fn sample() -> WorldFile {
        let harvest = (0..GameConfig::NUM_HARVEST_AREAS)
            .map(|i| HarvestArea {
                portion: if i == 0 { 59 } else { 48 },
                tiles: vec![Coord::new(100 + i as i32 * 10, 150)],
            })
            .collect();
        let crown_spawns = (0..GameConfig::NUM_CROWN_LOCATIONS as i32)
            .map(|i| Coord::new(100 + (i % 26) * 10, 300 + (i / 26) * 5))
            .collect();
        WorldFile {
            obstacle_rows: None,
            blocked: vec![(40, 41)],
            harvest,
            crown_spawns,
        }
    }

    #[test]
    fn builds_an_open_world_with_extra_walls() {
        let world = WorldLoader::build(sample(), Path::new(".")).unwrap();
        assert!(!world.is_walkable(Coord::new(40, 41)));
        assert!(world.is_walkable(Coord::new(41, 41)));
        assert_eq!(world.harvest().areas().len(), GameConfig::NUM_HARVEST_AREAS);
    }

    #[test]
    fn harvest_must_add_up() {
        let mut file = sample();
        file.harvest[0].portion = 1;
        let err = WorldLoader::build(file, Path::new(".")).unwrap_err();
        assert!(err.to_string().contains("harvest"));
    }

    #[test]
    fn blocked_tiles_must_be_on_the_map() {
        let mut file = sample();
        file.blocked.push((-1, 3));
        assert!(WorldLoader::build(file, Path::new(".")).is_err());
    }
}
