//! Read-only world data.
//!
//! The static tables (obstacles, points of interest, merchant homes, harvest
//! areas) come from external map tooling. [`World`] validates them once and
//! derives the distance fields and tile maps every step relies on.
mod distance;
mod error;
mod grid;
mod harvest;
mod map;
mod merchants;
mod poi;
mod rng;

pub use distance::{LocalField, PoiDistances};
pub use error::WorldError;
pub use grid::{Grid, TeamGrid};
pub use harvest::{HarvestArea, HarvestAreas};
pub use map::{
    MapOracle, ObstacleMap, is_base_perimeter, is_deep_safezone, is_near_center, is_safezone,
};
pub use merchants::{BaseMapCode, MerchantBase, MerchantTable};
pub use poi::{Poi, PoiKind, PoiTable};
pub use rng::StepRng;

use crate::state::{Coord, Role};

/// Monster territory a tile belongs to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PitZone {
    #[default]
    Outside,
    /// One tile wide ring around a pit.
    Perimeter,
    /// Inside the pit of the given monster role.
    Pit(Role),
}

impl PitZone {
    pub const fn is_pit(self) -> bool {
        matches!(self, PitZone::Pit(_))
    }
}

/// Validated static world plus everything derived from it.
#[derive(Clone, Debug)]
pub struct World {
    obstacles: ObstacleMap,
    pois: PoiTable,
    merchants: MerchantTable,
    harvest: HarvestAreas,
    poi_distances: PoiDistances,
    base_map: Grid<BaseMapCode>,
    pits: Grid<PitZone>,
}

impl World {
    /// Builds the derived tables. This runs one breadth-first search per POI
    /// over the full map.
    pub fn new(
        obstacles: ObstacleMap,
        pois: PoiTable,
        merchants: MerchantTable,
        harvest: HarvestAreas,
    ) -> Self {
        let poi_distances = PoiDistances::compute(&obstacles, &pois);
        let base_map = Self::merchant_base_map(&pois, &merchants);
        let pits = Self::monster_pits(&poi_distances);
        tracing::debug!(
            pois = pois.len(),
            crown_spawns = harvest.crown_spawns().len(),
            "static world prepared"
        );
        Self {
            obstacles,
            pois,
            merchants,
            harvest,
            poi_distances,
            base_map,
            pits,
        }
    }

    fn merchant_base_map(pois: &PoiTable, merchants: &MerchantTable) -> Grid<BaseMapCode> {
        let mut map = Grid::filled(BaseMapCode::NONE);
        for (role, m) in merchants.iter() {
            if m.base.x > 0 && m.base.y > 0 {
                let code = if role >= Role::NORMAL_MERCHANT_FIRST {
                    BaseMapCode::MERCH_NORMAL
                } else {
                    BaseMapCode::MERCH_TELEPORT
                };
                map.set(m.base, code);
            }
        }

        for (index, poi) in pois.iter().enumerate() {
            let (anchor, exit) = if PoiTable::TELEPORTS.contains(&index) {
                (BaseMapCode::TELEPORT, BaseMapCode::TP_EXIT_ACTIVE)
            } else if PoiTable::MONSTER_HOMES.contains(&index) || index == PoiTable::CENTER {
                (BaseMapCode::TP_EXIT_ACTIVE, BaseMapCode::NONE)
            } else {
                (BaseMapCode::TP_EXIT_INACTIVE, BaseMapCode::NONE)
            };
            map.set(poi.anchor, anchor);
            map.set(poi.exit, exit);
        }
        map
    }

    fn monster_pits(distances: &PoiDistances) -> Grid<PitZone> {
        let mut pits = Grid::filled(PitZone::Outside);
        for y in 0..crate::config::GameConfig::MAP_HEIGHT {
            for x in 0..crate::config::GameConfig::MAP_WIDTH {
                let c = Coord::new(x, y);
                let mut zone = PitZone::Outside;
                for home in PoiTable::MONSTER_HOMES {
                    let d = distances.get(home, c);
                    if d == 15 {
                        zone = PitZone::Perimeter;
                    } else if (0..=14).contains(&d) {
                        zone = PitZone::Pit(Role::REAPER);
                        break;
                    }
                }
                for crescent in PoiTable::CRESCENTS {
                    let big = PoiTable::is_big_crescent(crescent);
                    let size = if big { 14 } else { 12 };
                    let d = distances.get(crescent, c);
                    if d == size + 1 {
                        zone = PitZone::Perimeter;
                    } else if (0..=size).contains(&d) {
                        zone = PitZone::Pit(if big { Role::REDHEAD } else { Role::SPITTER });
                        break;
                    }
                }
                if zone != PitZone::Outside {
                    pits.set(c, zone);
                }
            }
        }
        pits
    }

    pub fn pois(&self) -> &PoiTable {
        &self.pois
    }

    pub fn merchants(&self) -> &MerchantTable {
        &self.merchants
    }

    pub fn harvest(&self) -> &HarvestAreas {
        &self.harvest
    }

    pub fn obstacles(&self) -> &ObstacleMap {
        &self.obstacles
    }

    /// Walking distance from POI `poi` to `coord`, -1 if unreachable.
    #[inline]
    pub fn poi_distance(&self, poi: usize, coord: Coord) -> i32 {
        self.poi_distances.get(poi, coord)
    }

    #[inline]
    pub fn base_map(&self, coord: Coord) -> BaseMapCode {
        self.base_map.at(coord)
    }

    #[inline]
    pub fn pit_zone(&self, coord: Coord) -> PitZone {
        self.pits.at(coord)
    }

    /// Local distance window around `centre`.
    pub fn local_field(&self, centre: Coord) -> LocalField {
        LocalField::compute(&self.obstacles, centre)
    }
}

impl MapOracle for World {
    #[inline]
    fn is_walkable(&self, coord: Coord) -> bool {
        self.obstacles.is_walkable(coord)
    }
}
