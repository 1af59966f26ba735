//! Synthetic world fixtures shared by unit and integration tests.
//!
//! The fixture world has no obstacles. Points of interest, merchant homes,
//! harvest areas and crown spawns sit on fixed, distinct tiles, so tests can
//! refer to them by index instead of hard-coding coordinates.

use std::sync::OnceLock;

use crate::config::GameConfig;
use crate::env::{
    HarvestArea, HarvestAreas, MerchantBase, MerchantTable, ObstacleMap, Poi, PoiKind, PoiTable,
    World,
};
use crate::state::{CharacterState, Coord};

const W: i32 = GameConfig::MAP_WIDTH;
const H: i32 = GameConfig::MAP_HEIGHT;

/// Tile `(dx, dy)` steps away from the corner of `color`'s base, towards the
/// middle of the map.
pub const fn inward(color: usize, dx: i32, dy: i32) -> Coord {
    match color {
        0 => Coord::new(dx, dy),
        1 => Coord::new(W - 1 - dx, dy),
        2 => Coord::new(W - 1 - dx, H - 1 - dy),
        _ => Coord::new(dx, H - 1 - dy),
    }
}

/// First inner-ring and first outer-ring harvest POI of the fixture.
pub const FIRST_HARVEST1: usize = 9;
pub const FIRST_HARVEST2: usize = 50;

fn harvest_anchor(k: usize) -> Coord {
    let idx = (k - *PoiTable::NORMAL.start()) as i32;
    Coord::new(60 + (idx % 10) * 40, 60 + (idx / 10) * 40)
}

fn fixture_pois() -> Vec<Poi> {
    let mut pois = Vec::with_capacity(GameConfig::NUM_POI);
    for color in 0..GameConfig::NUM_TEAM_COLORS {
        let lane = 240 + color as i32 * 6;
        // spawn corner to the centre
        pois.push(Poi {
            anchor: inward(color, 20, 20),
            exit: Coord::new(lane, 250),
            kind: PoiKind(1 + color as u8),
        });
        // centre back into the base
        pois.push(Poi {
            anchor: Coord::new(lane, 245),
            exit: inward(color, 30, 10),
            kind: PoiKind(5 + color as u8),
        });
    }
    pois.push(Poi {
        anchor: Coord::new(250, 250),
        exit: Coord::new(250, 250),
        kind: PoiKind::CENTER,
    });
    for k in PoiTable::NORMAL {
        let anchor = harvest_anchor(k);
        let kind = if k < FIRST_HARVEST2 {
            PoiKind::HARVEST1
        } else {
            PoiKind::HARVEST2
        };
        pois.push(Poi {
            anchor,
            exit: anchor,
            kind,
        });
    }
    for color in 0..GameConfig::NUM_TEAM_COLORS {
        let anchor = inward(color, 12, 12);
        pois.push(Poi {
            anchor,
            exit: anchor,
            kind: PoiKind::BASE,
        });
    }
    pois
}

/// Merchant homes line one row of the town centre.
fn fixture_merchants() -> Vec<MerchantBase> {
    (0..GameConfig::NUM_MERCHANTS)
        .map(|i| MerchantBase {
            base: if i == 0 {
                Coord::ORIGIN
            } else {
                Coord::new(226 + i as i32, 230)
            },
            color: (i % GameConfig::NUM_TEAM_COLORS) as u8,
            chronon: 0,
        })
        .collect()
}

fn fixture_harvest() -> (Vec<HarvestArea>, Vec<Coord>) {
    let areas = (0..GameConfig::NUM_HARVEST_AREAS)
        .map(|i| HarvestArea {
            // 59 + 17 * 48 = 875
            portion: if i == 0 { 59 } else { 48 },
            tiles: vec![Coord::new(100 + i as i32 * 10, 150)],
        })
        .collect();
    let crowns = (0..GameConfig::NUM_CROWN_LOCATIONS as i32)
        .map(|i| Coord::new(100 + (i % 26) * 10, 300 + (i / 26) * 5))
        .collect();
    (areas, crowns)
}

/// Builds a fresh copy of the fixture world.
pub fn fixture_world() -> World {
    let pois = PoiTable::new(fixture_pois()).expect("fixture POIs lie on the map");
    let merchants =
        MerchantTable::new(fixture_merchants()).expect("fixture merchants lie on the map");
    let (areas, crowns) = fixture_harvest();
    let harvest = HarvestAreas::new(areas, crowns).expect("fixture harvest adds up");
    World::new(ObstacleMap::open(), pois, merchants, harvest)
}

/// Shared fixture world, built once per test binary.
pub fn open_world() -> &'static World {
    static WORLD: OnceLock<World> = OnceLock::new();
    WORLD.get_or_init(fixture_world)
}

/// A plain hunter standing still on `coord`.
pub fn character_at(coord: Coord) -> CharacterState {
    CharacterState {
        coord,
        from: coord,
        ..CharacterState::default()
    }
}
