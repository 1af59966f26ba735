//! Breadth-first walking distances over 8-connected walkable tiles.
//!
//! `-1` marks an unreachable tile in every field.

use std::collections::VecDeque;

use super::{Grid, MapOracle, PoiTable};
use crate::config::GameConfig;
use crate::state::Coord;

const NEIGHBOURS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Walking distance from every POI anchor to every tile.
#[derive(Clone, Debug)]
pub struct PoiDistances {
    fields: Vec<Grid<i16>>,
}

impl PoiDistances {
    pub fn compute(map: &impl MapOracle, pois: &PoiTable) -> Self {
        let fields = pois.iter().map(|poi| Self::field(map, poi.anchor)).collect();
        Self { fields }
    }

    /// The anchor itself is distance 0 even when it is not walkable.
    fn field(map: &impl MapOracle, anchor: Coord) -> Grid<i16> {
        let mut field = Grid::filled(-1i16);
        let mut queue = VecDeque::new();
        field.set(anchor, 0);
        queue.push_back(anchor);

        while let Some(c) = queue.pop_front() {
            let d = field.at(c);
            for (dx, dy) in NEIGHBOURS {
                let n = c.offset(dx, dy);
                if field.get(n) != Some(&-1) || !map.is_walkable(n) {
                    continue;
                }
                field.set(n, d + 1);
                queue.push_back(n);
            }
        }
        field
    }

    /// Distance from POI `poi` to `coord`.
    #[inline]
    pub fn get(&self, poi: usize, coord: Coord) -> i32 {
        self.fields
            .get(poi)
            .and_then(|f| f.get(coord))
            .map_or(-1, |d| i32::from(*d))
    }
}

const NAV: usize = GameConfig::NAV_SIZE;
const CENTER: i32 = GameConfig::NAV_CENTER;

/// Distances from one tile to every tile of the 21x21 window around it.
///
/// The search never leaves the window. Cell `(i, j)` is the map tile
/// `centre + (i - 10, j - 10)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocalField {
    cells: [[i16; NAV]; NAV],
}

impl LocalField {
    pub fn compute(map: &impl MapOracle, centre: Coord) -> Self {
        let mut cells = [[-1i16; NAV]; NAV];
        if !map.is_walkable(centre) {
            return Self { cells };
        }

        let mut queue = VecDeque::with_capacity(NAV * NAV);
        cells[CENTER as usize][CENTER as usize] = 0;
        queue.push_back((CENTER, CENTER));
        while let Some((i, j)) = queue.pop_front() {
            let d = cells[j as usize][i as usize];
            for (du, dv) in NEIGHBOURS {
                let (u, v) = (i + du, j + dv);
                if !(0..NAV as i32).contains(&u) || !(0..NAV as i32).contains(&v) {
                    continue;
                }
                if cells[v as usize][u as usize] > -1 {
                    continue;
                }
                if !map.is_walkable(centre.offset(u - CENTER, v - CENTER)) {
                    continue;
                }
                cells[v as usize][u as usize] = d + 1;
                queue.push_back((u, v));
            }
        }
        Self { cells }
    }

    /// Distance to the window cell `(i, j)`; -1 outside the window.
    #[inline]
    pub fn at(&self, i: i32, j: i32) -> i32 {
        if (0..NAV as i32).contains(&i) && (0..NAV as i32).contains(&j) {
            i32::from(self.cells[j as usize][i as usize])
        } else {
            -1
        }
    }

    /// Distance from the centre to a tile given by its offset.
    #[inline]
    pub fn offset(&self, dx: i32, dy: i32) -> i32 {
        self.at(dx + CENTER, dy + CENTER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Column {
        wall_x: i32,
        gap_y: i32,
    }

    impl MapOracle for Column {
        fn is_walkable(&self, c: Coord) -> bool {
            c.is_inside_map() && (c.x != self.wall_x || c.y == self.gap_y)
        }
    }

    #[test]
    fn local_field_walks_around_walls() {
        let map = Column { wall_x: 11, gap_y: 15 };
        let field = LocalField::compute(&map, Coord::new(10, 10));
        assert_eq!(field.offset(0, 0), 0);
        assert_eq!(field.offset(-3, 2), 3);
        // down to the gap at (11, 15), then back up on the far side
        assert_eq!(field.offset(2, 0), 10);
        assert_eq!(field.offset(1, 0), -1);
    }

    #[test]
    fn local_field_of_a_blocked_tile_is_empty() {
        let map = Column { wall_x: 11, gap_y: 15 };
        let field = LocalField::compute(&map, Coord::new(11, 3));
        assert_eq!(field.offset(0, 0), -1);
        assert_eq!(field.offset(-1, 0), -1);
    }

    #[test]
    fn local_field_clips_at_the_map_border() {
        let map = Column { wall_x: -5, gap_y: 0 };
        let field = LocalField::compute(&map, Coord::new(0, 0));
        assert_eq!(field.offset(-1, 0), -1);
        assert_eq!(field.offset(10, 10), 10);
    }
}
