use super::{Grid, WorldError};
use crate::config::GameConfig;
use crate::state::Coord;

const W: i32 = GameConfig::MAP_WIDTH;
const H: i32 = GameConfig::MAP_HEIGHT;

/// Static map oracle answering walkability queries.
pub trait MapOracle {
    /// `false` for obstacles and for anything outside the map.
    fn is_walkable(&self, coord: Coord) -> bool;
}

impl<M: MapOracle + ?Sized> MapOracle for &M {
    fn is_walkable(&self, coord: Coord) -> bool {
        (**self).is_walkable(coord)
    }
}

/// Walkability grid of the full map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObstacleMap {
    walkable: Grid<bool>,
}

impl ObstacleMap {
    /// A map without obstacles.
    pub fn open() -> Self {
        Self {
            walkable: Grid::filled(true),
        }
    }

    /// Parses one string per row, `'0'` walkable and `'1'` blocked.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self, WorldError> {
        if rows.len() != H as usize {
            return Err(WorldError::ObstacleRows {
                expected: H as usize,
                found: rows.len(),
            });
        }
        let mut cells = Vec::with_capacity(Grid::<bool>::LEN);
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != W as usize {
                return Err(WorldError::ObstacleRowWidth {
                    row: y,
                    expected: W as usize,
                    found: row.len(),
                });
            }
            for (x, b) in row.bytes().enumerate() {
                cells.push(match b {
                    b'0' => true,
                    b'1' => false,
                    other => {
                        return Err(WorldError::ObstacleSymbol {
                            coord: Coord::new(x as i32, y as i32),
                            symbol: char::from(other),
                        });
                    }
                });
            }
        }
        Grid::from_cells(cells)
            .map(|walkable| Self { walkable })
            .ok_or(WorldError::ObstacleRows {
                expected: H as usize,
                found: rows.len(),
            })
    }

    pub fn set_walkable(&mut self, coord: Coord, walkable: bool) {
        self.walkable.set(coord, walkable);
    }

    /// Row strings in the same format `from_rows` reads.
    pub fn to_rows(&self) -> Vec<String> {
        self.walkable
            .cells()
            .chunks(W as usize)
            .map(|row| row.iter().map(|w| if *w { '0' } else { '1' }).collect())
            .collect()
    }
}

impl MapOracle for ObstacleMap {
    #[inline]
    fn is_walkable(&self, coord: Coord) -> bool {
        self.walkable.at(coord)
    }
}

#[inline]
const fn corner_sums(c: Coord) -> [i32; 4] {
    [c.x + c.y, (W - c.x) + c.y, (W - c.x) + (H - c.y), c.x + (H - c.y)]
}

/// Team bases in the corners plus the walled town centre (without the coin
/// lawn in front of the south gate).
pub const fn is_safezone(c: Coord) -> bool {
    let [a, b, g, d] = corner_sums(c);
    if a <= 43 || d <= 43 || g <= 43 || b <= 43 {
        return true;
    }
    if c.x >= 238 && c.x <= 263 && c.y >= 259 && c.y <= 261 {
        return false;
    }
    if a < 460 || d < 460 || g < 460 || b < 460 {
        return false;
    }
    c.x >= 225 && c.x <= 276 && c.y >= 224 && c.y <= 275
}

/// The safe zone shrunk by one tile; a tile adjacent to an unsafe one fails.
pub const fn is_deep_safezone(c: Coord) -> bool {
    let [a, b, g, d] = corner_sums(c);
    if a < 42 || d < 42 || g < 42 || b < 42 {
        return true;
    }
    if c.x >= 237 && c.x <= 264 && c.y >= 258 && c.y <= 262 {
        return false;
    }
    if a <= 461 || d <= 461 || g <= 461 || b <= 461 {
        return false;
    }
    c.x > 225 && c.x < 276 && c.y > 224 && c.y < 275
}

/// Outer two rows of the base of team `color`.
pub const fn is_base_perimeter(color: u8, c: Coord) -> bool {
    let sums = corner_sums(c);
    let s = match color {
        0 => sums[0],
        1 => sums[1],
        2 => sums[2],
        3 => sums[3],
        _ => return false,
    };
    s >= 42 && s <= 43
}

pub const fn is_near_center(c: Coord) -> bool {
    c.x > 100 && c.x < 400 && c.y > 100 && c.y < 400
}
