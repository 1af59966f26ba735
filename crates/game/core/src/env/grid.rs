use crate::config::GameConfig;
use crate::state::Coord;

const WIDTH: usize = GameConfig::MAP_WIDTH as usize;
const HEIGHT: usize = GameConfig::MAP_HEIGHT as usize;

/// Dense row-major map-sized table.
///
/// Every accessor checks the coordinate against the map bounds, so callers
/// can probe neighbours of border tiles without their own checks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid<T> {
    cells: Vec<T>,
}

impl<T: Clone> Grid<T> {
    pub fn filled(value: T) -> Self {
        Self {
            cells: vec![value; WIDTH * HEIGHT],
        }
    }

    /// Resets every cell without reallocating.
    pub fn fill(&mut self, value: T) {
        self.cells.fill(value);
    }
}

impl<T> Grid<T> {
    pub const LEN: usize = WIDTH * HEIGHT;

    /// Wraps a row-major vector of exactly `MAP_WIDTH * MAP_HEIGHT` cells.
    pub fn from_cells(cells: Vec<T>) -> Option<Self> {
        (cells.len() == Self::LEN).then_some(Self { cells })
    }

    #[inline]
    fn offset(coord: Coord) -> Option<usize> {
        coord
            .is_inside_map()
            .then(|| coord.y as usize * WIDTH + coord.x as usize)
    }

    #[inline]
    pub fn get(&self, coord: Coord) -> Option<&T> {
        Self::offset(coord).map(|i| &self.cells[i])
    }

    #[inline]
    pub fn get_mut(&mut self, coord: Coord) -> Option<&mut T> {
        Self::offset(coord).map(|i| &mut self.cells[i])
    }

    /// Writes a cell; writes outside the map are dropped.
    #[inline]
    pub fn set(&mut self, coord: Coord, value: T) {
        if let Some(cell) = self.get_mut(coord) {
            *cell = value;
        }
    }

    pub fn cells(&self) -> &[T] {
        &self.cells
    }
}

impl<T: Copy + Default> Grid<T> {
    /// Cell value, or the default outside the map.
    #[inline]
    pub fn at(&self, coord: Coord) -> T {
        self.get(coord).copied().unwrap_or_default()
    }
}

/// Per-tile, per-team accumulator (`[T; 4]` in every cell).
pub type TeamGrid<T> = Grid<[T; GameConfig::NUM_TEAM_COLORS]>;

impl<T: Copy + Default> Grid<[T; GameConfig::NUM_TEAM_COLORS]> {
    #[inline]
    pub fn team(&self, coord: Coord, color: usize) -> T {
        self.get(coord)
            .and_then(|cell| cell.get(color).copied())
            .unwrap_or_default()
    }

    #[inline]
    pub fn team_mut(&mut self, coord: Coord, color: usize) -> Option<&mut T> {
        self.get_mut(coord).and_then(|cell| cell.get_mut(color))
    }
}
