use std::ops::RangeInclusive;

use super::WorldError;
use crate::config::GameConfig;
use crate::state::Coord;

/// Point-of-interest type code.
///
/// `1..=4` teleport to the centre and `5..=8` teleport to the base of the
/// colour `(code - 1) % 4`; the code equals the teleport merchant's role.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct PoiKind(pub u8);

impl PoiKind {
    pub const CENTER: Self = Self(13);
    /// Inner harvest ring.
    pub const HARVEST1: Self = Self(14);
    /// Outer harvest ring.
    pub const HARVEST2: Self = Self(15);
    pub const BASE: Self = Self(16);

    pub const fn is_teleport(self) -> bool {
        self.0 >= 1 && self.0 <= 8
    }

    pub const fn is_harvest(self) -> bool {
        self.0 == Self::HARVEST1.0 || self.0 == Self::HARVEST2.0
    }
}

/// One navigation target. Only teleporters have a meaningful exit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Poi {
    pub anchor: Coord,
    pub exit: Coord,
    pub kind: PoiKind,
}

/// The fixed list of 98 points of interest.
///
/// Index ranges carry meaning on their own: teleporters come first, then the
/// centre, then every harvest or base POI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoiTable {
    entries: Vec<Poi>,
}

impl PoiTable {
    pub const TELEPORTS: RangeInclusive<usize> = 0..=7;
    pub const CENTER: usize = 8;
    pub const NORMAL: RangeInclusive<usize> = 9..=93;
    /// Monster crescents in the inner ring; every third one hosts redheads.
    pub const CRESCENTS: RangeInclusive<usize> = 26..=37;
    /// Reaper pits in the outer ring.
    pub const MONSTER_HOMES: RangeInclusive<usize> = 82..=93;
    /// Team bases, indexed `BASE_FIRST + colour`.
    pub const BASE_FIRST: usize = 94;

    /// Builds the table from parallel arrays.
    pub fn from_arrays(
        xa: &[i32],
        ya: &[i32],
        xb: &[i32],
        yb: &[i32],
        kinds: &[u8],
    ) -> Result<Self, WorldError> {
        let n = GameConfig::NUM_POI;
        for len in [xa.len(), ya.len(), xb.len(), yb.len(), kinds.len()] {
            if len != n {
                return Err(WorldError::TableLength {
                    table: "poi",
                    expected: n,
                    found: len,
                });
            }
        }
        let entries = (0..n)
            .map(|i| Poi {
                anchor: Coord::new(xa[i], ya[i]),
                exit: Coord::new(xb[i], yb[i]),
                kind: PoiKind(kinds[i]),
            })
            .collect();
        Self::new(entries)
    }

    pub fn new(entries: Vec<Poi>) -> Result<Self, WorldError> {
        if entries.len() != GameConfig::NUM_POI {
            return Err(WorldError::TableLength {
                table: "poi",
                expected: GameConfig::NUM_POI,
                found: entries.len(),
            });
        }
        for (index, poi) in entries.iter().enumerate() {
            if !poi.anchor.is_inside_map() || !poi.exit.is_inside_map() {
                return Err(WorldError::PoiOutsideMap { index });
            }
        }
        Ok(Self { entries })
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Poi> {
        self.entries.get(index)
    }

    /// Anchor of POI `index`, or the origin for an unknown index.
    #[inline]
    pub fn anchor(&self, index: usize) -> Coord {
        self.entries.get(index).map_or(Coord::ORIGIN, |p| p.anchor)
    }

    #[inline]
    pub fn kind(&self, index: usize) -> PoiKind {
        self.entries.get(index).map_or(PoiKind::default(), |p| p.kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Poi> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Redhead crescents are the first of every group of three.
    pub const fn is_big_crescent(index: usize) -> bool {
        index >= *Self::CRESCENTS.start()
            && index <= *Self::CRESCENTS.end()
            && (index - *Self::CRESCENTS.start()) % 3 == 0
    }
}
