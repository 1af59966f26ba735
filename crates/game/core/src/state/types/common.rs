use std::cmp::Ordering;
use std::fmt;

use crate::config::GameConfig;

/// Unique player name.
pub type PlayerId = String;

/// Discrete map position expressed in tile coordinates.
///
/// Ordering is row-major (`y` first, then `x`); loot piles and hearts are
/// iterated in this order, so it is part of the consensus contract.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub const fn is_inside_map(self) -> bool {
        self.x >= 0
            && self.x < GameConfig::MAP_WIDTH
            && self.y >= 0
            && self.y < GameConfig::MAP_HEIGHT
    }

    /// Corner strips where new characters appear and banking happens.
    pub const fn is_in_spawn_area(self) -> bool {
        let (x, y) = (self.x, self.y);
        let (w, h, len) = (
            GameConfig::MAP_WIDTH,
            GameConfig::MAP_HEIGHT,
            GameConfig::SPAWN_AREA_LENGTH,
        );
        ((x == 0 || x == w - 1) && (y < len || y >= h - len))
            || ((y == 0 || y == h - 1) && (x < len || x >= w - len))
    }

    /// L-infinity distance, which is the number of steps between two tiles.
    ///
    /// Only meaningful for coordinates that already lie on the map.
    #[inline]
    pub fn dist_linf(self, other: Coord) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    #[inline]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl Ord for Coord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.y.cmp(&other.y).then(self.x.cmp(&other.x))
    }
}

impl PartialOrd for Coord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Player name plus character index. Index 0 is the general.
///
/// Ordered lexicographically by player, then index.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CharacterId {
    pub player: PlayerId,
    pub index: i32,
}

impl CharacterId {
    pub fn new(player: impl Into<PlayerId>, index: i32) -> Self {
        Self {
            player: player.into(),
            index,
        }
    }

    /// The "no character" value used for an unclaimed crown.
    pub fn none() -> Self {
        Self {
            player: PlayerId::new(),
            index: -1,
        }
    }

    pub fn is_none(&self) -> bool {
        self.player.is_empty()
    }

    /// Parses `name` or `name.index`; a missing or malformed index reads as 0.
    pub fn parse(s: &str) -> Self {
        match s.find('.') {
            None => Self::new(s, 0),
            Some(pos) => Self::new(&s[..pos], parse_leading_int(&s[pos + 1..])),
        }
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.index == 0 {
            write!(f, "{}", self.player)
        } else {
            write!(f, "{}.{}", self.player, self.index)
        }
    }
}

/// `atoi`-style parse: optional whitespace and sign, then digits until the
/// first non-digit. Returns 0 when no digits are present.
pub(crate) fn parse_leading_int(s: &str) -> i32 {
    let s = s.trim_start();
    let (neg, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let mut value: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        value = (value * 10 + i64::from(b - b'0')).min(i64::from(i32::MAX) + 1);
    }
    let value = if neg { -value } else { value };
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
