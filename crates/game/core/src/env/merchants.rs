use super::WorldError;
use crate::config::GameConfig;
use crate::state::{Coord, Role};

/// Home tile and team of one merchant role.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MerchantBase {
    pub base: Coord,
    /// Team whose characters may be recycled into this merchant.
    pub color: u8,
    /// A missing merchant may only come back above this height.
    pub chronon: i32,
}

/// Merchant roles `1..=38`; entry 0 is a placeholder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerchantTable {
    entries: Vec<MerchantBase>,
}

impl MerchantTable {
    pub fn from_arrays(
        x: &[i32],
        y: &[i32],
        colors: &[u8],
        chronons: &[i32],
    ) -> Result<Self, WorldError> {
        let n = GameConfig::NUM_MERCHANTS;
        for len in [x.len(), y.len(), colors.len(), chronons.len()] {
            if len != n {
                return Err(WorldError::TableLength {
                    table: "merchant",
                    expected: n,
                    found: len,
                });
            }
        }
        let entries = (0..n)
            .map(|i| MerchantBase {
                base: Coord::new(x[i], y[i]),
                color: colors[i],
                chronon: chronons[i],
            })
            .collect();
        Self::new(entries)
    }

    pub fn new(entries: Vec<MerchantBase>) -> Result<Self, WorldError> {
        if entries.len() != GameConfig::NUM_MERCHANTS {
            return Err(WorldError::TableLength {
                table: "merchant",
                expected: GameConfig::NUM_MERCHANTS,
                found: entries.len(),
            });
        }
        for (index, m) in entries.iter().enumerate().skip(1) {
            if !m.base.is_inside_map() {
                return Err(WorldError::MerchantOutsideMap { index });
            }
            if usize::from(m.color) >= GameConfig::NUM_TEAM_COLORS {
                return Err(WorldError::MerchantColor {
                    index,
                    color: m.color,
                });
            }
        }
        Ok(Self { entries })
    }

    #[inline]
    pub fn get(&self, role: Role) -> Option<&MerchantBase> {
        if role.is_merchant() {
            self.entries.get(role.index())
        } else {
            None
        }
    }

    #[inline]
    pub fn base(&self, role: Role) -> Option<Coord> {
        self.get(role).map(|m| m.base)
    }

    /// Merchant roles with their table entries, in role order.
    pub fn iter(&self) -> impl Iterator<Item = (Role, &MerchantBase)> {
        self.entries
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, m)| (Role(i as u8), m))
    }
}

/// Per-tile marker in the merchant-base map.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BaseMapCode(pub u16);

impl BaseMapCode {
    pub const NONE: Self = Self(0);
    pub const MERCH_TELEPORT: Self = Self(1001);
    pub const TP_EXIT_INACTIVE: Self = Self(1002);
    pub const TP_EXIT_ACTIVE: Self = Self(1003);
    pub const TELEPORT: Self = Self(1004);
    pub const MERCH_NORMAL: Self = Self(1005);

    /// Tiles the random dispersal step never enters.
    #[inline]
    pub const fn is_avoided(self) -> bool {
        self.0 >= Self::TELEPORT.0
    }

    #[inline]
    pub const fn is_special(self) -> bool {
        self.0 >= Self::MERCH_TELEPORT.0
    }
}
