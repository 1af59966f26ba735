//! Equipment slots carried by a character.
//!
//! Every slot is a one-byte code in the persisted layout. The enums below keep
//! the numeric codes as discriminants and order by them, because the AI
//! compares armor tiers numerically.

use strum::{AsRefStr, Display, EnumIter};

macro_rules! byte_code_enum {
    ($name:ident) => {
        impl From<$name> for u8 {
            fn from(value: $name) -> u8 {
                value as u8
            }
        }

        impl TryFrom<u8> for $name {
            type Error = UnknownItemCode;

            fn try_from(code: u8) -> Result<Self, Self::Error> {
                <$name as strum::IntoEnumIterator>::iter()
                    .find(|item| *item as u8 == code)
                    .ok_or(UnknownItemCode {
                        slot: stringify!($name),
                        code,
                    })
            }
        }
    };
}

/// An equipment byte that does not name a known item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown {slot} code {code}")]
pub struct UnknownItemCode {
    pub slot: &'static str,
    pub code: u8,
}

/// Attack carried in the spell/weapon slot.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Display, AsRefStr, EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(into = "u8", try_from = "u8"))]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum Weapon {
    #[default]
    None = 0,
    /// Stinking cloud: area poison with distance falloff.
    Poison = 1,
    /// Fireball: single target, burns everyone on the tile.
    Fire = 2,
    /// Reaper staff: area death magic.
    Death = 3,
    Xbow = 4,
    /// Sword (melee).
    Knight = 5,
    /// Estoc (melee).
    Estoc = 6,
    Lightning = 7,
    Xbow3 = 8,
}

byte_code_enum!(Weapon);

impl Weapon {
    pub const fn is_mage(self) -> bool {
        matches!(
            self,
            Weapon::Poison | Weapon::Fire | Weapon::Death | Weapon::Lightning
        )
    }

    pub const fn is_some(self) -> bool {
        !matches!(self, Weapon::None)
    }
}

/// Amulet and ring slots share one code space.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Display, AsRefStr, EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(into = "u8", try_from = "u8"))]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum Trinket {
    #[default]
    None = 0,
    WordOfRecall = 1,
    Regen = 2,
    LifeSaving = 3,
}

byte_code_enum!(Trinket);

impl Trinket {
    pub const fn is_some(self) -> bool {
        !matches!(self, Trinket::None)
    }
}

/// Armor tiers. Codes 1 and 4 are unused.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Display, AsRefStr, EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(into = "u8", try_from = "u8"))]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum Armor {
    #[default]
    None = 0,
    Ring = 2,
    Chain = 3,
    Splint = 5,
    Plate = 6,
}

byte_code_enum!(Armor);
