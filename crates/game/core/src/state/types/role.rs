use std::fmt;

use crate::config::GameConfig;

/// NPC role byte of a character.
///
/// `0` is an ordinary hunter, `1..=38` are merchants (the value doubles as the
/// merchant table index) and `100..=102` are monsters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Role(pub u8);

impl Role {
    pub const PLAYER: Self = Self(0);

    // ===== merchants =====
    /// Teleport merchants `1..=8` share their index with the teleporter POI type.
    pub const TELEPORT_FIRST: Self = Self(1);
    pub const TELEPORT_LAST: Self = Self(8);
    pub const NORMAL_MERCHANT_FIRST: Self = Self(9);
    pub const INFO_TOTAL_POPULATION: Self = Self(9);
    /// Carries the devmode switch and pays DAO bounties.
    pub const INFO_DEVMODE: Self = Self(10);
    pub const INFO_PC_COUNT: Self = Self(11);
    pub const INFO_MON_COUNT: Self = Self(12);
    pub const ARMOR_SPLINT: Self = Self(13);
    pub const STINKING_CLOUD: Self = Self(14);
    pub const AMULET_WORD_RECALL: Self = Self(15);
    pub const RING_WORD_RECALL: Self = Self(16);
    pub const AMULET_REGEN: Self = Self(17);
    pub const WEAPON_ESTOC: Self = Self(18);
    pub const WEAPON_XBOW: Self = Self(19);
    pub const WEAPON_XBOW3: Self = Self(20);
    pub const CHAMPION_TEST: Self = Self(21);
    pub const RATIONS_TEST: Self = Self(22);
    pub const ARMOR_RING: Self = Self(23);
    pub const ARMOR_CHAIN: Self = Self(24);
    pub const AUX_INFO0: Self = Self(25);
    pub const CANTEEN_FANATISM: Self = Self(26);
    pub const CANTEEN_DUTY: Self = Self(27);
    pub const CANTEEN_FREEDOM: Self = Self(28);
    pub const WEAPON_SWORD: Self = Self(29);
    pub const ARMOR_PLATE: Self = Self(30);
    pub const BOOK_MARK_RECALL: Self = Self(31);
    pub const BOOK_RESTING: Self = Self(32);
    pub const BOOK_SURVIVAL: Self = Self(33);
    pub const BOOK_CONQUEST: Self = Self(34);
    pub const STAFF_FIREBALL: Self = Self(35);
    pub const STAFF_REAPER: Self = Self(36);
    pub const AMULET_LIFE_SAVING: Self = Self(37);
    pub const STAFF_LIGHTNING: Self = Self(38);
    pub const NORMAL_MERCHANT_LAST: Self = Self(38);

    // ===== monsters =====
    pub const REAPER: Self = Self(100);
    pub const SPITTER: Self = Self(101);
    pub const REDHEAD: Self = Self(102);

    /// Size of the per-role population table.
    pub const COUNT: usize = 103;

    #[inline]
    pub const fn is_player(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_merchant(self) -> bool {
        self.0 >= 1 && (self.0 as usize) < GameConfig::NUM_MERCHANTS
    }

    #[inline]
    pub const fn is_monster(self) -> bool {
        self.0 >= 100 && self.0 <= 102
    }

    #[inline]
    pub const fn is_monster_or_player(self) -> bool {
        self.is_player() || self.is_monster()
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Role::PLAYER => f.write_str("hunter"),
            Role::REAPER => f.write_str("reaper"),
            Role::SPITTER => f.write_str("spitter"),
            Role::REDHEAD => f.write_str("redhead"),
            Role(n) if self.is_merchant() => write!(f, "merchant #{n}"),
            Role(n) => write!(f, "role #{n}"),
        }
    }
}
