//! Bit registers carried on every character, plus the per-tile damage/resist mask.
//!
//! Flags within one register are independent; several death causes may be
//! pending at once. The numeric layout is persisted, so bit positions are fixed.

use bitflags::bitflags;

bitflags! {
    /// Movement and long-term behaviour mode.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct AiMode: u8 {
        /// Farm harvest ring 2 instead of ring 1.
        const FARM_OUTER_RING = 1 << 0;
        /// Player supplied waypoints.
        const MANUAL_MODE = 1 << 1;
        /// Never had waypoints; the AI may shop on its own.
        const AUTO_MODE = 1 << 2;
        const FULL_OF_HEARTS = 1 << 3;
        /// Book of survival: halves the panic threshold.
        const SURVIVAL = 1 << 4;
        /// Book of resting: escape home at the next apocalypse.
        const RESTING = 1 << 5;
        const MARK_RECALL = 1 << 6;
        /// Moved one tile this step; hitscan resolves against the previous tile.
        const NORMAL_STEP = 1 << 7;
    }
}

bitflags! {
    /// Pending death causes and teleport bookkeeping.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct AiStatus: u8 {
        const DEATH_POISON = 1 << 0;
        const DEATH_FIRE = 1 << 1;
        const DEATH_DEATH = 1 << 2;
        /// Protected: the general of a player whose general must live.
        const ESSENTIAL = 1 << 3;
        const DEATH_LIGHTNING = 1 << 4;
        /// Teleport to a safe anchor at the next merchants phase.
        const ESCAPE = 1 << 5;
        const NORMAL_TP = 1 << 6;
        /// Reserved bit, never set by the engine.
        const ORDER_ARMED = 1 << 7;

        const DEATH_ALL = Self::DEATH_POISON.bits()
            | Self::DEATH_FIRE.bits()
            | Self::DEATH_DEATH.bits()
            | Self::DEATH_LIGHTNING.bits();
    }
}

bitflags! {
    /// Orders taken from canteen merchants.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct AiOrders: u8 {
        /// Return to the duty harvest area after each apocalypse.
        const DUTY = 1 << 0;
        /// Keep the duty area across retreats.
        const FANATISM = 1 << 1;
    }
}

bitflags! {
    /// Per-tile, per-team damage and resist mask.
    ///
    /// Damage bits are written by attackers against every team other than
    /// their own; resist bits are written by Pass 0 for the team standing on
    /// the tile. Both live in one word because the ranged scan reads a
    /// target's resists from the same cell it writes damage into.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct TileFlags: u32 {
        const POISON1 = 0x0000_0001;
        const POISON2 = 0x0000_0002;
        const POISON3 = 0x0000_0004;
        const FIRE1 = 0x0000_0010;
        const FIRE2 = 0x0000_0020;
        const FIRE3 = 0x0000_0040;
        const DEATH1 = 0x0000_0100;
        const DEATH2 = 0x0000_0200;
        const DEATH3 = 0x0000_0400;
        const LIGHTNING1 = 0x0000_1000;
        const LIGHTNING2 = 0x0000_2000;
        const LIGHTNING3 = 0x0000_4000;

        const RESIST_POISON0 = 0x0001_0000;
        const RESIST_POISON1 = 0x0002_0000;
        const RESIST_POISON2 = 0x0004_0000;
        const RESIST_FIRE0 = 0x0008_0000;
        const RESIST_FIRE1 = 0x0010_0000;
        const RESIST_FIRE2 = 0x0020_0000;
        const RESIST_DEATH0 = 0x0040_0000;
        const RESIST_DEATH1 = 0x0080_0000;
        const RESIST_DEATH2 = 0x0100_0000;
        const RESIST_LIGHTNING0 = 0x0200_0000;
        const RESIST_LIGHTNING1 = 0x0400_0000;
        const RESIST_LIGHTNING2 = 0x0800_0000;

        const POISON1TO3 = Self::POISON1.bits() | Self::POISON2.bits() | Self::POISON3.bits();
        const FIRE1TO3 = Self::FIRE1.bits() | Self::FIRE2.bits() | Self::FIRE3.bits();
        const DEATH1TO3 = Self::DEATH1.bits() | Self::DEATH2.bits() | Self::DEATH3.bits();
        const LIGHTNING1TO3 =
            Self::LIGHTNING1.bits() | Self::LIGHTNING2.bits() | Self::LIGHTNING3.bits();
    }
}

macro_rules! byte_register_serde {
    ($name:ident, $repr:ty) => {
        #[cfg(feature = "serde")]
        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serde::Serialize::serialize(&self.bits(), serializer)
            }
        }

        #[cfg(feature = "serde")]
        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                <$repr as serde::Deserialize>::deserialize(deserializer).map(Self::from_bits_retain)
            }
        }
    };
}

// Raw bits on the wire: unknown bits from older data survive a round trip.
byte_register_serde!(AiMode, u8);
byte_register_serde!(AiStatus, u8);
byte_register_serde!(AiOrders, u8);
