//! Value types that make up the persisted game state.
mod character;
mod common;
mod flags;
mod hash;
mod items;
mod loot;
mod player;
mod role;

pub use character::{CharacterState, Waypoints, direction};
pub use common::{CharacterId, Coord, PlayerId};
pub(crate) use common::parse_leading_int;
pub use flags::{AiMode, AiOrders, AiStatus, TileFlags};
pub use hash::BlockHash;
pub use items::{Armor, Trinket, UnknownItemCode, Weapon};
pub use loot::{CollectedLootInfo, LootInfo};
pub use player::PlayerState;
pub use role::Role;
