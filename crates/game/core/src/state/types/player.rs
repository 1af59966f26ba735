use std::collections::BTreeMap;

use super::CharacterState;
use crate::config::GameConfig;
use crate::env::StepRng;

/// Everything the game tracks about one player name.
///
/// Field order is the persisted layout order (`coin_amount` is written last).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayerState {
    /// Team colour 0-3 (`0xFF` until spawned).
    pub color: u8,
    /// Characters by index; index 0 is the general.
    pub characters: BTreeMap<i32, CharacterState>,
    pub next_character_index: i32,
    /// Blocks left to live when poisoned, -1 otherwise. Never 0 between steps.
    pub remaining_life: i32,

    pub message: String,
    pub message_block: i32,
    /// Reward address; empty means the name address.
    pub address: String,
    /// Admin address allowed to change `address`.
    pub address_lock: String,

    pub addr_token: String,
    pub msg_vote: String,
    pub msg_vote_block: i32,
    pub msg_request: String,
    pub msg_request_block: i32,
    pub msg_fee: String,
    pub msg_comment: String,
    pub coins_vote: i64,
    pub coins_request: i64,
    pub coins_fee: i64,

    /// Value locked by the general's name; dropped on the map when the player dies.
    pub coin_amount: i64,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            color: 0xFF,
            characters: BTreeMap::new(),
            next_character_index: 0,
            remaining_life: -1,
            message: String::new(),
            message_block: 0,
            address: String::new(),
            address_lock: String::new(),
            addr_token: String::new(),
            msg_vote: String::new(),
            msg_vote_block: 0,
            msg_request: String::new(),
            msg_request_block: 0,
            msg_fee: String::new(),
            msg_comment: String::new(),
            coins_vote: 0,
            coins_request: 0,
            coins_fee: 0,
            coin_amount: -1,
        }
    }
}

impl PlayerState {
    pub fn can_spawn_character(&self) -> bool {
        self.characters.len() < GameConfig::MAX_CHARACTERS_PER_PLAYER
            && self.next_character_index < GameConfig::MAX_CHARACTERS_PER_PLAYER_TOTAL
    }

    pub fn spawn_character(&mut self, rng: &mut StepRng) {
        let index = self.next_character_index;
        self.next_character_index += 1;
        let ch = self.characters.entry(index).or_default();
        ch.spawn(self.color, rng);
    }

    pub fn general(&self) -> Option<&CharacterState> {
        self.characters.get(&0)
    }

    pub fn is_poisoned(&self) -> bool {
        self.remaining_life > 0
    }
}
