//! Authoritative game state representation.
//!
//! This module owns the data structures that describe players, characters,
//! loot, hearts and the crown. The engine clones the previous state and
//! mutates the copy; nothing here performs randomness or I/O.
mod error;
pub mod types;

use std::collections::{BTreeMap, BTreeSet};

pub use error::StateError;
pub use types::{
    AiMode, AiOrders, AiStatus, Armor, BlockHash, CharacterId, CharacterState, CollectedLootInfo,
    Coord, LootInfo, PlayerId, PlayerState, Role, TileFlags, Trinket, UnknownItemCode, Waypoints,
    Weapon, direction,
};
pub(crate) use types::parse_leading_int;

use crate::config::{ForkSchedule, GameConfig};

/// Canonical snapshot of the deterministic game state.
///
/// Field order is the persisted layout order.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameState {
    pub players: BTreeMap<PlayerId, PlayerState>,
    /// Last chat messages of players who died in this step (colour and message only).
    pub dead_players_chat: BTreeMap<PlayerId, PlayerState>,
    /// At most one pile per tile; empty piles are removed.
    pub loot: BTreeMap<Coord, LootInfo>,
    pub hearts: BTreeSet<Coord>,
    pub crown_pos: Coord,
    /// Empty player name while the crown lies on the ground.
    pub crown_holder: CharacterId,
    /// Coins nobody could receive.
    pub game_fund: i64,
    /// -1 before genesis; the state at height `h` includes the moves of block `h`.
    pub height: i32,
    /// Height of the last disaster, -1 if none happened yet.
    pub disaster_height: i32,
    pub hash_block: BlockHash,

    pub dao_best_fee: i64,
    pub dao_best_fee_final: i64,
    pub dao_best_request: i64,
    pub dao_best_request_final: i64,
    pub dao_best_name: String,
    pub dao_best_name_final: String,
    pub dao_bounty_previous_week: i64,
    pub dao_name_previous_week: String,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

/// A character standing on a loot pile, with the ordering key used for division.
struct Collector {
    player: PlayerId,
    index: i32,
    capacity: Option<i64>,
    remaining: Option<i64>,
}

impl GameState {
    /// The state before the genesis block.
    pub fn new() -> Self {
        Self {
            players: BTreeMap::new(),
            dead_players_chat: BTreeMap::new(),
            loot: BTreeMap::new(),
            hearts: BTreeSet::new(),
            crown_pos: Coord::new(GameConfig::CROWN_START_X, GameConfig::CROWN_START_Y),
            crown_holder: CharacterId::none(),
            game_fund: 0,
            height: -1,
            disaster_height: -1,
            hash_block: BlockHash::ZERO,
            dao_best_fee: 0,
            dao_best_fee_final: 0,
            dao_best_request: 0,
            dao_best_request_final: 0,
            dao_best_name: String::new(),
            dao_best_name_final: String::new(),
            dao_bounty_previous_week: 0,
            dao_name_previous_week: String::new(),
        }
    }

    pub fn character(&self, id: &CharacterId) -> Option<&CharacterState> {
        self.players.get(&id.player)?.characters.get(&id.index)
    }

    pub fn character_mut(&mut self, id: &CharacterId) -> Option<&mut CharacterState> {
        self.players.get_mut(&id.player)?.characters.get_mut(&id.index)
    }

    /// Characters a newly spawned player receives at this height.
    pub fn num_initial_characters(&self, forks: &ForkSchedule) -> u32 {
        if forks.poison_active(self.height) { 1 } else { 3 }
    }

    /// Adds (or with a negative amount, removes) coins on a tile.
    pub fn add_loot(&mut self, coord: Coord, amount: i64) {
        if amount == 0 {
            return;
        }
        match self.loot.get_mut(&coord) {
            Some(pile) => {
                pile.amount += amount;
                if pile.amount == 0 {
                    self.loot.remove(&coord);
                } else {
                    pile.last_block = self.height;
                }
            }
            None => {
                self.loot.insert(coord, LootInfo::new(amount, self.height));
            }
        }
    }

    /// Coins on the ground plus coins held by characters (locked general
    /// stakes are excluded).
    pub fn coins_on_map(&self) -> i64 {
        let ground: i64 = self.loot.values().map(|l| l.amount).sum();
        let held: i64 = self
            .players
            .values()
            .flat_map(|p| p.characters.values())
            .map(|ch| ch.loot.amount())
            .sum();
        ground + held
    }

    /// Splits every pile among the characters standing on it.
    ///
    /// Collectors pick in order of ascending remaining capacity (unlimited
    /// last), then player name, then index; each takes an equal share of what
    /// is left and leaves anything it cannot carry for the others.
    /// `capacity(id, is_crown_holder)` returns `None` for unlimited.
    pub fn divide_loot_among_players(
        &mut self,
        capacity: impl Fn(&CharacterId, bool) -> Option<i64>,
    ) {
        let mut on_tile: BTreeMap<Coord, i64> = BTreeMap::new();
        let mut collectors = Vec::new();
        for (pid, player) in &self.players {
            for (&index, ch) in &player.characters {
                if !self.loot.contains_key(&ch.coord) {
                    continue;
                }
                let id = CharacterId::new(pid.clone(), index);
                let is_holder = id == self.crown_holder;
                let cap = capacity(&id, is_holder);
                *on_tile.entry(ch.coord).or_insert(0) += 1;
                collectors.push(Collector {
                    player: id.player,
                    index,
                    capacity: cap,
                    remaining: cap.map(|c| (c - ch.loot.amount()).max(0)),
                });
            }
        }

        collectors.sort_by(|a, b| {
            let by_capacity = match (a.remaining, b.remaining) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            };
            by_capacity
                .then_with(|| a.player.cmp(&b.player))
                .then_with(|| a.index.cmp(&b.index))
        });

        let height = self.height;
        for c in collectors {
            let Some(ch) = self
                .players
                .get_mut(&c.player)
                .and_then(|p| p.characters.get_mut(&c.index))
            else {
                continue;
            };
            let coord = ch.coord;
            let (Some(count), Some(pile)) = (on_tile.get_mut(&coord), self.loot.get(&coord)) else {
                continue;
            };
            let mut share = *pile;
            share.amount /= *count;
            *count -= 1;

            // Dust piles leave some collectors empty-handed.
            if share.amount > 0 {
                let rest = ch.collect_loot(share, height, c.capacity);
                self.add_loot(coord, rest - share.amount);
            }
        }
    }

    /// Follows the crown holder. Returns true when the crown must respawn
    /// because its holder walked into a spawn area.
    pub fn update_crown_state(&mut self) -> bool {
        if self.crown_holder.is_none() {
            return false;
        }
        let Some(holder) = self.character(&self.crown_holder) else {
            self.crown_holder = CharacterId::none();
            return false;
        };
        let coord = holder.coord;
        if coord.is_in_spawn_area() {
            self.crown_holder = CharacterId::none();
            true
        } else {
            self.crown_pos = coord;
            false
        }
    }

    /// Pays the crown bonus to the holder; anything it cannot carry, or the
    /// whole bonus while the crown lies on the ground, goes to the game fund.
    pub fn crown_bonus(&mut self, amount: i64, capacity: Option<i64>) {
        let height = self.height;
        let holder = self.crown_holder.clone();
        match self.character_mut(&holder) {
            Some(ch) if !holder.is_none() => {
                let rest = ch.collect_loot(LootInfo::new(amount, height), height, capacity);
                self.game_fund += rest;
            }
            _ => self.game_fund += amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put(state: &mut GameState, player: &str, index: i32, at: Coord) {
        let pl = state.players.entry(player.to_string()).or_default();
        pl.color = 0;
        pl.characters.insert(
            index,
            CharacterState {
                coord: at,
                from: at,
                ..CharacterState::default()
            },
        );
    }

    #[test]
    fn add_loot_merges_and_erases_empty_piles() {
        let mut state = GameState::new();
        state.height = 7;
        let c = Coord::new(3, 4);
        state.add_loot(c, 10);
        state.height = 9;
        state.add_loot(c, 5);
        assert_eq!(state.loot[&c].amount, 15);
        assert_eq!((state.loot[&c].first_block, state.loot[&c].last_block), (7, 9));
        state.add_loot(c, -15);
        assert!(state.loot.is_empty());
    }

    #[test]
    fn capacity_limited_collector_picks_first() {
        let tile = Coord::new(50, 50);
        for (small, big) in [("a", "b"), ("b", "a")] {
            let mut state = GameState::new();
            state.height = 1;
            put(&mut state, small, 0, tile);
            put(&mut state, big, 0, tile);
            state.add_loot(tile, 15);

            state.divide_loot_among_players(|id, _| (id.player == small).then_some(10));

            // floor(15 / 2) for the limited collector, the rest for the unlimited one
            let got_small = state.players[small].characters[&0].loot.amount();
            let got_big = state.players[big].characters[&0].loot.amount();
            assert_eq!((got_small, got_big), (7, 8));
            assert_eq!(got_small + got_big, 15);
            assert!(state.loot.is_empty());
        }
    }

    #[test]
    fn indivisible_remainder_goes_to_the_last_collector() {
        let tile = Coord::new(60, 60);
        let mut state = GameState::new();
        state.height = 1;
        put(&mut state, "x", 0, tile);
        put(&mut state, "x", 1, tile);
        put(&mut state, "y", 0, tile);
        state.add_loot(tile, 10);
        state.divide_loot_among_players(|_, _| None);

        assert_eq!(state.players["x"].characters[&0].loot.amount(), 3);
        assert_eq!(state.players["x"].characters[&1].loot.amount(), 3);
        assert_eq!(state.players["y"].characters[&0].loot.amount(), 4);
        assert_eq!(state.coins_on_map(), 10);
    }

    #[test]
    fn crown_drops_when_holder_enters_spawn_area() {
        let mut state = GameState::new();
        put(&mut state, "king", 0, Coord::new(0, 3));
        state.crown_holder = CharacterId::new("king", 0);
        assert!(state.update_crown_state());
        assert!(state.crown_holder.is_none());

        state.crown_bonus(40, None);
        assert_eq!(state.game_fund, 40);
    }
}
