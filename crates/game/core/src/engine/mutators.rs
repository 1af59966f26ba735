//! End-of-step world mutators: banking, disasters, treasure, hearts and
//! the crown.
//!
//! Banking only depends on the state, so miners can compute the tax before
//! the block hash is known. Everything else draws from the world generator
//! seeded with the new block hash.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::config::{ForkSchedule, GameConfig};
use crate::env::{MapOracle, PoiTable, StepRng, World};
use crate::state::{AiStatus, CharacterId, Coord, GameState, PlayerId};

use super::result::{CollectedBounty, StepResult};

/// Banking tax, in percent.
const BANKING_TAX_PERCENT: i64 = 10;
/// Hearts only appear this close to a normal point of interest.
const HEART_POI_RANGE: i32 = 12;

/// Characters on the spawn strips bank their loot, minus the tax.
pub fn bank_loot(state: &mut GameState, result: &mut StepResult) {
    for (name, player) in state.players.iter_mut() {
        for (&index, ch) in player.characters.iter_mut() {
            if ch.status.contains(AiStatus::ESSENTIAL) {
                continue;
            }
            if ch.loot.amount() <= 0 || !ch.coord.is_in_spawn_area() {
                continue;
            }
            let tax = ch.loot.amount() * BANKING_TAX_PERCENT / 100;
            result.tax_amount += tax;
            ch.loot.loot.amount -= tax;
            let banked = std::mem::take(&mut ch.loot);
            debug!(player = %name, index, amount = banked.amount(), tax, "loot banked");
            result.bounties.push(CollectedBounty::new(
                CharacterId::new(name.clone(), index),
                banked,
                player.address.clone(),
            ));
        }
    }
}

/// Disaster roll. Poison disasters are switched off in this ruleset, so
/// the roll never fires and consumes no entropy.
pub fn disaster_due(_rng: &mut StepRng) -> bool {
    false
}

/// Poisons every player with a random countdown.
pub fn apply_disaster(state: &mut GameState, forks: &ForkSchedule, rng: &mut StepRng) {
    for player in state.players.values_mut() {
        debug_assert_eq!(player.remaining_life, -1, "disaster hit a poisoned player");
        player.remaining_life = rng.range(GameConfig::POISON_MIN_LIFE, GameConfig::POISON_MAX_LIFE);
    }
    if forks.less_hearts_active(state.height) {
        state.hearts.clear();
    }
    state.disaster_height = state.height;
    info!(height = state.height, "disaster");
}

/// Drops the block treasure on one random tile of every harvest area.
/// Returns the crown bonus still to be paid.
pub fn drop_treasure(state: &mut GameState, world: &World, rng: &mut StepRng, treasure: i64) -> i64 {
    let crown_bonus = GameConfig::CROWN_BONUS * treasure / GameConfig::TOTAL_HARVEST;
    let mut dropped = 0;
    for area in world.harvest().areas() {
        let a = rng.next(area.tiles.len() as i32) as usize;
        let amount = area.portion * treasure / GameConfig::TOTAL_HARVEST;
        if let Some(&tile) = area.tiles.get(a) {
            state.add_loot(tile, amount);
            dropped += amount;
        }
    }
    if dropped + crown_bonus != treasure {
        // rounding dust of non-multiples of the total is simply not minted
        warn!(treasure, dropped, crown_bonus, "treasure does not split evenly");
    }
    crown_bonus
}

/// Maybe drops one heart on a random walkable tile near a harvest area.
pub fn drop_heart(state: &mut GameState, world: &World, rng: &mut StepRng) {
    let heart = Coord::new(
        rng.next(GameConfig::MAP_WIDTH),
        rng.next(GameConfig::MAP_HEIGHT),
    );
    if !heart.is_inside_map() || !world.is_walkable(heart) {
        return;
    }
    if near_harvest_poi(world, heart) {
        state.hearts.insert(heart);
    }
}

/// Hearts only appear close to (but not on) a normal POI.
fn near_harvest_poi(world: &World, tile: Coord) -> bool {
    let mut normal = PoiTable::NORMAL;
    normal.any(|k| {
        let d = world.poi_distance(k, tile);
        d > 0 && d <= HEART_POI_RANGE
    })
}

/// Every heart tile with characters on it spawns a new character for one
/// of their players, chosen at random among those still allowed to grow.
pub fn collect_hearts(state: &mut GameState, rng: &mut StepRng) {
    let mut on_heart: BTreeMap<Coord, Vec<PlayerId>> = BTreeMap::new();
    for (name, player) in &state.players {
        if !player.can_spawn_character() {
            continue;
        }
        for ch in player.characters.values() {
            if state.hearts.contains(&ch.coord) {
                on_heart.entry(ch.coord).or_default().push(name.clone());
            }
        }
    }

    for (coord, mut candidates) in on_heart {
        while !candidates.is_empty() {
            let n = candidates.len();
            let i = if n == 1 { 0 } else { rng.next(n as i32) as usize };
            let Some(player) = state.players.get_mut(&candidates[i]) else {
                candidates.remove(i);
                continue;
            };
            if !player.can_spawn_character() {
                candidates.remove(i);
                continue;
            }
            player.spawn_character(rng);
            state.hearts.remove(&coord);
            debug!(player = %candidates[i], %coord, "heart collected");
            break;
        }
    }
}

/// Respawns the crown if needed and hands it to a character standing on it.
pub fn collect_crown(state: &mut GameState, world: &World, rng: &mut StepRng, respawn: bool) {
    if !state.crown_holder.is_none() {
        debug_assert!(!respawn);
        return;
    }
    if respawn {
        let spawns = world.harvest().crown_spawns();
        let a = rng.next(spawns.len() as i32) as usize;
        if let Some(&pos) = spawns.get(a) {
            state.crown_pos = pos;
        }
    }

    let crown_pos = state.crown_pos;
    let on_crown: Vec<CharacterId> = state
        .players
        .iter()
        .flat_map(|(name, player)| {
            player
                .characters
                .iter()
                .filter(move |(_, ch)| ch.coord == crown_pos)
                .map(move |(&index, _)| CharacterId::new(name.clone(), index))
        })
        .collect();
    let n = on_crown.len();
    if n == 0 {
        return;
    }
    let i = if n == 1 { 0 } else { rng.next(n as i32) as usize };
    state.crown_holder = on_crown[i].clone();
    debug!(holder = %state.crown_holder, "crown picked up");
}
