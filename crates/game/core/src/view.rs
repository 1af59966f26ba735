//! Read-only JSON projection of the game state for explorers and UIs.
//!
//! The projection is one-way: nothing reads it back, and it is not part of
//! the persisted format.

use serde_json::{Map, Value, json};

use crate::config::GameConfig;
use crate::state::{CharacterState, Coord, GameState, PlayerState};

/// Coin amounts are shown as decimal coins.
fn coins(amount: i64) -> Value {
    json!(amount as f64 / GameConfig::COIN as f64)
}

fn xy(c: Coord) -> Map<String, Value> {
    let mut obj = Map::new();
    obj.insert("x".into(), json!(c.x));
    obj.insert("y".into(), json!(c.y));
    obj
}

fn character_view(ch: &CharacterState, has_crown: bool) -> Value {
    let mut obj = xy(ch.coord);
    if !ch.waypoints.is_empty() {
        obj.insert("fromX".into(), json!(ch.from.x));
        obj.insert("fromY".into(), json!(ch.from.y));
        // stored next-last; shown in walking order
        let wp: Vec<i32> = ch.waypoints.iter().rev().flat_map(|c| [c.x, c.y]).collect();
        obj.insert("wp".into(), json!(wp));
    }
    obj.insert("dir".into(), json!(ch.dir));
    obj.insert("stay_in_spawn_area".into(), json!(ch.stay_in_spawn_area));
    obj.insert("loot".into(), coins(ch.loot.amount()));
    if has_crown {
        obj.insert("has_crown".into(), json!(true));
    }
    Value::Object(obj)
}

fn player_view(player: &PlayerState, crown_index: Option<i32>, dead: bool) -> Value {
    let mut obj = Map::new();
    obj.insert("color".into(), json!(player.color));
    obj.insert("coinAmount".into(), coins(player.coin_amount));
    if player.remaining_life > 0 {
        obj.insert("poison".into(), json!(player.remaining_life));
    }
    if !player.message.is_empty() {
        obj.insert("msg".into(), json!(player.message));
        obj.insert("msg_block".into(), json!(player.message_block));
    }
    if dead {
        obj.insert("dead".into(), json!(1));
    } else {
        if !player.address.is_empty() {
            obj.insert("address".into(), json!(player.address));
        }
        if !player.address_lock.is_empty() {
            obj.insert("addressLock".into(), json!(player.address_lock));
        }
    }
    for (&index, ch) in &player.characters {
        obj.insert(index.to_string(), character_view(ch, crown_index == Some(index)));
    }
    Value::Object(obj)
}

pub fn state_view(state: &GameState) -> Value {
    let mut players = Map::new();
    for (name, player) in &state.players {
        let crown_index = (state.crown_holder.player == *name).then_some(state.crown_holder.index);
        players.insert(name.clone(), player_view(player, crown_index, false));
    }
    for (name, player) in &state.dead_players_chat {
        players.insert(name.clone(), player_view(player, None, true));
    }

    let loot: Vec<Value> = state
        .loot
        .iter()
        .map(|(&c, info)| {
            let mut obj = xy(c);
            obj.insert("amount".into(), coins(info.amount));
            obj.insert("blockRange".into(), json!([info.first_block, info.last_block]));
            Value::Object(obj)
        })
        .collect();
    let hearts: Vec<Value> = state.hearts.iter().map(|&c| Value::Object(xy(c))).collect();

    let mut crown = xy(state.crown_pos);
    if !state.crown_holder.player.is_empty() {
        crown.insert("holderName".into(), json!(state.crown_holder.player));
        crown.insert("holderIndex".into(), json!(state.crown_holder.index));
    }

    json!({
        "players": players,
        "loot": loot,
        "hearts": hearts,
        "crown": crown,
        "gameFund": coins(state.game_fund),
        "height": state.height,
        "disasterHeight": state.disaster_height,
        "hashBlock": state.hash_block.to_hex(),
    })
}
