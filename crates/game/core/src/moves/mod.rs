//! Player moves: the strict JSON wire format and how a move touches the state.
//!
//! A move is either a spawn request (`{"color": n}`) or a set of per-character
//! instructions keyed by character index, optionally combined with message,
//! address and DAO fields. Parsing is strict: any member that is not consumed
//! rejects the move.
mod error;
mod json;
mod money;
mod names;

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value, json};

pub use error::MoveError;
pub use json::{Json, Members};
pub use money::{format_money, parse_money};
pub use names::{is_valid_address, is_valid_player_name};

use crate::config::{ForkSchedule, GameConfig};
use crate::env::StepRng;
use crate::state::{Coord, GameState, PlayerId, Waypoints};

/// One player's move in a block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Move {
    pub player: PlayerId,

    pub message: Option<String>,
    /// Reward address (empty: the name's own address).
    pub address: Option<String>,
    /// Admin address allowed to change the reward address.
    pub address_lock: Option<String>,

    pub addr_token: Option<String>,
    pub msg_vote: Option<String>,
    pub msg_request: Option<String>,
    pub msg_fee: Option<String>,
    pub msg_comment: Option<String>,

    /// Team colour of a spawn request.
    pub color: Option<u8>,
    /// New waypoints per character index, last point first.
    pub waypoints: BTreeMap<i32, Waypoints>,
    pub destruct: BTreeSet<i32>,

    /// Coins locked by the name transaction, backing the general.
    pub coin_amount: i64,
}

/// Takes an optional string member.
fn take_string(obj: &mut Members, field: &'static str) -> Result<Option<String>, MoveError> {
    match obj.take(field) {
        None => Ok(None),
        Some(Json::Str(s)) => Ok(Some(s)),
        Some(_) => Err(MoveError::FieldType { field }),
    }
}

/// Takes an optional address member; empty strings are allowed.
fn take_address(obj: &mut Members, field: &'static str) -> Result<Option<String>, MoveError> {
    let addr = take_string(obj, field)?;
    if let Some(a) = &addr {
        if !a.is_empty() && !is_valid_address(a) {
            return Err(MoveError::InvalidAddress { field });
        }
    }
    Ok(addr)
}

/// Character index keys are non-negative decimals without padding or sign.
fn parse_index(key: &str) -> Option<i32> {
    let i: i32 = key.parse().ok()?;
    (i >= 0 && i.to_string() == key).then_some(i)
}

/// Reads a `wp` array of interleaved coordinates into reversed waypoints.
fn parse_waypoints(index: i32, value: Json) -> Result<Waypoints, MoveError> {
    let bad = |reason: &'static str| MoveError::Waypoints { index, reason };
    let Json::Array(items) = value else {
        return Err(bad("not an array"));
    };
    if items.len() % 2 != 0 {
        return Err(bad("odd number of coordinates"));
    }
    if items.len() / 2 > GameConfig::MAX_WAYPOINTS {
        return Err(bad("too many waypoints"));
    }

    let mut points = Vec::with_capacity(items.len() / 2);
    for pair in items.chunks_exact(2) {
        let (Json::Int(x), Json::Int(y)) = (&pair[0], &pair[1]) else {
            return Err(bad("coordinate is not an integer"));
        };
        let (Ok(x), Ok(y)) = (i32::try_from(*x), i32::try_from(*y)) else {
            return Err(bad("coordinate outside the map"));
        };
        let c = Coord::new(x, y);
        if !c.is_inside_map() {
            return Err(bad("coordinate outside the map"));
        }
        if points.last() == Some(&c) {
            return Err(bad("duplicate consecutive waypoint"));
        }
        points.push(c);
    }
    Ok(points.into_iter().rev().collect())
}

impl Move {
    /// Parses the move `json` sent by `player`.
    pub fn parse(player: &str, json: &str) -> Result<Self, MoveError> {
        if !is_valid_player_name(player) {
            return Err(MoveError::InvalidName {
                player: player.to_string(),
            });
        }
        let value = Json::parse(json).map_err(|e| MoveError::Json(e.to_string()))?;
        let Json::Object(mut obj) = value else {
            return Err(MoveError::NotAnObject);
        };

        let mut mv = Move {
            player: player.to_string(),
            coin_amount: -1,
            ..Move::default()
        };
        mv.message = take_string(&mut obj, "msg")?;
        mv.address = take_address(&mut obj, "address")?;
        mv.address_lock = take_address(&mut obj, "addressLock")?;
        mv.addr_token = take_string(&mut obj, "addr_token")?;
        mv.msg_vote = take_string(&mut obj, "msg_vote")?;
        mv.msg_request = take_string(&mut obj, "msg_request")?;
        mv.msg_fee = take_string(&mut obj, "msg_fee")?;
        mv.msg_comment = take_string(&mut obj, "msg_comment")?;

        if let Some(color) = obj.take("color") {
            let Json::Int(color) = color else {
                return Err(MoveError::FieldType { field: "color" });
            };
            let color = u8::try_from(color)
                .ok()
                .filter(|&c| usize::from(c) < GameConfig::NUM_TEAM_COLORS)
                .ok_or(MoveError::InvalidColor { color })?;
            if !obj.is_empty() {
                return Err(MoveError::SpawnWithInstructions);
            }
            mv.color = Some(color);
            return Ok(mv);
        }

        let mut indices = BTreeSet::new();
        for (key, value) in obj.into_inner() {
            let index = parse_index(&key).ok_or_else(|| MoveError::UnknownField { key: key.clone() })?;
            if !indices.insert(index) {
                return Err(MoveError::DuplicateIndex { index });
            }
            let Json::Object(mut sub) = value else {
                return Err(MoveError::CharacterNotObject { index });
            };

            let waypoints = sub
                .take("wp")
                .map(|wp| parse_waypoints(index, wp))
                .transpose()?;
            let destruct = match sub.take("destruct") {
                None => false,
                Some(Json::Bool(b)) => b,
                Some(_) => return Err(MoveError::FieldType { field: "destruct" }),
            };

            if destruct {
                if waypoints.is_some() {
                    return Err(MoveError::DestructWithWaypoints { index });
                }
                mv.destruct.insert(index);
            } else if let Some(wp) = waypoints {
                mv.waypoints.insert(index, wp);
            }

            if let Some((key, _)) = sub.into_inner().into_iter().next() {
                return Err(MoveError::UnknownField { key });
            }
        }
        Ok(mv)
    }

    /// Writes the move back in its wire format, waypoints in walking order.
    /// The coin amount travels with the name transaction, not in the JSON.
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        let strings = [
            ("msg", &self.message),
            ("address", &self.address),
            ("addressLock", &self.address_lock),
            ("addr_token", &self.addr_token),
            ("msg_vote", &self.msg_vote),
            ("msg_request", &self.msg_request),
            ("msg_fee", &self.msg_fee),
            ("msg_comment", &self.msg_comment),
        ];
        for (key, value) in strings {
            if let Some(v) = value {
                obj.insert(key.into(), Value::from(v.as_str()));
            }
        }
        if let Some(color) = self.color {
            obj.insert("color".into(), json!(color));
        }
        for (index, wp) in &self.waypoints {
            let flat: Vec<i32> = wp.iter().rev().flat_map(|c| [c.x, c.y]).collect();
            obj.insert(index.to_string(), json!({ "wp": flat }));
        }
        for index in &self.destruct {
            obj.insert(index.to_string(), json!({ "destruct": true }));
        }
        Value::Object(obj)
    }

    /// Sets the coins locked by the name transaction.
    pub fn with_coin_amount(mut self, coins: i64) -> Self {
        self.coin_amount = coins;
        self
    }

    pub fn is_spawn(&self) -> bool {
        self.color.is_some()
    }

    /// A spawn needs a new name; anything else needs a living player.
    pub fn is_valid(&self, state: &GameState) -> bool {
        let exists = state.players.contains_key(&self.player);
        if self.is_spawn() { !exists } else { exists }
    }

    /// Admin address that must sign an address change, empty when anyone may.
    pub fn address_operation_permission<'a>(&self, state: &'a GameState) -> &'a str {
        if self.address.is_none() && self.address_lock.is_none() {
            return "";
        }
        state
            .players
            .get(&self.player)
            .map_or("", |p| p.address_lock.as_str())
    }

    /// Message, address and DAO fields. Messages of players that died this
    /// step are kept for the chat.
    pub fn apply_common(&self, state: &mut GameState) {
        let height = state.height;
        let Some(pl) = state.players.get_mut(&self.player) else {
            if let Some(message) = &self.message {
                let pl = state.dead_players_chat.entry(self.player.clone()).or_default();
                pl.message = message.clone();
                pl.message_block = height;
            }
            return;
        };

        if let Some(message) = &self.message {
            pl.message = message.clone();
            pl.message_block = height;
        }
        if let Some(address) = &self.address {
            pl.address = address.clone();
        }
        if let Some(lock) = &self.address_lock {
            pl.address_lock = lock.clone();
        }
        if let Some(token) = &self.addr_token {
            pl.addr_token = token.clone();
        }
        if let Some(vote) = &self.msg_vote {
            pl.msg_vote = vote.clone();
            pl.msg_vote_block = height;
        }
        if let Some(request) = &self.msg_request {
            pl.msg_request = request.clone();
            pl.msg_request_block = height;
        }
        if let Some(fee) = &self.msg_fee {
            pl.msg_fee = fee.clone();
        }
        if let Some(comment) = &self.msg_comment {
            pl.msg_comment = comment.clone();
        }
    }

    /// Creates the player with its initial characters.
    pub fn apply_spawn(&self, state: &mut GameState, forks: &ForkSchedule, rng: &mut StepRng) {
        let Some(color) = self.color else {
            return;
        };
        let count = state.num_initial_characters(forks);
        let pl = state.players.entry(self.player.clone()).or_default();
        if pl.next_character_index != 0 {
            return;
        }
        debug_assert!(pl.coin_amount == -1 && self.coin_amount >= 0);
        pl.color = color;
        pl.coin_amount = self.coin_amount;
        for _ in 0..count {
            pl.spawn_character(rng);
        }
    }

    /// Replaces waypoints. Changing the next waypoint restarts the leg from
    /// the current tile.
    pub fn apply_waypoints(&self, state: &mut GameState) {
        let Some(pl) = state.players.get_mut(&self.player) else {
            return;
        };
        for (index, wp) in &self.waypoints {
            let Some(ch) = pl.characters.get_mut(index) else {
                continue;
            };
            if ch.waypoints.is_empty() || wp.is_empty() || ch.waypoints.last() != wp.last() {
                ch.from = ch.coord;
            }
            ch.waypoints = wp.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{BlockHash, CharacterState, PlayerState};

    const ADDR: &str = "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa";

    #[test]
    fn spawn_request_takes_color_only() {
        let mv = Move::parse("alice", r#"{"color": 2}"#).unwrap();
        assert_eq!(mv.color, Some(2));
        assert!(mv.is_spawn());

        assert_eq!(
            Move::parse("alice", r#"{"color": 4}"#),
            Err(MoveError::InvalidColor { color: 4 })
        );
        // no wrap-around into a byte
        assert_eq!(
            Move::parse("alice", r#"{"color": 256}"#),
            Err(MoveError::InvalidColor { color: 256 })
        );
        assert_eq!(
            Move::parse("alice", r#"{"color": 1, "0": {}}"#),
            Err(MoveError::SpawnWithInstructions)
        );
        // messages may ride along with a spawn
        let mv = Move::parse("alice", r#"{"msg": "hi", "color": 0}"#).unwrap();
        assert_eq!(mv.message.as_deref(), Some("hi"));
    }

    #[test]
    fn waypoints_are_reversed_and_validated() {
        let mv = Move::parse("bob", r#"{"1": {"wp": [1, 2, 3, 4, 5, 6]}}"#).unwrap();
        let wp: Vec<_> = mv.waypoints[&1].iter().copied().collect();
        assert_eq!(wp, vec![Coord::new(5, 6), Coord::new(3, 4), Coord::new(1, 2)]);

        assert!(matches!(
            Move::parse("bob", r#"{"1": {"wp": [1, 2, 3]}}"#),
            Err(MoveError::Waypoints { index: 1, .. })
        ));
        assert!(matches!(
            Move::parse("bob", r#"{"1": {"wp": [1, 2, 1, 2]}}"#),
            Err(MoveError::Waypoints { .. })
        ));
        assert!(matches!(
            Move::parse("bob", r#"{"1": {"wp": [1, 502]}}"#),
            Err(MoveError::Waypoints { .. })
        ));
        assert!(matches!(
            Move::parse("bob", r#"{"1": {"wp": [1.0, 2]}}"#),
            Err(MoveError::Waypoints { .. })
        ));
        let long = (0..202).map(|i| i.to_string()).collect::<Vec<_>>().join(",");
        assert!(matches!(
            Move::parse("bob", &format!(r#"{{"0": {{"wp": [{long}]}}}}"#)),
            Err(MoveError::Waypoints { .. })
        ));
    }

    #[test]
    fn encoded_move_reads_back_the_same() {
        let text = format!(
            r#"{{"msg": "go", "address": "{ADDR}", "msg_fee": "0.5", "0": {{"wp": [1, 2, 3, 4]}}, "3": {{"destruct": true}}}}"#
        );
        let mv = Move::parse("eve", &text).unwrap();
        let wire = mv.to_json();
        assert_eq!(wire["0"]["wp"], json!([1, 2, 3, 4]));
        assert_eq!(wire["3"]["destruct"], true);
        assert!(wire.get("color").is_none());
        assert_eq!(Move::parse("eve", &wire.to_string()).unwrap(), mv);

        let spawn = Move::parse("eve", r#"{"color": 1}"#).unwrap();
        assert_eq!(Move::parse("eve", &spawn.to_json().to_string()).unwrap(), spawn);
    }

    #[test]
    fn strict_schema_rejects_leftovers_and_bad_keys() {
        assert_eq!(
            Move::parse("bob", r#"{"01": {}}"#),
            Err(MoveError::UnknownField { key: "01".into() })
        );
        assert_eq!(
            Move::parse("bob", r#"{"0": {"wp": [], "speed": 3}}"#),
            Err(MoveError::UnknownField { key: "speed".into() })
        );
        assert_eq!(
            Move::parse("bob", r#"{"2": {"destruct": true, "wp": []}}"#),
            Err(MoveError::DestructWithWaypoints { index: 2 })
        );
        assert_eq!(
            Move::parse("bob", r#"{"2": {}, "2": {"destruct": true}}"#),
            Err(MoveError::DuplicateIndex { index: 2 })
        );
        assert_eq!(
            Move::parse("bob", r#"{"msg": 5}"#),
            Err(MoveError::FieldType { field: "msg" })
        );
        assert_eq!(Move::parse("bob", "[1]"), Err(MoveError::NotAnObject));
        assert!(matches!(Move::parse("bad..name", "{}"), Err(MoveError::InvalidName { .. })));
    }

    #[test]
    fn addresses_must_check_out_or_be_empty() {
        let mv = Move::parse("carol", &format!(r#"{{"address": "{ADDR}", "addressLock": ""}}"#))
            .unwrap();
        assert_eq!(mv.address.as_deref(), Some(ADDR));
        assert_eq!(mv.address_lock.as_deref(), Some(""));
        assert_eq!(
            Move::parse("carol", r#"{"address": "1BogusAddress"}"#),
            Err(MoveError::InvalidAddress { field: "address" })
        );
    }

    #[test]
    fn address_changes_need_the_lock_holder() {
        let mut state = GameState::new();
        let mut pl = PlayerState::default();
        pl.address_lock = ADDR.into();
        state.players.insert("carol".into(), pl);

        let msg_only = Move::parse("carol", r#"{"msg": "x"}"#).unwrap();
        assert_eq!(msg_only.address_operation_permission(&state), "");
        let change = Move::parse("carol", r#"{"address": ""}"#).unwrap();
        assert_eq!(change.address_operation_permission(&state), ADDR);
        let stranger = Move::parse("dave", r#"{"address": ""}"#).unwrap();
        assert_eq!(stranger.address_operation_permission(&state), "");
    }

    #[test]
    fn common_fields_stamp_the_height() {
        let mut state = GameState::new();
        state.height = 42;
        state.players.insert("p".into(), PlayerState::default());
        let mv = Move::parse("p", r#"{"msg": "hello", "msg_vote": "3", "msg_request": "10", "msg_fee": "1"}"#)
            .unwrap();
        mv.apply_common(&mut state);
        let pl = &state.players["p"];
        assert_eq!((pl.message.as_str(), pl.message_block), ("hello", 42));
        assert_eq!((pl.msg_vote_block, pl.msg_request_block), (42, 42));
        assert_eq!(pl.msg_fee, "1");

        let ghost = Move::parse("gone", r#"{"msg": "bye"}"#).unwrap();
        ghost.apply_common(&mut state);
        assert_eq!(state.dead_players_chat["gone"].message, "bye");
    }

    #[test]
    fn spawn_creates_initial_characters_once() {
        let mut state = GameState::new();
        state.height = 10;
        let mut rng = StepRng::new(&BlockHash::from_bytes([1; 32]));
        let mv = Move::parse("new", r#"{"color": 3}"#).unwrap().with_coin_amount(5);
        assert!(mv.is_valid(&state));
        mv.apply_spawn(&mut state, &ForkSchedule::MAINNET, &mut rng);

        let pl = &state.players["new"];
        assert_eq!((pl.color, pl.coin_amount), (3, 5));
        assert_eq!(pl.characters.len(), 3);
        assert!(pl.characters.values().all(|c| c.coord.is_in_spawn_area()));
        assert!(!mv.is_valid(&state));
    }

    #[test]
    fn same_next_waypoint_keeps_the_leg_start() {
        let mut state = GameState::new();
        let mut pl = PlayerState::default();
        let mut ch = CharacterState {
            coord: Coord::new(10, 10),
            from: Coord::new(5, 5),
            ..CharacterState::default()
        };
        ch.waypoints.push(Coord::new(20, 20));
        ch.waypoints.push(Coord::new(15, 12));
        pl.characters.insert(0, ch);
        state.players.insert("p".into(), pl);

        let same = Move::parse("p", r#"{"0": {"wp": [15, 12, 25, 25]}}"#).unwrap();
        same.apply_waypoints(&mut state);
        let ch = &state.players["p"].characters[&0];
        assert_eq!(ch.from, Coord::new(5, 5));
        assert_eq!(ch.waypoints.first(), Some(&Coord::new(25, 25)));

        let other = Move::parse("p", r#"{"0": {"wp": [30, 30]}}"#).unwrap();
        other.apply_waypoints(&mut state);
        assert_eq!(state.players["p"].characters[&0].from, Coord::new(10, 10));
    }
}
