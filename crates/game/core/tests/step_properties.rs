//! Property-based tests for the step function.
//!
//! Run with: cargo test -p hunt-core --test step_properties

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;

use std::collections::{BTreeMap, BTreeSet};

use hunt_core::env::StepRng;
use hunt_core::state::Waypoints;
use hunt_core::testing::open_world;
use hunt_core::{BlockHash, Coord, GameConfig, GameEngine, GameState, Move, StepData};

fn spawn(player: &str, color: u8) -> Move {
    Move::parse(player, &format!(r#"{{"color": {color}}}"#))
        .unwrap()
        .with_coin_amount(GameConfig::COIN)
}

fn names() -> impl Strategy<Value = Vec<(String, u8)>> {
    prop::collection::btree_map("[a-z]{3,8}", 0u8..4, 1..6)
        .prop_map(|m| m.into_iter().collect())
}

/// Waypoints in walking order, no point repeated right after itself.
fn path() -> impl Strategy<Value = Waypoints> {
    prop::collection::vec((0i32..GameConfig::MAP_WIDTH, 0i32..GameConfig::MAP_HEIGHT), 0..8)
        .prop_map(|points| {
            let mut walk: Vec<Coord> = points.into_iter().map(|(x, y)| Coord::new(x, y)).collect();
            walk.dedup();
            walk.into_iter().rev().collect()
        })
}

/// Moves as the parser produces them: a spawn or per-character orders,
/// either one with text fields.
fn any_move() -> impl Strategy<Value = Move> {
    let text = || prop::option::of("[ -~]{0,12}");
    let orders = prop::collection::btree_map(0i32..6, prop::option::of(path()), 0..4);
    (
        "[a-z][a-z0-9_]{0,9}",
        text(),
        text(),
        text(),
        prop::option::of(0u8..4),
        orders,
    )
        .prop_map(|(player, message, msg_vote, msg_comment, color, orders)| {
            let mut waypoints = BTreeMap::new();
            let mut destruct = BTreeSet::new();
            if color.is_none() {
                for (index, order) in orders {
                    match order {
                        Some(wp) => {
                            waypoints.insert(index, wp);
                        }
                        None => {
                            destruct.insert(index);
                        }
                    }
                }
            }
            Move {
                player,
                message,
                msg_vote,
                msg_comment,
                color,
                waypoints,
                destruct,
                coin_amount: -1,
                ..Move::default()
            }
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Encoding a move and parsing it again gives back the same move.
    #[test]
    fn prop_move_wire_round_trip(mv in any_move()) {
        let wire = mv.to_json().to_string();
        let back = Move::parse(&mv.player, &wire).unwrap();
        prop_assert_eq!(back, mv);
    }

    /// Draws always fall inside the requested range.
    #[test]
    fn prop_rng_stays_in_range(seed in any::<[u8; 32]>(), a in -50i32..50, span in 0i32..500) {
        let mut rng = StepRng::new(&BlockHash::from_bytes(seed));
        for _ in 0..64 {
            let v = rng.next(span + 1);
            prop_assert!((0..=span).contains(&v));
            let r = rng.range(a, a + span);
            prop_assert!(r >= a && r <= a + span);
        }
    }

    /// The same seed yields the same stream.
    #[test]
    fn prop_rng_is_deterministic(seed in any::<[u8; 32]>()) {
        let hash = BlockHash::from_bytes(seed);
        let mut a = StepRng::new(&hash);
        let mut b = StepRng::new(&hash);
        for m in 1..200 {
            prop_assert_eq!(a.next(m), b.next(m));
        }
    }

    /// Treasure that splits evenly is neither lost nor minted.
    #[test]
    fn prop_treasure_is_conserved(k in 1i64..10_000, seed in any::<[u8; 32]>()) {
        prop_assume!(seed != [0; 32]);
        let engine = GameEngine::new(open_world(), GameConfig::new());
        let data = StepData {
            treasure: k * GameConfig::TOTAL_HARVEST,
            new_hash: BlockHash::from_bytes(seed),
            moves: Vec::new(),
        };
        let (state, _) = engine.step(&GameState::new(), &data).unwrap();
        prop_assert_eq!(state.coins_on_map() + state.game_fund, data.treasure);
    }

    /// The order in which a block lists its moves does not matter.
    #[test]
    fn prop_move_order_is_irrelevant(players in names(), seed in any::<[u8; 32]>()) {
        prop_assume!(seed != [0; 32]);
        let engine = GameEngine::new(open_world(), GameConfig::new());
        let moves: Vec<Move> = players.iter().map(|(n, c)| spawn(n, *c)).collect();
        let mut reversed = moves.clone();
        reversed.reverse();

        let hash = BlockHash::from_bytes(seed);
        let forward = StepData { treasure: 0, new_hash: hash, moves };
        let backward = StepData { treasure: 0, new_hash: hash, moves: reversed };

        let (a, _) = engine.step(&GameState::new(), &forward).unwrap();
        let (b, _) = engine.step(&GameState::new(), &backward).unwrap();
        prop_assert_eq!(a, b);
    }
}

#[test]
fn a_second_block_moves_the_spawned_characters() {
    let engine = GameEngine::new(open_world(), GameConfig::new());
    let genesis = StepData {
        treasure: 0,
        new_hash: BlockHash::from_bytes([9; 32]),
        moves: vec![spawn("walker", 0)],
    };
    let (state, _) = engine.step(&GameState::new(), &genesis).unwrap();
    let before = state.players["walker"].characters[&0].coord;

    let go = Move::parse("walker", r#"{"0": {"wp": [30, 30]}}"#).unwrap();
    let next = StepData {
        treasure: 0,
        new_hash: BlockHash::from_bytes([8; 32]),
        moves: vec![go],
    };
    let outcome = engine.step_with_summary(&state, &next).unwrap();
    let after = outcome.state.players["walker"].characters[&0].coord;
    assert_ne!(before, after);
    assert_eq!(outcome.stats.height, 1);
    assert_eq!(outcome.stats.accounts.len(), 1);
}
