//! The step pipeline.
//!
//! [`GameEngine::step`] is the authoritative state transition: it clones the
//! previous [`GameState`], runs every pass over the copy and returns the new
//! state with its [`StepResult`]. A batch containing an inapplicable move is
//! rejected as a whole and produces nothing.
//!
//! Pass order:
//!
//! 1. census and per-tile caches, DAO round
//! 2. destruct orders, spawn-area kills, ranged kills, poison, finalisation
//! 3. waypoint updates
//! 4. melee flags, then merchants and AI for every character (AI generator)
//! 5. hitscan, NPC payments, refunds
//! 6. crown tracking, banking
//! 7. with a real block hash only (world generator): disaster, spawns,
//!    common fields, treasure, loot division, hearts, crown
pub mod ai;
pub mod census;
pub mod combat;
pub mod context;
pub mod dao;
mod errors;
pub mod kills;
pub mod merchants;
pub mod mutators;
pub mod result;
pub mod rules;

pub use context::StepContext;
pub use errors::{InvariantViolation, StepError};
pub use result::{CollectedBounty, KilledBy, StepResult};

use tracing::{debug, warn};

use crate::config::GameConfig;
use crate::env::{StepRng, World};
use crate::error::GameError;
use crate::moves::Move;
use crate::report::StatsReport;
use crate::state::{BlockHash, CharacterId, GameState};

use self::context::MAX_HUNTER_MESSAGES;

/// Everything a block contributes to a step.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StepData {
    /// Coins minted onto the harvest areas (crown bonus included).
    pub treasure: i64,
    /// Hash of the block being applied; zero when only the tax is wanted.
    pub new_hash: BlockHash,
    pub moves: Vec<Move>,
}

/// A step together with the stats snapshot taken after the payment passes.
#[derive(Clone, Debug)]
pub struct StepOutcome {
    pub state: GameState,
    pub result: StepResult,
    pub stats: StatsReport,
}

/// Deterministic step function over a fixed world.
#[derive(Clone, Debug)]
pub struct GameEngine<'w> {
    world: &'w World,
    config: GameConfig,
}

impl<'w> GameEngine<'w> {
    pub fn new(world: &'w World, config: GameConfig) -> Self {
        Self { world, config }
    }

    pub fn world(&self) -> &'w World {
        self.world
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Applies one block to `prev`.
    pub fn step(
        &self,
        prev: &GameState,
        data: &StepData,
    ) -> Result<(GameState, StepResult), StepError> {
        let (state, result, _) = self.run(prev, data, false)?;
        Ok((state, result))
    }

    /// Like [`step`](Self::step), also returning the stats snapshot.
    pub fn step_with_summary(
        &self,
        prev: &GameState,
        data: &StepData,
    ) -> Result<StepOutcome, StepError> {
        let (state, result, stats) = self.run(prev, data, true)?;
        Ok(StepOutcome {
            state,
            result,
            stats: stats.unwrap_or_default(),
        })
    }

    fn run(
        &self,
        prev: &GameState,
        data: &StepData,
        with_stats: bool,
    ) -> Result<(GameState, StepResult, Option<StatsReport>), StepError> {
        let height = prev.height + 1;
        // moves act in player-name order, whatever order the block lists them in
        let mut moves: Vec<&Move> = data.moves.iter().collect();
        moves.sort_by(|a, b| a.player.cmp(&b.player));
        if let Some(pair) = moves.windows(2).find(|w| w[0].player == w[1].player) {
            warn!(player = %pair[0].player, height, "batch rejected");
            return Err(StepError::DuplicateMove {
                player: pair[0].player.clone(),
                height,
            });
        }
        if let Some(bad) = moves.iter().find(|m| !m.is_valid(prev)) {
            warn!(player = %bad.player, height, "batch rejected");
            return Err(StepError::InvalidMove {
                player: bad.player.clone(),
                height,
            });
        }

        let mut out = prev.clone();
        out.height = height;
        out.hash_block = data.new_hash;
        out.dead_players_chat.clear();
        let mut result = StepResult::new();

        if height > self.config.max_height {
            warn!(height, limit = self.config.max_height, "height limit reached");
            return Err(StepError::HeightLimit {
                height,
                limit: self.config.max_height,
            });
        }

        let world = self.world;
        let forks = self.config.forks;
        let mut ctx = StepContext::new(height, &self.config);

        census::run(&mut out, world, &mut ctx);
        debug!(
            height,
            population = ctx.census.total,
            monsters = ctx.census.monsters,
            devmode = ctx.devmode,
            "pass 0 done"
        );
        dao::run(&mut out, &mut ctx);
        debug!(height, bounty = ctx.bounty.available, payments = ctx.payments.len(), "pass 1 done");

        queue_destruct(prev, &moves, &mut ctx);
        kills::kill_spawn_area(&mut out, &forks, &mut result);
        kills::kill_ranged_attacks(&mut out, &mut ctx, &mut result);
        kills::decrement_life(&mut out, &mut result);
        kills::finalise_kills(&mut out, &forks, &mut result);
        debug!(height, killed = result.killed_players().len(), "kills finalised");

        for mv in moves.iter().filter(|m| !m.is_spawn()) {
            mv.apply_waypoints(&mut out);
        }

        let mut ai_rng = StepRng::new(&prev.hash_block);
        combat::melee(&mut out, &mut ctx);
        self.move_characters(&mut out, &mut ctx, &mut ai_rng);

        combat::hitscan_and_payments(&mut out, world, &mut ctx);
        combat::refund_payments(&mut out, &mut ctx);
        debug!(height, "passes 2 to 4 done");

        let stats = with_stats
            .then(|| StatsReport::collect(&out, world, &ctx, self.config.network));

        let respawn_crown = out.update_crown_state();
        mutators::bank_loot(&mut out, &mut result);
        debug!(height, tax = result.tax_amount, banked = result.bounties.len(), "banking done");

        // Miners step with a zero hash to learn the tax before the block exists.
        if out.hash_block.is_zero() {
            return Ok((out, result, stats));
        }

        let mut rng = StepRng::new(&out.hash_block);
        // first draw of the world generator, so a disaster is cheap to verify
        if mutators::disaster_due(&mut rng) {
            mutators::apply_disaster(&mut out, &forks, &mut rng);
        }

        for mv in moves.iter().filter(|m| m.is_spawn()) {
            mv.apply_spawn(&mut out, &forks, &mut rng);
        }
        for mv in &moves {
            mv.apply_common(&mut out);
        }
        // a bounty collected by a player who changed the address in the
        // same block goes to the new address
        for bounty in result.bounties.iter_mut() {
            bounty.update_address(&out);
        }
        for (name, chat) in out.dead_players_chat.iter_mut() {
            if let Some(old) = prev.players.get(name) {
                chat.color = old.color;
            }
        }

        let crown_bonus = mutators::drop_treasure(&mut out, world, &mut rng, data.treasure);
        out.divide_loot_among_players(|_, _| None);
        out.crown_bonus(crown_bonus, None);

        if ctx.census.hearts_spawn {
            mutators::drop_heart(&mut out, world, &mut rng);
        }
        mutators::collect_hearts(&mut out, &mut rng);
        mutators::collect_crown(&mut out, world, &mut rng, respawn_crown);
        debug!(
            height,
            players = out.players.len(),
            hearts = out.hearts.len(),
            fund = out.game_fund,
            "step done"
        );

        Ok((out, result, stats))
    }

    /// Pass 2 proper: every character trades with a merchant it stands on,
    /// then decides and takes its move.
    fn move_characters(&self, out: &mut GameState, ctx: &mut StepContext, rng: &mut StepRng) {
        let height = out.height;
        for (name, player) in out.players.iter_mut() {
            let color = player.color;
            for (&index, ch) in player.characters.iter_mut() {
                if ch.spawn_block == 0 {
                    ch.spawn_block = height - 1;
                    ch.rations = 10;
                }

                let turn = merchants::visit(ch, color, self.world, ctx)
                    .and_then(|()| ai::run(ch, color, self.world, ctx, rng));
                if let Err(err) = turn {
                    warn!(
                        player = %name,
                        index,
                        code = err.error_code(),
                        severity = err.severity().as_str(),
                        %err,
                        "character turn reverted"
                    );
                }
            }
        }
    }
}

/// Destruct orders name characters of the previous state; the list is capped.
fn queue_destruct(prev: &GameState, moves: &[&Move], ctx: &mut StepContext) {
    for mv in moves.iter().filter(|m| !m.destruct.is_empty()) {
        let Some(player) = prev.players.get(&mv.player) else {
            continue;
        };
        for &index in &mv.destruct {
            if !player.characters.contains_key(&index) {
                continue;
            }
            if ctx.destruct.len() < MAX_HUNTER_MESSAGES - 1 {
                ctx.destruct.insert(CharacterId::new(mv.player.clone(), index));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Coord, PlayerState};
    use crate::testing::open_world;

    fn engine() -> GameEngine<'static> {
        GameEngine::new(open_world(), GameConfig::new())
    }

    fn data(moves: Vec<Move>) -> StepData {
        StepData {
            treasure: 0,
            new_hash: BlockHash::from_bytes([3; 32]),
            moves,
        }
    }

    fn spawn(player: &str, color: u8) -> Move {
        Move::parse(player, &format!(r#"{{"color": {color}}}"#))
            .unwrap()
            .with_coin_amount(GameConfig::COIN)
    }

    #[test]
    fn genesis_spawns_three_characters_per_player() {
        let (state, result) = engine()
            .step(&GameState::new(), &data(vec![spawn("alice", 1)]))
            .unwrap();
        assert_eq!(state.height, 0);
        let alice = &state.players["alice"];
        assert_eq!(alice.color, 1);
        assert_eq!(alice.characters.len(), 3);
        assert_eq!(alice.coin_amount, GameConfig::COIN);
        assert!(result.killed_players().is_empty());

        // colour 1 owns the top-right corner and faces away from its edge
        let right = GameConfig::MAP_WIDTH - 1;
        let len = GameConfig::SPAWN_AREA_LENGTH;
        for ch in alice.characters.values() {
            let Coord { x, y } = ch.coord;
            let on_top = y == 0 && x >= right + 1 - len;
            let on_side = x == right && y < len;
            assert!(on_top || on_side, "{} is outside the corner strip", ch.coord);
            let facing = match (x == right, y == 0) {
                (true, true) => 1,
                (true, false) => 4,
                _ => 2,
            };
            assert_eq!(ch.dir, facing, "facing at {}", ch.coord);
            assert!(ch.waypoints.is_empty());
        }
    }

    #[test]
    fn respawning_an_existing_name_rejects_the_batch() {
        let (state, _) = engine()
            .step(&GameState::new(), &data(vec![spawn("alice", 1)]))
            .unwrap();
        let err = engine()
            .step(&state, &data(vec![spawn("bob", 0), spawn("alice", 2)]))
            .unwrap_err();
        assert_eq!(
            err,
            StepError::InvalidMove {
                player: "alice".into(),
                height: 1
            }
        );
    }

    #[test]
    fn two_moves_of_one_player_reject_the_batch() {
        let twice = data(vec![spawn("dave", 0), spawn("dave", 1)]);
        assert_eq!(
            engine().step(&GameState::new(), &twice).unwrap_err().error_code(),
            "STEP_DUPLICATE_MOVE"
        );
    }

    #[test]
    fn zero_hash_stops_after_banking() {
        let mut prev = GameState::new();
        prev.height = 10;
        let mut data = data(vec![spawn("carol", 0)]);
        data.new_hash = BlockHash::ZERO;
        data.treasure = 900;

        let (state, _) = engine().step(&prev, &data).unwrap();
        assert!(state.players.is_empty());
        assert!(state.loot.is_empty());
    }

    #[test]
    fn height_limit_is_enforced() {
        let mut prev = GameState::new();
        prev.height = GameConfig::DEFAULT_MAX_HEIGHT;
        assert!(matches!(
            engine().step(&prev, &data(Vec::new())),
            Err(StepError::HeightLimit { .. })
        ));
    }

    #[test]
    fn treasure_lands_on_the_harvest_areas() {
        let mut data = data(Vec::new());
        data.treasure = 900;
        let (state, _) = engine().step(&GameState::new(), &data).unwrap();

        let dropped: i64 = state.loot.values().map(|l| l.amount).sum();
        assert_eq!(dropped, 875);
        assert_eq!(state.game_fund, 25);
        assert_eq!(state.loot.len(), GameConfig::NUM_HARVEST_AREAS);
    }

    #[test]
    fn dead_players_keep_their_last_words() {
        let mut prev = GameState::new();
        prev.height = 20;
        let mut ghost = PlayerState {
            color: 2,
            coin_amount: 0,
            remaining_life: 1,
            ..PlayerState::default()
        };
        ghost.characters.insert(0, crate::testing::character_at(Coord::new(150, 150)));
        prev.players.insert("ghost".into(), ghost);

        let last_words = Move::parse("ghost", r#"{"msg": "bye"}"#).unwrap();
        let (state, result) = engine().step(&prev, &data(vec![last_words])).unwrap();
        assert!(result.is_killed("ghost"));
        assert!(!state.players.contains_key("ghost"));
        let chat = &state.dead_players_chat["ghost"];
        assert_eq!((chat.message.as_str(), chat.color), ("bye", 2));
    }
}
