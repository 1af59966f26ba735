//! Per-character movement AI.
//!
//! A character's turn is a small behavior tree over the [`Agent`]
//! blackboard. The top-level selector runs the stages in priority order and
//! stops at the first one that settles the turn:
//!
//! 1. bookkeeping (anti-kiting, base perimeter)
//! 2. upkeep, which may starve the character back to its spawn corner
//! 3. ranged attack (never settles the turn)
//! 4. learning from player waypoints
//! 5. the autonomous planner, when no waypoints are left
//! 6. straight-line walking along the waypoints
//!
//! Every draw from the step RNG happens in the same order as the stage
//! list and the scans inside it; that order is part of consensus.

mod longpath;
mod scan;
pub mod tree;

use arrayvec::ArrayVec;
use tracing::{debug, trace};

use crate::config::GameConfig;
use crate::env::{PoiKind, StepRng, World, is_base_perimeter, is_safezone};
use crate::error::ErrorContext;
use crate::state::{
    AiMode, AiOrders, AiStatus, Armor, CharacterState, Coord, Role, Trinket, Weapon, direction,
};

use self::tree::{Behavior, Node, Selector, Status};
use super::context::StepContext;
use super::errors::InvariantViolation;
use super::kills::fav;
use super::rules::{SPELL_RANGE_MAX, combat_clevel, score_from_clevel};

const COIN: i64 = GameConfig::COIN;
const TEAMS: usize = GameConfig::NUM_TEAM_COLORS;
const NUM_POI: usize = GameConfig::NUM_POI;

/// Equally good steps kept for the random tie-break.
const MAX_CHOICES: usize = 10;
/// A path ending this close to a POI commits the character to it.
const LEARN_RADIUS: i32 = 12;

/// One-letter codes stored in [`CharacterState::reason`] (and, for the
/// retreat codes, in [`CharacterState::retreat`]).
pub mod reason {
    pub const SHOP: u8 = b'S';
    pub const ENGAGE: u8 = b'E';
    pub const SHINY: u8 = b'c';
    pub const PANIC: u8 = b'P';
    pub const RUN: u8 = b'r';
    pub const GAME_OVER: u8 = b'-';
    pub const NPC_IN_WAY: u8 = b'*';
    pub const LONG_PATH: u8 = b'l';
    pub const MONSTER_HARVEST: u8 = b'm';
    pub const MONSTER_PROWL: u8 = b'p';
    pub const RETREAT_BARELY: u8 = b'2';
    pub const RETREAT_OK: u8 = b'1';
    pub const RETREAT_GOOD: u8 = b'0';
    pub const RETREAT_ERROR: u8 = b'!';
    pub const VISIT_CENTER: u8 = b'T';
    pub const TO_OUTER_POI: u8 = b'h';
    pub const SEARCH_FAV_INNER_POI: u8 = b'i';
    pub const TO_INNER_POI: u8 = b'I';
    pub const ALL_BLOCKED: u8 = b'A';
    pub const ALREADY_AT_POI: u8 = b'a';
    pub const RUN_CORNERED: u8 = b'R';
    pub const BORED: u8 = b'b';
}

/// Blackboard of one character's turn.
struct Agent<'a> {
    ch: &'a mut CharacterState,
    color: usize,
    world: &'a World,
    ctx: &'a mut StepContext,
    rng: &'a mut StepRng,
    /// Height of the state being produced.
    h: i32,

    clevel: i32,
    /// Spell range after armor penalties.
    base_range: i32,
    myscore: i32,
    /// Retreating; ignores loot and does not take teleporters.
    on_the_run: bool,

    /// A destination tile for this step has been chosen.
    success: bool,
    target: Coord,
    moves: ArrayVec<Coord, MAX_CHOICES>,

    /// 0 when calm, 1 when outnumbered, `1 + n` when outclassed by `n` levels.
    panic: i32,
    panic_foelevel: i32,
    panic_at: Coord,
    panic_dist: i32,

    fault: Option<InvariantViolation>,
}

impl<'a> Agent<'a> {
    fn new(
        ch: &'a mut CharacterState,
        color: usize,
        world: &'a World,
        ctx: &'a mut StepContext,
        rng: &'a mut StepRng,
    ) -> Self {
        let clevel = combat_clevel(ch);
        let mut base_range = clevel;
        if ch.armor != Armor::None {
            base_range -= match ch.armor {
                Armor::Ring | Armor::Chain => 1,
                Armor::Splint | Armor::Plate => 2,
                Armor::None => 0,
            };
            base_range = base_range.max(1);
        }
        let coord = ch.coord;
        Self {
            h: ctx.height,
            clevel,
            base_range: base_range.min(SPELL_RANGE_MAX),
            myscore: score_from_clevel(clevel),
            on_the_run: false,
            success: false,
            target: coord,
            moves: ArrayVec::new(),
            panic: 0,
            panic_foelevel: 0,
            panic_at: coord,
            panic_dist: 0,
            fault: None,
            ch,
            color,
            world,
            ctx,
            rng,
        }
    }
}

impl Agent<'_> {
    #[inline]
    fn fav(&self) -> usize {
        usize::from(self.ch.fav_harvest_poi)
    }

    #[inline]
    fn kind(&self, k: usize) -> PoiKind {
        self.world.pois().kind(k)
    }

    fn is_harvest(&self, k: usize) -> bool {
        k < NUM_POI && self.kind(k).is_harvest()
    }

    fn set_farm_outer(&mut self, on: bool) {
        self.ch.mode.set(AiMode::FARM_OUTER_RING, on);
    }

    fn blocks_since_apocalypse(&self) -> i32 {
        self.ctx.intervals.blocks_since_apocalypse(self.h)
    }

    fn age(&self) -> i32 {
        self.h - self.ch.spawn_block
    }

    /// Ends the turn on `at`. Teleports are flagged for hitscan.
    fn settle(&mut self, at: Coord, teleport: bool) -> Status {
        self.ch.coord = at;
        self.ch.idle_time = 0;
        self.ch.from = at;
        if teleport {
            self.ch.status |= AiStatus::NORMAL_TP;
        }
        Status::Success
    }

    /// Random tie-break among the collected steps; the RNG is only drawn
    /// when there is a real choice.
    fn pick_move(&mut self) {
        if self.moves.len() > 1 {
            let idx = self.rng.next(self.moves.len() as i32) as usize;
            if let Some(&c) = self.moves.get(idx) {
                self.target = c;
            }
        }
    }

    /// Starts a fresh list of equally good steps.
    fn first_choice(&mut self, c: Coord) {
        self.success = true;
        self.target = c;
        self.moves.clear();
        self.moves.push(c);
    }

    fn add_choice(&mut self, c: Coord) {
        if self.moves.len() < MAX_CHOICES {
            self.moves.push(c);
        }
    }

    /// Autonomous hunters that lack a weapon or an amulet head for the shops.
    fn wants_to_visit_center(&self) -> bool {
        self.ch.mode.contains(AiMode::AUTO_MODE)
            && self.ch.role == Role::PLAYER
            && !self.on_the_run
            && (self.ch.weapon == Weapon::None || self.ch.amulet == Trinket::None)
            && self.ch.loot.amount() > 120 * COIN
            && self.ctx.census.missing_merchant_count == 0
    }

    fn can_recall(&self) -> bool {
        self.ch.amulet == Trinket::WordOfRecall || self.ch.ring == Trinket::WordOfRecall
    }

    fn fail(&mut self, fault: InvariantViolation) -> Status {
        self.fault = Some(fault);
        Status::Success
    }

    fn context(&self) -> ErrorContext {
        ErrorContext::new(self.h).with_coord(self.ch.coord)
    }
}

/// Second half of a character's turn: decides where it goes and moves it
/// at most one tile (or teleports it).
///
/// An [`InvariantViolation`] leaves the character on its tile with `from`
/// reset; the caller logs it and continues with the next character.
pub fn run(
    ch: &mut CharacterState,
    color: u8,
    world: &World,
    ctx: &mut StepContext,
    rng: &mut StepRng,
) -> Result<(), InvariantViolation> {
    let color = usize::from(color);
    if color >= TEAMS || !ch.coord.is_inside_map() {
        ch.from = ch.coord;
        return Err(InvariantViolation::BadPosition {
            color,
            context: ErrorContext::new(ctx.height).with_coord(ch.coord),
        });
    }

    let mut agent = Agent::new(ch, color, world, ctx, rng);
    let stages: [Node<Agent<'_>>; 6] = [
        |a| prepare(a),
        |a| upkeep(a),
        |a| scan::ranged_attack(a),
        |a| learn_from_waypoints(a),
        |a| autonomous(a),
        |a| walk_waypoints(a),
    ];
    Selector::new(&stages).tick(&mut agent);

    if let Some(fault) = agent.fault.take() {
        agent.ch.from = agent.ch.coord;
        return Err(fault);
    }
    if agent.ch.reason != 0 {
        trace!(
            reason = %char::from(agent.ch.reason),
            coord = %agent.ch.coord,
            role = %agent.ch.role,
            "ai decision"
        );
    }
    Ok(())
}

// ============================================================================
// Top-level stages
// ============================================================================

fn prepare(a: &mut Agent<'_>) -> Status {
    use reason::{RETREAT_BARELY, RETREAT_GOOD, RETREAT_OK};

    // anti kiting: a retreat lasts about twenty blocks
    if matches!(a.ch.retreat, RETREAT_BARELY | RETREAT_OK | RETREAT_GOOD) {
        if a.rng.next(20) == 0 {
            a.ch.retreat = 0;
            if a.ch.orders.contains(AiOrders::DUTY) && a.ch.duty_harvest_poi > 0 {
                a.ch.fav_harvest_poi = a.ch.duty_harvest_poi;
            }
            if !a.ch.orders.contains(AiOrders::FANATISM) {
                a.ch.duty_harvest_poi = 0;
            }
        } else {
            a.on_the_run = true;
        }
    }

    a.ch.reason = 0;

    // Perimeter tiles of a foreign base are still safezone, so this only
    // matters where the safezone does not protect.
    for k in 0..TEAMS as u8 {
        if usize::from(k) != a.color && is_base_perimeter(k, a.ch.coord) {
            a.ch.status |= AiStatus::DEATH_DEATH;
        }
    }
    Status::Failure
}

/// Rations are eaten once per apocalypse interval, counted from spawning.
fn upkeep(a: &mut Agent<'_>) -> Status {
    if a.ch.role.is_merchant() || a.ch.spawn_block <= 0 {
        return Status::Failure;
    }
    if a.age() % a.ctx.intervals.apocalypse != 0 {
        return Status::Failure;
    }

    a.ch.rations -= 1;
    let price = a.ctx.intervals.ration_price;
    if a.ch.rations >= 0 {
        a.ch.survival_points += 1;
    } else if a.ch.loot.amount() >= price {
        if a.ctx.merchants.exists(Role::RATIONS_TEST) {
            a.ch.loot.loot.amount -= price;
            a.ctx.merchants.sats_received[Role::RATIONS_TEST.index()] += price;
        }
        a.ch.rations = 0;
        a.ch.survival_points += 1;
    } else {
        let (w, h) = (GameConfig::MAP_WIDTH, GameConfig::MAP_HEIGHT);
        let corner = Coord::new(
            if a.color == 1 || a.color == 2 { w - 1 } else { 0 },
            if a.color >= 2 { h - 1 } else { 0 },
        );
        a.ch.stay_in_spawn_area = GameConfig::MAX_STAY_IN_SPAWN_AREA;
        debug!(coord = %a.ch.coord, "starving, sent to the spawn corner");
        return a.settle(corner, true);
    }
    Status::Failure
}

/// Player waypoints: remember the POI the path ends at and decide whether
/// the character may walk manually at all.
fn learn_from_waypoints(a: &mut Agent<'_>) -> Status {
    if a.ch.waypoints.is_empty() {
        return Status::Failure;
    }
    a.ch.idle_time = 0;

    let devmode = a.ctx.devmode;
    if devmode == 5 || devmode == 3 {
        return Status::Failure;
    }

    if a.ch.role.is_monster() || a.ch.role.is_merchant() {
        a.ch.stop_moving();
    } else if !a.ch.mode.contains(AiMode::MANUAL_MODE) {
        // orders to a harvest area are irrevocable
        let queued = usize::from(a.ch.queued_harvest_poi);
        if queued < NUM_POI && !a.kind(queued).is_harvest() {
            let destination = a.ch.waypoints.first().copied().unwrap_or(a.ch.coord);
            let nearby = (0..NUM_POI).find(|&k| {
                let kind = a.kind(k);
                let target_kind = kind.is_harvest() || kind == PoiKind::BASE || kind == PoiKind::CENTER;
                target_kind && a.world.poi_distance(k, destination) <= LEARN_RADIUS
            });
            if let Some(k) = nearby {
                let kind = a.kind(k);
                a.set_farm_outer(kind == PoiKind::HARVEST2 || kind == PoiKind::BASE);
                a.ch.queued_harvest_poi = k as u8;
                a.ch.order_time = a.h;
            }
        }

        a.ch.mode.insert(AiMode::MANUAL_MODE);
        a.ch.mode.remove(AiMode::AUTO_MODE);

        let fav = a.fav();
        if is_safezone(a.ch.coord) && fav < NUM_POI && !a.kind(fav).is_harvest() {
            a.ch.fav_harvest_poi = fav::STAY_HERE;
        }
    }

    // manual movement only inside safezones and not once bound for battle
    if !is_safezone(a.ch.coord) || a.is_harvest(a.fav()) {
        a.ch.stop_moving();
    } else if a.blocks_since_apocalypse() == 0
        && a.is_harvest(usize::from(a.ch.queued_harvest_poi))
    {
        a.ch.stop_moving();
    }
    Status::Failure
}

fn autonomous(a: &mut Agent<'_>) -> Status {
    if !a.ch.waypoints.is_empty() {
        return Status::Failure;
    }
    if a.ctx.devmode == 3 {
        a.ch.from = a.ch.coord;
        return Status::Success;
    }
    a.ch.mode.remove(AiMode::MANUAL_MODE);

    let turn_over: [Node<Agent<'_>>; 4] = [
        |a| use_teleporter(a),
        |a| stay_at_counter(a),
        |a| apocalypse_orders(a),
        |a| scan::surroundings(a),
    ];
    if !Selector::new(&turn_over).tick(a).is_success() {
        let plans: [Node<Agent<'_>>; 3] = [
            |a| short_range_plan(a),
            |a| longpath::long_range(a),
            |a| longpath::disperse(a),
        ];
        Selector::new(&plans).tick(a);
        commit(a);
    }
    a.ch.from = a.ch.coord;
    Status::Success
}

fn walk_waypoints(a: &mut Agent<'_>) -> Status {
    a.ch.step_towards_waypoint(a.world, true);
    Status::Success
}

// ============================================================================
// Autonomous stages
// ============================================================================

fn use_teleporter(a: &mut Agent<'_>) -> Status {
    let own_base = 5 + a.color as u8;
    for k in crate::env::PoiTable::TELEPORTS {
        let Some(poi) = a.world.pois().get(k) else {
            continue;
        };
        if (poi.kind.0 <= 4 || poi.kind.0 == own_base) && a.ch.coord == poi.anchor {
            debug!(from = %poi.anchor, to = %poi.exit, "teleported");
            return a.settle(poi.exit, true);
        }
    }
    Status::Failure
}

/// Merchants never walk; they snap back to their counter.
fn stay_at_counter(a: &mut Agent<'_>) -> Status {
    if !a.ch.role.is_merchant() {
        return Status::Failure;
    }
    let home = a.world.merchants().base(a.ch.role).unwrap_or(a.ch.coord);
    a.settle(home, false)
}

/// At every apocalypse queued orders take effect, all at once.
fn apocalypse_orders(a: &mut Agent<'_>) -> Status {
    if a.blocks_since_apocalypse() != 0 {
        return Status::Failure;
    }

    let queued = a.ch.queued_harvest_poi;
    let mut too_late = false;
    if queued > 0 {
        a.ch.duty_harvest_poi = 0;
        // young orders only take effect with some probability
        let since = a.h - a.ch.order_time;
        let full = a.ctx.intervals.roger();
        if since < full && since < a.rng.next(full) {
            too_late = true;
        }
    }

    if queued == 0 && a.ch.role.is_monster() {
        a.ch.fav_harvest_poi = fav::CHOOSE_NEW;
    } else if queued == 0 && a.ch.mode.contains(AiMode::RESTING) {
        a.ch.status |= AiStatus::ESCAPE;
        a.ch.fav_harvest_poi = fav::STAY_HERE;
    } else if queued > 0 && usize::from(queued) < NUM_POI && !too_late {
        a.ch.fav_harvest_poi = queued;
        a.ch.queued_harvest_poi = 0;
        if a.ch.orders.contains(AiOrders::DUTY) {
            a.ch.duty_harvest_poi = queued;
        }

        let marked = usize::from(a.ch.marked_harvest_poi);
        if marked > 0 && marked < NUM_POI && a.ch.mode.contains(AiMode::MARK_RECALL) {
            let flag = a.ctx.areas.flag[marked];
            let ours_or_neutral = usize::from(flag) == a.color + 1 || flag == 7;
            if a.world.poi_distance(marked, a.ch.coord) > 20 && ours_or_neutral {
                let anchor = a.world.pois().anchor(marked);
                debug!(poi = marked, "recalled to marked area");
                return a.settle(anchor, true);
            }
        }
    }
    Status::Failure
}

fn short_range_plan(a: &mut Agent<'_>) -> Status {
    Status::from(a.success)
}

/// Takes the chosen step, or counts an idle block.
fn commit(a: &mut Agent<'_>) {
    if !a.success {
        if a.ch.idle_time < 99 {
            a.ch.idle_time += 1;
        }
        return;
    }

    a.ch.idle_time = 0;
    if !a.target.is_inside_map() {
        let context = a.context();
        a.fail(InvariantViolation::StepOffMap { context });
        return;
    }
    let dir = direction(a.ch.coord, a.target);
    if dir != 5 {
        a.ch.dir = dir;
        a.ch.mode |= AiMode::NORMAL_STEP;
    }
    a.ch.coord = a.target;
}
