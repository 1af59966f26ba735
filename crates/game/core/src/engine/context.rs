//! Scratch tables rebuilt from scratch at the start of every step.
//!
//! [`StepContext`] is created by [`GameEngine::step`](super::GameEngine::step),
//! filled by the census pass and then read (and in a few places written) by
//! every later pass. Nothing in it outlives the step.

use std::collections::{BTreeSet, HashMap};

use crate::config::{ForkSchedule, GameConfig};
use crate::env::{Grid, LocalField, TeamGrid, World};
use crate::state::{CharacterId, Coord, PlayerId, Role, TileFlags};

use super::rules::Intervals;

const NUM_POI: usize = GameConfig::NUM_POI;
const NUM_MERCHANTS: usize = GameConfig::NUM_MERCHANTS;
const TEAMS: usize = GameConfig::NUM_TEAM_COLORS;
const CLEVELS: usize = super::rules::CLEVEL_MAX as usize;

/// Distance reported when no foe is known.
pub const DIST_INFINITE: i32 = 10_000;

/// Capacity of the per-step payment and destruct lists.
pub const MAX_HUNTER_MESSAGES: usize = 9_999;

/// Where the merchants stand this step and what they were paid.
#[derive(Clone, Debug)]
pub struct MerchantPresence {
    pub exists: [bool; NUM_MERCHANTS],
    pub pos: [Coord; NUM_MERCHANTS],
    pub last_sale: [i32; NUM_MERCHANTS],
    /// Coins paid to each merchant role during the step, credited in Pass 3.
    pub sats_received: [i64; NUM_MERCHANTS],
}

impl Default for MerchantPresence {
    fn default() -> Self {
        Self {
            exists: [false; NUM_MERCHANTS],
            pos: [Coord::ORIGIN; NUM_MERCHANTS],
            last_sale: [0; NUM_MERCHANTS],
            sats_received: [0; NUM_MERCHANTS],
        }
    }
}

impl MerchantPresence {
    #[inline]
    pub fn exists(&self, role: Role) -> bool {
        self.exists.get(role.index()).copied().unwrap_or(false)
    }

    /// The merchant `role` is open for business on `coord`: the tile is its
    /// home and it currently stands there.
    pub fn is_open_at(&self, world: &World, role: Role, coord: Coord) -> bool {
        world.merchants().base(role) == Some(coord)
            && self.exists(role)
            && self.pos.get(role.index()) == Some(&coord)
    }
}

/// Population counts and team balance.
#[derive(Clone, Debug)]
pub struct Census {
    /// Characters per role byte, inside the map only.
    pub population: [i32; Role::COUNT],
    pub total: i32,
    pub monsters: i32,
    pub less_monsters_than_players: bool,
    pub need_monsters_badly: bool,
    pub hearts_spawn: bool,
    pub berzerk: bool,
    /// Sum of combat scores per team.
    pub team_balance: [i32; TEAMS],
    pub strongest_team: usize,
    pub weakest_team: usize,
    /// First missing merchant role per team (`Role::PLAYER` when none).
    pub missing_merchant: [Role; TEAMS],
    pub missing_merchant_count: i32,
}

impl Default for Census {
    fn default() -> Self {
        Self {
            population: [0; Role::COUNT],
            total: 0,
            monsters: 0,
            less_monsters_than_players: false,
            need_monsters_badly: false,
            hearts_spawn: false,
            berzerk: false,
            team_balance: [0; TEAMS],
            strongest_team: 0,
            weakest_team: 0,
            missing_merchant: [Role::PLAYER; TEAMS],
            missing_merchant_count: 0,
        }
    }
}

impl Census {
    #[inline]
    pub fn count(&self, role: Role) -> i32 {
        self.population.get(role.index()).copied().unwrap_or(0)
    }

    /// Monster role with the fewest members (reaper, then spitter, then redhead on ties).
    pub fn rarest_monster(&self) -> Role {
        let mut role = Role::REAPER;
        if self.count(Role::SPITTER) < self.count(role) {
            role = Role::SPITTER;
        }
        if self.count(Role::REDHEAD) < self.count(role) {
            role = Role::REDHEAD;
        }
        role
    }
}

/// The richest monster of a team, which players can command.
#[derive(Clone, Debug)]
pub struct Champion {
    pub player: PlayerId,
    pub index: i32,
    pub coins: i64,
    /// Harvest area ordered at the champion merchant this step (0 = none).
    pub command: u8,
}

impl Default for Champion {
    fn default() -> Self {
        Self {
            player: PlayerId::new(),
            index: -1,
            coins: 0,
            command: 0,
        }
    }
}

/// Nearby-character counts per point of interest.
#[derive(Clone, Debug)]
pub struct AreaCensus {
    /// Characters per team within walking distance 20.
    pub num_near: [[i32; TEAMS]; NUM_POI],
    /// Closest character per team able to fight at each level.
    pub nearest: [[[i32; CLEVELS]; TEAMS]; NUM_POI],
    /// Flag shown over the area: team colour + 1, 6 contested, 7 neutral.
    pub flag: [u8; NUM_POI],
}

impl Default for AreaCensus {
    fn default() -> Self {
        Self {
            num_near: [[0; TEAMS]; NUM_POI],
            nearest: [[[DIST_INFINITE; CLEVELS]; TEAMS]; NUM_POI],
            flag: [7; NUM_POI],
        }
    }
}

impl AreaCensus {
    #[inline]
    pub fn near(&self, poi: usize, color: usize) -> i32 {
        self.num_near
            .get(poi)
            .and_then(|row| row.get(color))
            .copied()
            .unwrap_or(0)
    }

    /// Characters of every team other than `color` near `poi`.
    pub fn foes_near(&self, poi: usize, color: usize) -> i32 {
        (0..TEAMS).filter(|&k| k != color).map(|k| self.near(poi, k)).sum()
    }

    /// Distance of the closest foe of `color` at level `clevel` or above.
    pub fn nearest_foe(&self, poi: usize, color: usize, clevel: i32) -> i32 {
        let Some(per_team) = self.nearest.get(poi) else {
            return DIST_INFINITE;
        };
        let cl = (clevel.clamp(1, CLEVELS as i32) - 1) as usize;
        (0..TEAMS)
            .filter(|&k| k != color)
            .map(|k| per_team[k][cl])
            .min()
            .unwrap_or(DIST_INFINITE)
    }
}

/// The NPC that pays DAO bounties and what it pays this step.
#[derive(Clone, Debug, Default)]
pub struct BountyNpc {
    pub player: PlayerId,
    pub available: i64,
    /// Deducted from the NPC in the melee pass.
    pub paid: i64,
}

/// Weighted vote buckets of the running DAO round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VoteTally {
    pub total: i64,
    pub full: i64,
    pub part: i64,
    pub zero: i64,
    pub vote_part: i64,
    pub actual_bounty: i64,
}

/// A pending transfer from one player's NPC to another player.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payment {
    pub value: i64,
    pub payer: PlayerId,
    pub payee: PlayerId,
}

/// Per-step scratch state shared by the passes.
pub struct StepContext {
    /// Height of the state being produced.
    pub height: i32,
    pub testnet: bool,
    pub forks: ForkSchedule,

    pub playermap: TeamGrid<i32>,
    pub damage: TeamGrid<TileFlags>,
    pub hearts: Grid<bool>,
    pub coins: Grid<i64>,

    pub merchants: MerchantPresence,
    pub census: Census,
    pub champions: [Champion; TEAMS],
    pub areas: AreaCensus,

    pub devmode: i32,
    pub intervals: Intervals,
    pub bounty: BountyNpc,
    pub votes: VoteTally,
    pub payments: Vec<Payment>,
    /// Characters destructed by their owners this step.
    pub destruct: BTreeSet<CharacterId>,

    local_fields: HashMap<Coord, LocalField>,
}

impl StepContext {
    pub fn new(height: i32, config: &GameConfig) -> Self {
        Self {
            height,
            testnet: config.is_testnet(),
            forks: config.forks,
            playermap: Grid::filled([0; TEAMS]),
            damage: Grid::filled([TileFlags::empty(); TEAMS]),
            hearts: Grid::filled(false),
            coins: Grid::filled(0),
            merchants: MerchantPresence::default(),
            census: Census::default(),
            champions: Default::default(),
            areas: AreaCensus::default(),
            devmode: 0,
            intervals: Intervals::for_devmode(0),
            bounty: BountyNpc::default(),
            votes: VoteTally::default(),
            payments: Vec::new(),
            destruct: BTreeSet::new(),
            local_fields: HashMap::new(),
        }
    }

    /// Queues a payment; returns false once the list is full.
    pub fn queue_payment(&mut self, payment: Payment) -> bool {
        if self.payments.len() >= MAX_HUNTER_MESSAGES {
            return false;
        }
        self.payments.push(payment);
        true
    }

    /// Switches the round lengths once the devmode merchant has been seen.
    pub fn set_devmode(&mut self, devmode: i32) {
        self.devmode = devmode;
        self.intervals = Intervals::for_devmode(devmode);
    }

    /// Local distance window around `centre`, computed once per step.
    pub fn local_field(&mut self, world: &World, centre: Coord) -> LocalField {
        *self
            .local_fields
            .entry(centre)
            .or_insert_with(|| world.local_field(centre))
    }

    /// Sum of the strength of every team other than `color` on `coord`.
    pub fn foe_strength(&self, coord: Coord, color: usize) -> i32 {
        (0..TEAMS)
            .filter(|&k| k != color)
            .map(|k| self.playermap.team(coord, k))
            .fold(0i32, i32::wrapping_add)
    }
}
