/// Network the engine is validating for.
///
/// Only a few debug paths differ between networks (e.g. the devmode switch
/// carried by an info merchant is honoured on testnet only).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

/// Activation heights of the rule changes that are still observable in this ruleset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ForkSchedule {
    /// Poison disasters exist; new players spawn a single character.
    pub poison: i32,
    /// Carrying capacity rules (capacity is unlimited in this ruleset, but the
    /// fork still gates spawn-kill refunds).
    pub carrying_cap: i32,
    /// Hearts are cleared on disasters, poisoned loot goes to the game fund and
    /// spawn-area kills are refunded.
    pub less_hearts: i32,
}

impl ForkSchedule {
    pub const MAINNET: Self = Self {
        poison: 255_000,
        carrying_cap: 500_000,
        less_hearts: 590_000,
    };

    pub const TESTNET: Self = Self {
        poison: 190_000,
        carrying_cap: 200_000,
        less_hearts: 240_000,
    };

    pub const fn poison_active(&self, height: i32) -> bool {
        height >= self.poison
    }

    pub const fn carrying_cap_active(&self, height: i32) -> bool {
        height >= self.carrying_cap
    }

    pub const fn less_hearts_active(&self, height: i32) -> bool {
        height >= self.less_hearts
    }
}

impl Default for ForkSchedule {
    fn default() -> Self {
        Self::MAINNET
    }
}

/// Game configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GameConfig {
    pub network: Network,
    pub forks: ForkSchedule,
    /// Steps past this height are rejected (alpha-test cap).
    pub max_height: i32,
}

impl GameConfig {
    // ===== map geometry =====
    pub const MAP_WIDTH: i32 = 502;
    pub const MAP_HEIGHT: i32 = 502;
    pub const SPAWN_AREA_LENGTH: i32 = 15;
    pub const NUM_TEAM_COLORS: usize = 4;

    // ===== characters =====
    /// Maximum number of waypoints per character.
    pub const MAX_WAYPOINTS: usize = 100;
    pub const MAX_STAY_IN_SPAWN_AREA: u8 = 30;
    /// Characters alive at the same time.
    pub const MAX_CHARACTERS_PER_PLAYER: usize = 20;
    /// Characters over the lifetime of a player.
    pub const MAX_CHARACTERS_PER_PLAYER_TOTAL: i32 = 1000;
    pub const MAX_PLAYER_NAME_LENGTH: usize = 10;

    // ===== economy =====
    pub const COIN: i64 = 100_000_000;
    pub const CENT: i64 = 1_000_000;
    pub const NUM_HARVEST_AREAS: usize = 18;
    /// Total harvest in cents, crown bonus included.
    pub const TOTAL_HARVEST: i64 = 900;
    pub const CROWN_BONUS: i64 = 25;
    pub const NUM_CROWN_LOCATIONS: usize = 416;
    pub const CROWN_START_X: i32 = 208;
    pub const CROWN_START_Y: i32 = 265;

    // ===== poison disaster =====
    pub const POISON_MIN_LIFE: i32 = 1;
    pub const POISON_MAX_LIFE: i32 = 50;

    // ===== navigation =====
    /// Side of the local navigation window (always `2 * NAV_CENTER + 1`).
    pub const NAV_SIZE: usize = 21;
    pub const NAV_CENTER: i32 = 10;
    /// Less than `NAV_CENTER` so monsters can flee.
    pub const MONSTER_DETECTION_RANGE: i32 = 9;
    pub const NUM_POI: usize = 98;
    pub const NUM_MERCHANTS: usize = 39;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_MAX_HEIGHT: i32 = 100_000;

    pub fn new() -> Self {
        Self {
            network: Network::Mainnet,
            forks: ForkSchedule::MAINNET,
            max_height: Self::DEFAULT_MAX_HEIGHT,
        }
    }

    pub fn testnet() -> Self {
        Self {
            network: Network::Testnet,
            forks: ForkSchedule::TESTNET,
            max_height: Self::DEFAULT_MAX_HEIGHT,
        }
    }

    pub fn with_forks(mut self, forks: ForkSchedule) -> Self {
        self.forks = forks;
        self
    }

    pub fn with_max_height(mut self, max_height: i32) -> Self {
        self.max_height = max_height;
        self
    }

    pub fn is_testnet(&self) -> bool {
        self.network == Network::Testnet
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}
