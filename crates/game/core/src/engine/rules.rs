//! Level curve, population targets and the devmode-dependent intervals.

use crate::config::GameConfig;
use crate::state::{CharacterState, Weapon};

const COIN: i64 = GameConfig::COIN;

/// Highest character level.
pub const CLEVEL_MAX: i32 = 9;
/// Spell range cap after armor penalties.
pub const SPELL_RANGE_MAX: i32 = 7;

/// Loot needed for levels 2 to 9.
const LOOT_FOR_LEVEL: [i64; 8] = [
    100 * COIN,
    200 * COIN,
    400 * COIN,
    800 * COIN,
    1_600 * COIN,
    3_200 * COIN,
    6_400 * COIN,
    12_800 * COIN,
];

/// Character level implied by held loot.
pub fn clevel_from_loot(loot: i64) -> i32 {
    LOOT_FOR_LEVEL
        .iter()
        .rposition(|&need| loot >= need)
        .map_or(1, |i| i as i32 + 2)
}

/// Level used for combat: characters without a weapon fight at level 1.
pub fn combat_clevel(ch: &CharacterState) -> i32 {
    if ch.weapon == Weapon::None {
        1
    } else {
        clevel_from_loot(ch.loot.amount())
    }
}

/// Strength a character of level `clevel` adds to the player map (`10^(L-1)`).
pub fn score_from_clevel(clevel: i32) -> i32 {
    let clevel = clevel.clamp(1, CLEVEL_MAX);
    10i32.pow((clevel - 1) as u32)
}

/// Level of the strongest character that could make up the tile score `score`;
/// 0 for an empty tile.
pub fn max_clevel_from_score(score: i32) -> i32 {
    (1..=CLEVEL_MAX)
        .rev()
        .find(|&l| score >= score_from_clevel(l))
        .unwrap_or(0)
}

/// Population the world aims for at height `h`.
pub const fn population_limit(h: i32) -> i32 {
    if h > 180_000 { 2_000 } else { 200 + h / 100 }
}

/// Devmode value switching the game to short rounds.
pub const DEVMODE_SHORT_ROUNDS: i32 = 8;

/// Round lengths and prices in effect for one step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Intervals {
    /// Blocks between two monster apocalypses.
    pub apocalypse: i32,
    /// Blocks per DAO bounty round.
    pub bounty_cycle: i32,
    /// Price of one ration.
    pub ration_price: i64,
}

impl Intervals {
    pub const fn for_devmode(devmode: i32) -> Self {
        if devmode == DEVMODE_SHORT_ROUNDS {
            Self {
                apocalypse: 200,
                bounty_cycle: 1_000,
                ration_price: COIN / 5,
            }
        } else {
            Self {
                apocalypse: 2_000,
                bounty_cycle: 10_000,
                ration_price: 2 * COIN,
            }
        }
    }

    /// An order older than this is always obeyed at the next apocalypse.
    pub const fn roger(&self) -> i32 {
        self.apocalypse / 4
    }

    /// Blocks after spawning before a character picks harvest areas on its own.
    pub const fn till_automode(&self) -> i32 {
        self.apocalypse / 2
    }

    pub const fn blocks_since_apocalypse(&self, h: i32) -> i32 {
        h % self.apocalypse
    }

    /// Survival points needed to command the team champion.
    pub const fn champion_required_sp(&self, h: i32) -> i32 {
        self.apocalypse / (self.blocks_since_apocalypse(h) + 1) + 5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_double_in_price() {
        assert_eq!(clevel_from_loot(0), 1);
        assert_eq!(clevel_from_loot(100 * COIN - 1), 1);
        assert_eq!(clevel_from_loot(100 * COIN), 2);
        assert_eq!(clevel_from_loot(799 * COIN), 4);
        assert_eq!(clevel_from_loot(12_800 * COIN), 9);
        assert_eq!(clevel_from_loot(i64::MAX), 9);
    }

    #[test]
    fn score_and_max_level_are_inverse() {
        for l in 1..=CLEVEL_MAX {
            assert_eq!(max_clevel_from_score(score_from_clevel(l)), l);
        }
        assert_eq!(max_clevel_from_score(0), 0);
        // two level-3 characters do not make a level-4 one
        assert_eq!(max_clevel_from_score(2 * score_from_clevel(3)), 3);
    }

    #[test]
    fn short_rounds_shrink_every_interval() {
        let normal = Intervals::for_devmode(0);
        let short = Intervals::for_devmode(DEVMODE_SHORT_ROUNDS);
        assert_eq!((normal.apocalypse, short.apocalypse), (2_000, 200));
        assert_eq!(short.ration_price, 20_000_000);
        assert_eq!(normal.champion_required_sp(4_000), 2_005);
        assert_eq!(normal.champion_required_sp(4_999), 7);
        assert_eq!(population_limit(1_000), 210);
        assert_eq!(population_limit(500_000), 2_000);
    }
}
