//! Pass 0: rebuilds the per-tile caches and the population census.
//!
//! Pure function of the state; the only writes back into the state are the
//! protection flag of generals whose team mates are protected and the
//! mark-and-recall bookkeeping.

use tracing::debug;

use crate::config::GameConfig;
use crate::env::{PoiTable, World};
use crate::state::{AiMode, AiStatus, Armor, Coord, GameState, Role, TileFlags};

use super::context::StepContext;
use super::rules::{combat_clevel, population_limit, score_from_clevel};

/// Resists a character adds to its own tile, by level and protection.
pub fn resist_flags(clevel: i32, armor: Armor, role: Role) -> TileFlags {
    use TileFlags as F;
    let base = F::RESIST_POISON0 | F::RESIST_FIRE0 | F::RESIST_DEATH0 | F::RESIST_LIGHTNING0;
    let tier = match clevel {
        l if l >= 3 => 2,
        2 => 1,
        _ => return base,
    };
    let (poison, fire, death, lightning) = if tier == 2 {
        (F::RESIST_POISON2, F::RESIST_FIRE2, F::RESIST_DEATH2, F::RESIST_LIGHTNING2)
    } else {
        (F::RESIST_POISON1, F::RESIST_FIRE1, F::RESIST_DEATH1, F::RESIST_LIGHTNING1)
    };
    match (armor, role) {
        (Armor::Plate, _) => poison | fire | death | lightning,
        (Armor::Splint, _) => poison | fire | death,
        (Armor::Chain, _) => poison | death,
        (Armor::Ring, _) => death,
        (_, Role::REAPER) => F::RESIST_POISON0 | F::RESIST_FIRE0 | death,
        (_, Role::SPITTER) => poison | F::RESIST_FIRE0 | F::RESIST_DEATH0,
        (_, Role::REDHEAD) => F::RESIST_POISON0 | fire | F::RESIST_DEATH0,
        _ => base,
    }
}

/// Flag colour of an area from the per-team counts around it.
fn area_flag(counts: &[i32; GameConfig::NUM_TEAM_COLORS]) -> u8 {
    let [c0, c1, c2, c3] = *counts;
    if c0 != 0 {
        if c1 == 0 && c2 == 0 && c3 == 0 { 1 } else { 6 }
    } else if c1 != 0 {
        if c2 == 0 && c3 == 0 { 2 } else { 6 }
    } else if c2 != 0 {
        if c3 == 0 { 3 } else { 6 }
    } else if c3 != 0 {
        4
    } else {
        7
    }
}

pub fn run(state: &mut GameState, world: &World, ctx: &mut StepContext) {
    for (coord, pile) in &state.loot {
        ctx.coins.set(*coord, pile.amount);
    }
    for coord in &state.hearts {
        ctx.hearts.set(*coord, true);
    }

    for (pid, player) in state.players.iter_mut() {
        let color = usize::from(player.color);
        let mut general_is_essential = false;
        let mut general_must_live = false;

        for (&index, ch) in player.characters.iter_mut() {
            let essential = ch.status.contains(AiStatus::ESSENTIAL);
            if index == 0 {
                general_is_essential = essential;
            } else if essential && !general_is_essential {
                general_must_live = true;
            }

            let coord = ch.coord;
            if !coord.is_inside_map() {
                continue;
            }
            let role = ch.role;
            ctx.census.total += 1;
            if let Some(n) = ctx.census.population.get_mut(role.index()) {
                *n += 1;
            }

            if role.is_merchant() {
                let m = role.index();
                ctx.merchants.exists[m] = true;
                ctx.merchants.pos[m] = coord;
                ctx.merchants.last_sale[m] = ch.last_sale_block;

                if role == Role::INFO_DEVMODE {
                    let digit = (ch.aux_storage_u1 as i32).wrapping_sub(i32::from(b'0'));
                    let devmode = if ctx.testnet && (0..=9).contains(&digit) {
                        digit
                    } else {
                        0
                    };
                    ctx.set_devmode(devmode);
                    ctx.bounty.player = pid.clone();
                    ctx.bounty.available = ch.loot.amount();
                }
                continue;
            }

            if role.is_monster() {
                if let Some(champion) = ctx.champions.get_mut(color) {
                    if ch.loot.amount() > champion.coins && ch.queued_harvest_poi == 0 {
                        champion.player = pid.clone();
                        champion.index = index;
                        champion.coins = ch.loot.amount();
                    }
                }
            }

            if color >= GameConfig::NUM_TEAM_COLORS {
                continue;
            }
            let clevel = combat_clevel(ch);
            let score = score_from_clevel(clevel);
            ctx.census.team_balance[color] = ctx.census.team_balance[color].wrapping_add(score);
            if let Some(v) = ctx.playermap.team_mut(coord, color) {
                *v = v.wrapping_add(score);
            }
            if let Some(f) = ctx.damage.team_mut(coord, color) {
                *f |= resist_flags(clevel, ch.armor, role);
            }

            for n in PoiTable::NORMAL {
                let d = world.poi_distance(n, coord);
                if d < 0 {
                    continue;
                }
                if d < 20 {
                    ctx.areas.num_near[n][color] += 1;
                    if d < 12 && ch.mode.contains(AiMode::MARK_RECALL) {
                        ch.marked_harvest_poi = n as u8;
                    }
                }
                for cl in 0..clevel.max(0) as usize {
                    let nearest = &mut ctx.areas.nearest[n][color][cl];
                    if d < *nearest {
                        *nearest = d;
                    }
                }
            }
        }

        if general_must_live {
            if let Some(general) = player.characters.get_mut(&0) {
                general.status |= AiStatus::ESSENTIAL;
            }
        }
    }

    let census = &mut ctx.census;
    census.monsters =
        census.count(Role::REAPER) + census.count(Role::SPITTER) + census.count(Role::REDHEAD);
    let players = census.count(Role::PLAYER);
    census.less_monsters_than_players = census.monsters < players;
    census.need_monsters_badly = census.monsters * 2 < players;
    let limit = population_limit(ctx.height);
    // the missing-merchant count is still zero here
    census.hearts_spawn = census.total < limit && census.missing_merchant_count == 0;
    census.berzerk = census.total > limit || census.need_monsters_badly;

    for (role, base) in world.merchants().iter() {
        if role > Role::NORMAL_MERCHANT_LAST || ctx.merchants.exists(role) {
            continue;
        }
        if base.chronon >= ctx.height || base.base.x <= 0 || base.base.y <= 0 {
            continue;
        }
        let Some(slot) = census.missing_merchant.get_mut(usize::from(base.color)) else {
            continue;
        };
        if *slot == Role::PLAYER {
            *slot = role;
        }
        census.missing_merchant_count += 1;
    }
    if census.missing_merchant_count > 0 {
        debug!(
            missing = census.missing_merchant_count,
            per_team = ?census.missing_merchant.map(|r| r.0),
            "merchants missing"
        );
    }

    for ic in 0..GameConfig::NUM_TEAM_COLORS {
        let count = census.team_balance[ic];
        let others = (0..GameConfig::NUM_TEAM_COLORS).filter(|&k| k != ic);
        if others.clone().all(|k| census.team_balance[k] <= count) {
            census.strongest_team = ic;
        }
        if others.clone().all(|k| census.team_balance[k] >= count) {
            census.weakest_team = ic;
        }
    }

    for k in *PoiTable::NORMAL.start()..GameConfig::NUM_POI {
        ctx.areas.flag[k] = area_flag(&ctx.areas.num_near[k]);
    }

    debug!(
        height = ctx.height,
        population = census.total,
        monsters = census.monsters,
        devmode = ctx.devmode,
        "census rebuilt"
    );
}

/// Whether a tile holds a character of any team (used by tests and the view).
pub fn occupied(ctx: &StepContext, coord: Coord) -> bool {
    (0..GameConfig::NUM_TEAM_COLORS).any(|k| ctx.playermap.team(coord, k) != 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::state::{CharacterState, PlayerState, Weapon};
    use crate::testing::open_world;

    fn hunter(at: Coord, loot: i64, weapon: Weapon, armor: Armor) -> CharacterState {
        let mut ch = CharacterState {
            coord: at,
            from: at,
            weapon,
            armor,
            ..CharacterState::default()
        };
        ch.loot.loot.amount = loot;
        ch
    }

    fn add_player(state: &mut GameState, name: &str, color: u8, chars: Vec<CharacterState>) {
        let mut player = PlayerState {
            color,
            ..PlayerState::default()
        };
        for (i, ch) in chars.into_iter().enumerate() {
            player.characters.insert(i as i32, ch);
        }
        state.players.insert(name.to_string(), player);
    }

    #[test]
    fn resist_table_scales_with_level() {
        assert_eq!(
            resist_flags(1, Armor::Plate, Role::PLAYER),
            TileFlags::RESIST_POISON0
                | TileFlags::RESIST_FIRE0
                | TileFlags::RESIST_DEATH0
                | TileFlags::RESIST_LIGHTNING0
        );
        assert_eq!(resist_flags(2, Armor::Ring, Role::PLAYER), TileFlags::RESIST_DEATH1);
        assert_eq!(
            resist_flags(5, Armor::None, Role::SPITTER),
            TileFlags::RESIST_POISON2 | TileFlags::RESIST_FIRE0 | TileFlags::RESIST_DEATH0
        );
    }

    #[test]
    fn flags_mark_owned_contested_and_neutral_areas() {
        assert_eq!(area_flag(&[0, 0, 0, 0]), 7);
        assert_eq!(area_flag(&[2, 0, 0, 0]), 1);
        assert_eq!(area_flag(&[0, 0, 0, 1]), 4);
        assert_eq!(area_flag(&[0, 3, 1, 0]), 6);
    }

    #[test]
    fn census_counts_teams_and_protects_generals() {
        let world = open_world();
        let mut state = GameState::new();
        state.height = 10;
        let coin = GameConfig::COIN;

        let mut guarded = hunter(Coord::new(100, 100), 0, Weapon::None, Armor::None);
        guarded.status |= AiStatus::ESSENTIAL;
        add_player(
            &mut state,
            "a",
            0,
            vec![
                hunter(Coord::new(100, 100), 150 * coin, Weapon::Knight, Armor::None),
                guarded,
            ],
        );
        add_player(
            &mut state,
            "b",
            1,
            vec![hunter(Coord::new(300, 300), 0, Weapon::None, Armor::None)],
        );

        let mut ctx = StepContext::new(state.height, &GameConfig::new());
        run(&mut state, &world, &mut ctx);

        assert_eq!(ctx.census.total, 3);
        assert_eq!(ctx.census.count(Role::PLAYER), 3);
        // level 2 general (10) + weaponless level 1 (1)
        assert_eq!(ctx.census.team_balance, [11, 1, 0, 0]);
        assert_eq!(ctx.playermap.team(Coord::new(100, 100), 0), 11);
        assert_eq!((ctx.census.strongest_team, ctx.census.weakest_team), (0, 3));
        assert!(ctx.census.need_monsters_badly && ctx.census.berzerk);
        assert!(
            state.players["a"].characters[&0]
                .status
                .contains(AiStatus::ESSENTIAL)
        );
        assert!(occupied(&ctx, Coord::new(300, 300)));
        assert!(!occupied(&ctx, Coord::new(301, 300)));
    }
}
