//! Deaths: spawn-area overstay, ranged hits, poison countdown, and what
//! happens to the loot of the dead.
//!
//! A dying character is first offered a way out (safe zone, protection,
//! life saving amulet), then recycled into a missing merchant or a monster
//! when the world needs one. Only then is it removed and its loot dropped.

use tracing::{debug, trace};

use crate::config::{ForkSchedule, GameConfig};
use crate::env::is_safezone;
use crate::state::{
    AiMode, AiStatus, Armor, CharacterId, CollectedLootInfo, Coord, GameState, Role, Trinket,
    Weapon,
};

use super::context::StepContext;
use super::result::{CollectedBounty, KilledBy, StepResult};

/// `fav_harvest_poi` values with a special meaning.
pub mod fav {
    pub const CHOOSE_NEW: u8 = 0;
    pub const STAY_HERE: u8 = 1;
    pub const MONSTER_GO_TO_NEAREST: u8 = 2;
}

/// Moves a drop position off the banking strips, one tile inwards.
pub fn push_out_of_spawn_area(c: Coord) -> Coord {
    if !c.is_in_spawn_area() {
        return c;
    }
    let (w, h) = (GameConfig::MAP_WIDTH, GameConfig::MAP_HEIGHT);
    let dy = if c.y == 0 {
        1
    } else if c.y == h - 1 {
        -1
    } else {
        0
    };
    if c.x == 0 {
        c.offset(1, dy)
    } else if c.x == w - 1 {
        c.offset(-1, dy)
    } else {
        c.offset(0, dy)
    }
}

/// Loot of a dead character: taxed, then sent to the game fund, refunded
/// or dropped on the map.
pub fn handle_killed_loot(
    state: &mut GameState,
    forks: &ForkSchedule,
    id: &CharacterId,
    has_tax: bool,
    can_refund: bool,
    result: &mut StepResult,
) {
    let Some(player) = state.players.get(&id.player) else {
        return;
    };
    let Some(ch) = player.characters.get(&id.index) else {
        return;
    };

    let mut amount = ch.loot.amount();
    if id.index == 0 {
        debug_assert!(player.coin_amount >= 0, "general without a coin lock");
        amount += player.coin_amount.max(0);
    }
    if has_tax {
        let tax = amount / 25;
        result.tax_amount += tax;
        amount -= tax;
    }
    if amount == 0 {
        return;
    }

    let less_hearts = forks.less_hearts_active(state.height);
    if player.remaining_life >= 0 && less_hearts {
        state.game_fund += amount;
        return;
    }
    if can_refund && less_hearts {
        let loot = CollectedLootInfo::refund(amount, state.height);
        let address = player.address.clone();
        result
            .bounties
            .push(CollectedBounty::new(id.clone(), loot, address));
        return;
    }
    let coord = push_out_of_spawn_area(ch.coord);
    state.add_loot(coord, amount);
}

/// Counts blocks spent on the banking strips and kills overstayers.
pub fn kill_spawn_area(state: &mut GameState, forks: &ForkSchedule, result: &mut StepResult) {
    let h = state.height;
    let mut victims = Vec::new();
    for (name, player) in state.players.iter_mut() {
        for (&index, ch) in player.characters.iter_mut() {
            if !ch.coord.is_in_spawn_area() {
                ch.stay_in_spawn_area = 0;
                continue;
            }
            if ch.status.contains(AiStatus::ESSENTIAL) {
                continue;
            }
            let stayed = ch.stay_in_spawn_area;
            ch.stay_in_spawn_area = stayed.saturating_add(1);
            if stayed < GameConfig::MAX_STAY_IN_SPAWN_AREA {
                continue;
            }
            // spawn death was switched off between these two forks
            if forks.carrying_cap_active(h) && !forks.less_hearts_active(h) {
                continue;
            }
            victims.push(CharacterId::new(name.clone(), index));
        }
    }

    for id in victims {
        handle_killed_loot(state, forks, &id, false, true, result);
        if id.index == 0 {
            result.kill_player(&id.player, KilledBy::Spawn);
        }
        if let Some(player) = state.players.get_mut(&id.player) {
            player.characters.remove(&id.index);
        }
        debug!(character = %id, "killed for staying in the spawn area");
    }
}

/// Forgets the standing orders of a character that just cheated death.
fn clear_orders(ch: &mut crate::state::CharacterState, fav_poi: u8) {
    ch.fav_harvest_poi = fav_poi;
    ch.queued_harvest_poi = 0;
    ch.marked_harvest_poi = 0;
    ch.duty_harvest_poi = 0;
}

/// Weapon carried by a freshly recycled monster.
fn monster_weapon(role: Role) -> Weapon {
    match role {
        Role::REAPER => Weapon::Death,
        Role::SPITTER => Weapon::Poison,
        Role::REDHEAD => Weapon::Fire,
        _ => Weapon::None,
    }
}

/// Resolves death flags: destruct orders, survival, recycling and death.
/// Also runs the monster regeneration timers.
pub fn kill_ranged_attacks(state: &mut GameState, ctx: &mut StepContext, result: &mut StepResult) {
    let mut drops: Vec<(Coord, i64)> = Vec::new();
    let apocalypse = ctx.intervals.apocalypse;

    for (name, player) in state.players.iter_mut() {
        let color = usize::from(player.color);
        let coin_amount = player.coin_amount;
        let mut general_is_merchant = false;
        let mut erase = Vec::new();

        for (&index, ch) in player.characters.iter_mut() {
            if index == 0 && ch.role.is_merchant() {
                general_is_merchant = true;
            }
            if !ctx.destruct.is_empty() {
                let id = CharacterId::new(name.clone(), index);
                if ctx.destruct.contains(&id) {
                    ch.status |= AiStatus::DEATH_DEATH;
                    if ch.role.is_merchant() {
                        ch.status.remove(AiStatus::DEATH_DEATH);
                    }
                }
            }
            if ch.role.is_merchant() {
                continue;
            }

            let census = &mut ctx.census;
            let mut dies = false;
            let mut lives = 0;
            if ch.is_dead_flagged() {
                dies = true;
                let missing = census.missing_merchant.get(color).copied().unwrap_or(Role::PLAYER);

                if is_safezone(ch.coord)
                    || ch.status.contains(AiStatus::ESSENTIAL)
                    || ch.amulet == Trinket::LifeSaving
                {
                    if ch.amulet == Trinket::LifeSaving {
                        ch.amulet = Trinket::None;
                        if !ch.mode.contains(AiMode::AUTO_MODE) {
                            clear_orders(ch, fav::STAY_HERE);
                        }
                    }
                    lives = 2;
                } else if missing != Role::PLAYER && (index == 0 || general_is_merchant) {
                    lives = 1;
                    ch.role = missing;
                    census.missing_merchant[color] = Role::PLAYER;
                    debug!(player = %name, index, role = %missing, "recycled into a merchant");
                } else if census.need_monsters_badly
                    || (color != census.strongest_team && census.less_monsters_than_players)
                    || color == census.weakest_team
                {
                    lives = 2;
                    let role = census.rarest_monster();
                    ch.role = role;
                    ch.regen_timer = if ch.amulet == Trinket::Regen { apocalypse } else { -1 };
                    clear_orders(ch, fav::MONSTER_GO_TO_NEAREST);
                    ch.amulet = Trinket::None;
                    ch.ring = Trinket::None;
                    ch.armor = Armor::None;
                    ch.reason = 0;
                    ch.retreat = 0;
                    ch.weapon = monster_weapon(role);
                    debug!(player = %name, index, %role, "recycled into a monster");
                }
            } else if !census.need_monsters_badly && ch.regen_timer > 0 {
                // odd tiles only, so that monsters do not all come back at once
                if ch.coord.x % 2 + ch.coord.y % 2 != 0 {
                    ch.regen_timer -= 1;
                }
                if ch.regen_timer == 0 {
                    ch.role = Role::PLAYER;
                    ch.status |= AiStatus::ESCAPE;
                    ch.retreat = 0;
                    ch.fav_harvest_poi = fav::CHOOSE_NEW;
                    trace!(player = %name, index, "monster regenerated");
                }
            }

            if !dies {
                continue;
            }
            if lives > 0 {
                ch.stop_moving();
                ch.mode.remove(AiMode::SURVIVAL | AiMode::RESTING);
                ch.status.remove(AiStatus::DEATH_ALL);
                if lives >= 2 {
                    ch.status |= AiStatus::ESCAPE;
                }
            } else {
                let mut amount = ch.loot.amount();
                if index == 0 {
                    amount += coin_amount.max(0);
                    result.kill_player(name, KilledBy::Poison);
                }
                if amount > 0 {
                    drops.push((push_out_of_spawn_area(ch.coord), amount));
                }
                erase.push(index);
            }
        }
        for index in erase {
            player.characters.remove(&index);
        }
    }

    for (coord, amount) in drops {
        state.add_loot(coord, amount);
    }
}

/// Poison countdown; players reaching zero are killed.
pub fn decrement_life(state: &mut GameState, result: &mut StepResult) {
    for (name, player) in state.players.iter_mut() {
        if player.remaining_life == -1 {
            continue;
        }
        debug_assert!(player.remaining_life > 0);
        player.remaining_life -= 1;
        if player.remaining_life == 0 {
            result.kill_player(name, KilledBy::Poison);
        }
    }
}

/// Drops the loot of every remaining character of killed players and
/// removes the players.
pub fn finalise_kills(state: &mut GameState, forks: &ForkSchedule, result: &mut StepResult) {
    let victims: Vec<_> = result.killed_players().iter().cloned().collect();
    for victim in &victims {
        let apply_tax = result
            .first_reason(victim)
            .is_some_and(KilledBy::has_death_tax);
        let indices: Vec<i32> = state
            .players
            .get(victim)
            .map(|p| p.characters.keys().copied().collect())
            .unwrap_or_default();
        for index in indices {
            let id = CharacterId::new(victim.clone(), index);
            handle_killed_loot(state, forks, &id, apply_tax, false, result);
        }
    }
    for victim in &victims {
        state.players.remove(victim);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{CharacterState, PlayerState};

    const COIN: i64 = GameConfig::COIN;

    fn player_with(color: u8, chars: Vec<CharacterState>) -> PlayerState {
        let mut player = PlayerState {
            color,
            coin_amount: 0,
            ..PlayerState::default()
        };
        for (i, ch) in chars.into_iter().enumerate() {
            player.characters.insert(i as i32, ch);
        }
        player.next_character_index = player.characters.len() as i32;
        player
    }

    fn at(coord: Coord, loot: i64) -> CharacterState {
        let mut ch = CharacterState {
            coord,
            from: coord,
            ..CharacterState::default()
        };
        ch.loot.loot.amount = loot;
        ch
    }

    #[test]
    fn spawn_strip_drops_move_inwards() {
        assert_eq!(push_out_of_spawn_area(Coord::new(0, 0)), Coord::new(1, 1));
        assert_eq!(push_out_of_spawn_area(Coord::new(501, 3)), Coord::new(500, 3));
        assert_eq!(push_out_of_spawn_area(Coord::new(490, 501)), Coord::new(490, 500));
        assert_eq!(push_out_of_spawn_area(Coord::new(50, 50)), Coord::new(50, 50));
    }

    #[test]
    fn overstaying_general_kills_the_player() {
        let mut state = GameState::new();
        state.height = 100;
        let mut general = at(Coord::new(0, 5), 10 * COIN);
        general.stay_in_spawn_area = GameConfig::MAX_STAY_IN_SPAWN_AREA;
        let mut fresh = at(Coord::new(0, 6), 0);
        fresh.stay_in_spawn_area = 3;
        state
            .players
            .insert("p".into(), player_with(0, vec![general, fresh]));

        let forks = ForkSchedule::MAINNET;
        let mut result = StepResult::new();
        kill_spawn_area(&mut state, &forks, &mut result);

        let player = &state.players["p"];
        assert!(!player.characters.contains_key(&0));
        assert_eq!(player.characters[&1].stay_in_spawn_area, 4);
        assert_eq!(result.first_reason("p"), Some(&KilledBy::Spawn));
        // untaxed, dropped next to the strip
        assert_eq!(state.loot[&Coord::new(1, 5)].amount, 10 * COIN);

        finalise_kills(&mut state, &forks, &mut result);
        assert!(state.players.is_empty());
        assert_eq!(result.tax_amount, 0);
    }

    #[test]
    fn spawn_kill_is_refunded_after_the_less_hearts_fork() {
        let mut state = GameState::new();
        state.height = 700_000;
        let mut general = at(Coord::new(0, 5), 10 * COIN);
        general.stay_in_spawn_area = GameConfig::MAX_STAY_IN_SPAWN_AREA;
        let mut player = player_with(0, vec![general]);
        player.address = "addr".into();
        state.players.insert("p".into(), player);

        let mut result = StepResult::new();
        kill_spawn_area(&mut state, &ForkSchedule::MAINNET, &mut result);
        assert!(state.loot.is_empty());
        assert_eq!(result.bounties.len(), 1);
        assert_eq!(result.bounties[0].loot.refund_height(), Some(700_000));
        assert_eq!(result.bounties[0].address, "addr");
    }

    #[test]
    fn dying_general_becomes_missing_merchant() {
        let mut state = GameState::new();
        let mut general = at(Coord::new(100, 100), 0);
        general.status |= AiStatus::DEATH_FIRE;
        state.players.insert("p".into(), player_with(1, vec![general]));

        let mut ctx = StepContext::new(5, &GameConfig::new());
        ctx.census.missing_merchant[1] = Role::STAFF_FIREBALL;
        let mut result = StepResult::new();
        kill_ranged_attacks(&mut state, &mut ctx, &mut result);

        let ch = &state.players["p"].characters[&0];
        assert_eq!(ch.role, Role::STAFF_FIREBALL);
        assert!(!ch.is_dead_flagged());
        assert!(!ch.status.contains(AiStatus::ESCAPE));
        assert_eq!(ctx.census.missing_merchant[1], Role::PLAYER);
        assert!(result.killed_players().is_empty());
    }

    #[test]
    fn life_saving_amulet_is_consumed() {
        let mut state = GameState::new();
        let mut ch = at(Coord::new(100, 100), 0);
        ch.status |= AiStatus::DEATH_POISON;
        ch.amulet = Trinket::LifeSaving;
        ch.duty_harvest_poi = 40;
        ch.waypoints.push(Coord::new(120, 120));
        state.players.insert("p".into(), player_with(0, vec![ch]));

        let mut ctx = StepContext::new(5, &GameConfig::new());
        let mut result = StepResult::new();
        kill_ranged_attacks(&mut state, &mut ctx, &mut result);

        let ch = &state.players["p"].characters[&0];
        assert_eq!(ch.amulet, Trinket::None);
        assert_eq!(ch.fav_harvest_poi, fav::STAY_HERE);
        assert_eq!(ch.duty_harvest_poi, 0);
        assert!(ch.waypoints.is_empty());
        assert!(ch.status.contains(AiStatus::ESCAPE));
    }

    #[test]
    fn unprotected_character_dies_and_drops_loot() {
        let mut state = GameState::new();
        let general = at(Coord::new(200, 200), 0);
        let mut scout = at(Coord::new(150, 150), 7 * COIN);
        scout.status |= AiStatus::DEATH_DEATH;
        state
            .players
            .insert("p".into(), player_with(0, vec![general, scout]));

        let mut ctx = StepContext::new(5, &GameConfig::new());
        // team 0 is the strongest and monsters are plentiful
        ctx.census.strongest_team = 0;
        ctx.census.weakest_team = 3;
        let mut result = StepResult::new();
        kill_ranged_attacks(&mut state, &mut ctx, &mut result);

        assert!(!state.players["p"].characters.contains_key(&1));
        assert_eq!(state.loot[&Coord::new(150, 150)].amount, 7 * COIN);
        assert!(result.killed_players().is_empty());
    }

    #[test]
    fn destructed_merchant_is_spared() {
        let mut state = GameState::new();
        let mut merchant = at(Coord::new(100, 100), 0);
        merchant.role = Role::ARMOR_PLATE;
        state.players.insert("m".into(), player_with(0, vec![merchant]));

        let mut ctx = StepContext::new(5, &GameConfig::new());
        ctx.destruct.insert(CharacterId::new("m", 0));
        let mut result = StepResult::new();
        kill_ranged_attacks(&mut state, &mut ctx, &mut result);
        assert!(!state.players["m"].characters[&0].is_dead_flagged());
    }

    #[test]
    fn poison_countdown_taxes_the_remaining_loot() {
        let mut state = GameState::new();
        state.height = 10;
        let mut player = player_with(0, vec![at(Coord::new(100, 100), 100 * COIN)]);
        player.remaining_life = 1;
        player.coin_amount = 0;
        state.players.insert("p".into(), player);

        let forks = ForkSchedule::MAINNET;
        let mut result = StepResult::new();
        decrement_life(&mut state, &mut result);
        finalise_kills(&mut state, &forks, &mut result);

        assert!(state.players.is_empty());
        assert_eq!(result.tax_amount, 4 * COIN);
        assert_eq!(state.loot[&Coord::new(100, 100)].amount, 96 * COIN);
    }
}
