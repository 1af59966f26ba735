//! Long-range planning over the precomputed POI distance fields, and the
//! random dispersal of idle characters.

use tracing::debug;

use crate::env::{MapOracle, PoiKind, PoiTable, is_safezone};
use crate::state::{AiMode, AiOrders, Coord};

use super::super::context::DIST_INFINITE;
use super::tree::Status;
use super::{Agent, NUM_POI, fav, reason};

/// Foes this close to an area make it unattractive for a fresh choice.
const CROWDED_BY_FOES: i32 = 12;
/// Extra distance charged per foe already near an area.
const CROWDING_PENALTY: i32 = 70;
/// A retreat never targets an area closer than this.
const RETREAT_MIN_DIST: i32 = 100;

/// Where the plan leads and how far away it is.
type Pick = Option<(usize, i32)>;

fn dist(a: &Agent<'_>, k: usize, c: Coord) -> i32 {
    a.world.poi_distance(k, c)
}

fn nearest_foe(a: &Agent<'_>, k: usize) -> i32 {
    a.ctx.areas.nearest_foe(k, a.color, a.clevel)
}

/// Chooses a destination POI and takes one step towards it.
pub(super) fn long_range(a: &mut Agent<'_>) -> Status {
    if a.ch.fav_harvest_poi == fav::STAY_HERE || a.ch.reason == reason::NPC_IN_WAY {
        return Status::Failure;
    }
    a.ch.reason = reason::LONG_PATH;

    let monster = a.ch.role.is_monster();
    let favourite = a.fav();
    let outer = a.ch.mode.contains(AiMode::FARM_OUTER_RING);
    let may_choose = a.age() >= a.ctx.intervals.till_automode();
    let own = a.color as u8;

    let pick = if monster && favourite != 0 {
        monster_harvest(a)
    } else if monster || a.panic > 0 {
        roam_or_retreat(a)
    } else if a.wants_to_visit_center() {
        visit_center(a)
    } else if outer && favourite != 0 {
        via_teleporter(a, 5 + own, reason::TO_OUTER_POI)
    } else if outer && may_choose {
        choose_outer(a)
    } else if !outer && favourite != 0 {
        a.ch.reason = reason::SEARCH_FAV_INNER_POI;
        via_teleporter(a, 1 + own, reason::TO_INNER_POI)
    } else if favourite == 0 && may_choose {
        choose_inner(a)
    } else {
        None
    };

    match pick {
        Some((k, d_best)) => approach(a, k, d_best),
        None => cornered(a),
    }
    Status::from(a.success)
}

/// Monsters stick to their harvest area, or pick the nearest one.
fn monster_harvest(a: &mut Agent<'_>) -> Pick {
    let here = a.ch.coord;
    let k0 = a.fav();
    let mut pick = None;
    if a.is_harvest(k0) {
        pick = Some((k0, dist(a, k0, here)));
    } else {
        if k0 != usize::from(fav::MONSTER_GO_TO_NEAREST) {
            debug!(fav = k0, role = %a.ch.role, "monster has a bad favourite area");
        }
        let mut d_best = DIST_INFINITE;
        for k in (0..NUM_POI).filter(|&k| a.kind(k).is_harvest()) {
            let d = dist(a, k, here);
            if d < d_best {
                d_best = d;
                pick = Some((k, d));
            }
        }
        if let Some((k, _)) = pick {
            a.ch.fav_harvest_poi = k as u8;
        }
    }
    if pick.is_some() {
        a.ch.reason = reason::MONSTER_HARVEST;
    }
    pick
}

/// Monsters prowl to a random area; panicking characters retreat to one
/// the threat cannot reach first.
///
/// Retreat tiers: -2 barely outruns the threat, -1 outruns it with a margin,
/// 0 is also clear of every other known foe of that level.
fn roam_or_retreat(a: &mut Agent<'_>) -> Pick {
    let here = a.ch.coord;
    let panic = a.panic > 0;
    let desired = if panic { a.rng.next(500) } else { a.rng.next(750) };
    let monster = a.ch.role.is_monster();
    let hunter = a.ch.role.is_player() && !a.ch.mode.contains(AiMode::AUTO_MODE);

    let mut best_adj = DIST_INFINITE;
    let mut tier_best = -3;
    let mut pick = None;
    for k in 0..NUM_POI {
        let kind = a.kind(k);
        let eligible = kind.is_harvest() || (kind == PoiKind::CENTER && (hunter || monster));
        if !eligible {
            continue;
        }
        let d = dist(a, k, here);
        let mut tier = 0;
        if panic {
            if d < RETREAT_MIN_DIST {
                continue;
            }
            tier = -3;
            if tier_best <= -1 {
                let d_foe = dist(a, k, a.panic_at);
                if d + a.panic_foelevel + 1 <= d_foe {
                    tier = -2;
                }
                if d + a.panic_foelevel + 2 <= d_foe {
                    tier = -1;
                }
            }
            if d + a.panic_foelevel + 2 <= nearest_foe(a, k) {
                tier = 0;
            }
        }

        let d_adj = (d - desired).abs();
        if tier > -3 && (tier > tier_best || (tier == tier_best && d_adj < best_adj)) {
            best_adj = d_adj;
            tier_best = tier;
            pick = Some((k, d));
        }
    }

    match pick {
        Some((k, _)) => {
            a.ch.fav_harvest_poi = k as u8;
            if !panic {
                a.ch.reason = reason::MONSTER_PROWL;
            } else {
                a.ch.retreat = match tier_best {
                    -2 => reason::RETREAT_BARELY,
                    -1 => reason::RETREAT_OK,
                    0 => reason::RETREAT_GOOD,
                    _ => reason::RETREAT_ERROR,
                };
            }
        }
        None if a.ch.role.is_player() => {
            debug!(%here, threat = %a.panic_at, "no way to retreat");
        }
        None => {}
    }
    pick
}

/// The town centre, or the teleporter out of the own spawn corner.
fn visit_center(a: &mut Agent<'_>) -> Pick {
    let here = a.ch.coord;
    let own_tp = PoiKind(1 + a.color as u8);
    let mut d_best = DIST_INFINITE;
    let mut pick = None;
    for k in 0..NUM_POI {
        let kind = a.kind(k);
        if kind != PoiKind::CENTER && kind != own_tp {
            continue;
        }
        let d = dist(a, k, here);
        if d < d_best {
            d_best = d;
            pick = Some((k, d));
        }
    }
    if pick.is_some() {
        a.ch.reason = reason::VISIT_CENTER;
    }
    pick
}

/// Walks to the favourite area directly, or through the team teleporter of
/// `tp_kind` when that is shorter. Retreating characters never teleport.
fn via_teleporter(a: &mut Agent<'_>, tp_kind: u8, found: u8) -> Pick {
    let here = a.ch.coord;
    let k0 = a.fav();
    let mut d_best = DIST_INFINITE;
    let mut pick = None;
    if k0 < NUM_POI {
        let d = dist(a, k0, here);
        if d < d_best {
            d_best = d;
            pick = Some((k0, d));
        }
    }

    if !a.on_the_run && k0 < NUM_POI {
        for k in PoiTable::TELEPORTS {
            let Some(tp) = a.world.pois().get(k) else {
                continue;
            };
            if tp.kind.0 != tp_kind {
                continue;
            }
            let d = dist(a, k, here) + dist(a, k0, tp.exit);
            if d < d_best {
                d_best = d;
                pick = Some((k, d));
            }
        }
    }

    if pick.is_some() {
        a.ch.reason = found;
    }
    pick
}

/// Whether `anchor` lies in the map quadrant `color` spawns in.
fn in_own_sector(anchor: Coord, color: usize) -> bool {
    let (x, y) = (anchor.x, anchor.y);
    match color {
        0 => x < 250 && y < 250,
        1 => x > 250 && y < 250,
        2 => x > 250 && y > 250,
        3 => x < 250 && y > 250,
        _ => false,
    }
}

/// Picks a fresh outer-ring area, measured from the team's own teleporter.
fn choose_outer(a: &mut Agent<'_>) -> Pick {
    let desired = a.rng.next(250);
    let origin = a.world.pois().anchor(a.color * 2);
    let mut best_adj = DIST_INFINITE;
    let mut pick = None;
    for k in (0..NUM_POI).filter(|&k| a.kind(k) == PoiKind::HARVEST2) {
        let d = dist(a, k, origin);
        if nearest_foe(a, k) < CROWDED_BY_FOES {
            continue;
        }
        let d_adj = (d - desired).abs() + a.ctx.areas.near(k, a.color) * CROWDING_PENALTY;
        if d_adj < best_adj {
            best_adj = d_adj;
            pick = Some((k, d));
        }
    }
    adopt(a, pick, "outer");
    pick
}

/// Picks a fresh inner-ring area, preferring the team's own sector.
fn choose_inner(a: &mut Agent<'_>) -> Pick {
    let desired = a.rng.next(250);
    let here = a.ch.coord;
    let mut best_adj = DIST_INFINITE;
    let mut pick = None;
    for k in (0..NUM_POI).filter(|&k| a.kind(k) == PoiKind::HARVEST1) {
        let d = dist(a, k, here);
        if nearest_foe(a, k) < CROWDED_BY_FOES {
            continue;
        }
        let mut d_adj = (d - desired).abs();
        if in_own_sector(a.world.pois().anchor(k), a.color) {
            d_adj = (f64::from(d) * 0.3) as i32;
        }
        d_adj += a.ctx.areas.near(k, a.color) * CROWDING_PENALTY;
        if d_adj < best_adj {
            best_adj = d_adj;
            pick = Some((k, d));
        }
    }
    adopt(a, pick, "inner");
    pick
}

/// A newly chosen area becomes the favourite; the very first choice also
/// switches the character to autonomous mode.
fn adopt(a: &mut Agent<'_>, pick: Pick, ring: &'static str) {
    match pick {
        Some((k, _)) => {
            if a.age() == a.ctx.intervals.till_automode() {
                a.ch.mode |= AiMode::AUTO_MODE;
            }
            a.ch.fav_harvest_poi = k as u8;
        }
        None => debug!(color = a.color, ring, "no harvest area to choose"),
    }
}

/// One step down the distance field of `k`, unless already close enough.
fn approach(a: &mut Agent<'_>, k: usize, mut d_best: i32) {
    let kind = a.kind(k);
    let precision = if kind.is_harvest() {
        10
    } else if kind == PoiKind::CENTER {
        // close enough to spot the merchants
        8
    } else if kind == PoiKind::BASE {
        12
    } else {
        // teleporters need the exact tile
        0
    };
    if d_best <= precision {
        a.ch.reason = reason::ALREADY_AT_POI;
        return;
    }

    if a.panic > 0 && !a.moves.is_empty() {
        a.moves.clear();
    }
    let here = a.ch.coord;
    for dx in -1..=1 {
        for dy in -1..=1 {
            let c = here.offset(dx, dy);
            if !c.is_inside_map() || c == here {
                continue;
            }
            let d = dist(a, k, c);
            if d < 0 || (a.world.base_map(c).is_avoided() && d > 0) {
                continue;
            }
            if d < d_best {
                d_best = d;
                a.first_choice(c);
            } else if a.success && d == d_best {
                a.add_choice(c);
            }
        }
    }

    if a.success {
        a.ch.poi = k as u8;
        a.pick_move();
    } else {
        a.ch.reason = reason::ALL_BLOCKED;
    }
}

/// Nothing to walk to: keep running if a flight step was found, otherwise
/// an old enough character settles where it is.
fn cornered(a: &mut Agent<'_>) {
    if !a.ch.role.is_monster_or_player() {
        return;
    }
    if a.panic > 0 && !a.moves.is_empty() {
        a.success = true;
        a.ch.reason = reason::RUN_CORNERED;
    } else if !a.ch.role.is_monster() && a.age() > a.ctx.intervals.till_automode() {
        a.ch.fav_harvest_poi = fav::STAY_HERE;
    }
}

// ============================================================================
// Dispersal
// ============================================================================

/// Random step for idle characters and characters stacked on a crowded
/// tile. Also rolls the outer-ring and duty flags right after spawning.
pub(super) fn disperse(a: &mut Agent<'_>) -> Status {
    let here = a.ch.coord;
    let h = a.h;
    if here.is_in_spawn_area() && a.ch.spawn_block == h - 1 {
        if h % 6 >= 3 {
            a.ch.mode |= AiMode::FARM_OUTER_RING;
        }
        if h % 7 >= 4 {
            a.ch.orders |= AiOrders::DUTY;
        }
    }

    let crowded = a.ctx.playermap.team(here, a.color) > a.myscore;
    if a.ch.idle_time < 4 && !crowded {
        return Status::Failure;
    }

    let world = a.world;
    let safe_here = is_safezone(here);
    for u in -1..=1 {
        for v in -1..=1 {
            let c = here.offset(u, v);
            if !c.is_inside_map() || !world.is_walkable(c) || c == here {
                continue;
            }
            // neither leave nor enter a safezone
            if safe_here != is_safezone(c) {
                continue;
            }
            // merchants and the banking zone
            if world.base_map(c).is_avoided() || c.is_in_spawn_area() {
                continue;
            }
            if !a.success {
                a.first_choice(c);
                a.ch.reason = reason::BORED;
            } else {
                a.add_choice(c);
            }
        }
    }
    if a.success {
        a.pick_move();
    }
    Status::from(a.success)
}

#[cfg(test)]
mod tests {
    use super::super::run;
    use super::*;
    use crate::config::GameConfig;
    use crate::engine::context::StepContext;
    use crate::env::StepRng;
    use crate::state::{BlockHash, CharacterState, Role};
    use crate::testing::{FIRST_HARVEST1, character_at, open_world};

    fn ctx_at(height: i32) -> StepContext {
        StepContext::new(height, &GameConfig::new())
    }

    fn turn(ch: &mut CharacterState, color: u8, ctx: &mut StepContext) {
        let mut rng = StepRng::new(&BlockHash::from_bytes([7; 32]));
        run(ch, color, open_world(), ctx, &mut rng).unwrap();
    }

    #[test]
    fn monster_heads_for_the_nearest_harvest_area() {
        let world = open_world();
        let here = Coord::new(160, 120);
        let mut ch = character_at(here);
        ch.role = Role::SPITTER;
        ch.fav_harvest_poi = fav::MONSTER_GO_TO_NEAREST;
        turn(&mut ch, 3, &mut ctx_at(5));

        // four areas tie at distance 20; the lowest index wins
        let k = FIRST_HARVEST1 + 12;
        assert_eq!(usize::from(ch.fav_harvest_poi), k);
        assert_eq!(usize::from(ch.poi), k);
        assert_eq!(ch.reason, reason::MONSTER_HARVEST);
        assert_eq!(world.poi_distance(k, ch.coord), 19);
    }

    #[test]
    fn shopper_walks_to_the_centre() {
        let mut ch = character_at(Coord::new(150, 150));
        ch.mode |= AiMode::AUTO_MODE;
        ch.loot.loot.amount = 150 * GameConfig::COIN;
        turn(&mut ch, 0, &mut ctx_at(5));

        assert_eq!(ch.reason, reason::VISIT_CENTER);
        assert_eq!(usize::from(ch.poi), PoiTable::CENTER);
        assert_eq!(ch.coord, Coord::new(151, 151));
    }

    #[test]
    fn inner_favourite_is_reached_through_the_teleporter() {
        let world = open_world();
        let k = FIRST_HARVEST1 + 36;
        let mut ch = character_at(Coord::new(25, 25));
        ch.fav_harvest_poi = k as u8;
        turn(&mut ch, 0, &mut ctx_at(5));

        assert_eq!(ch.reason, reason::TO_INNER_POI);
        assert_eq!(ch.poi, 0);
        assert_eq!(ch.coord, Coord::new(24, 24));
        assert_eq!(world.poi_distance(0, ch.coord), 4);
    }

    #[test]
    fn retreating_hunter_skips_the_teleporter() {
        let k = FIRST_HARVEST1 + 36;
        let mut ch = character_at(Coord::new(25, 25));
        ch.fav_harvest_poi = k as u8;
        let mut ctx = ctx_at(5);
        let mut rng = StepRng::new(&BlockHash::from_bytes([7; 32]));
        let mut a = Agent::new(&mut ch, 0, open_world(), &mut ctx, &mut rng);
        a.on_the_run = true;

        assert!(long_range(&mut a).is_success());
        assert_eq!(usize::from(a.ch.poi), k);
        assert_eq!(a.ch.reason, reason::TO_INNER_POI);
        assert_eq!(a.target.x, 26);
    }

    #[test]
    fn first_automode_block_chooses_an_inner_area() {
        let world = open_world();
        let mut ch = character_at(Coord::new(150, 150));
        ch.spawn_block = 5;
        turn(&mut ch, 0, &mut ctx_at(1_005));

        let k = usize::from(ch.fav_harvest_poi);
        assert_eq!(world.pois().kind(k), PoiKind::HARVEST1);
        assert!(ch.mode.contains(AiMode::AUTO_MODE));
    }

    #[test]
    fn crowded_outer_areas_are_skipped() {
        let mut ctx = ctx_at(1_005);
        for k in 0..NUM_POI {
            ctx.areas.nearest[k][1] = [5; 9];
        }
        let mut ch = character_at(Coord::new(150, 150));
        ch.spawn_block = 5;
        ch.mode |= AiMode::FARM_OUTER_RING;
        turn(&mut ch, 0, &mut ctx);
        assert_eq!(ch.fav_harvest_poi, fav::CHOOSE_NEW);
        assert!(!ch.mode.contains(AiMode::AUTO_MODE));
    }

    #[test]
    fn old_hunter_without_a_plan_stays_put() {
        let mut ch = character_at(Coord::new(150, 150));
        ch.spawn_block = 5;
        turn(&mut ch, 0, &mut ctx_at(1_005 + 1));
        assert_ne!(ch.fav_harvest_poi, fav::CHOOSE_NEW);

        let mut ctx = ctx_at(1_006);
        for k in 0..NUM_POI {
            ctx.areas.nearest[k][2] = [0; 9];
        }
        let mut ch = character_at(Coord::new(150, 150));
        ch.spawn_block = 5;
        turn(&mut ch, 0, &mut ctx);
        assert_eq!(ch.fav_harvest_poi, fav::STAY_HERE);
    }

    #[test]
    fn fresh_spawns_roll_their_flags() {
        // the rolls only happen on the spawn strip along the map edge
        let edge = Coord::new(0, 3);
        assert!(edge.is_in_spawn_area());
        let mut ch = character_at(edge);
        ch.spawn_block = 10;
        turn(&mut ch, 0, &mut ctx_at(11));
        assert!(ch.mode.contains(AiMode::FARM_OUTER_RING));
        assert!(ch.orders.contains(AiOrders::DUTY));
        assert_eq!(ch.idle_time, 1);

        let inside = Coord::new(3, 3);
        assert!(!inside.is_in_spawn_area());
        let mut ch = character_at(inside);
        ch.spawn_block = 10;
        turn(&mut ch, 0, &mut ctx_at(11));
        assert!(!ch.mode.contains(AiMode::FARM_OUTER_RING));
        assert!(!ch.orders.contains(AiOrders::DUTY));
    }

    #[test]
    fn crowded_tile_pushes_a_character_aside() {
        let here = Coord::new(150, 150);
        let mut ctx = ctx_at(5);
        *ctx.playermap.team_mut(here, 0).unwrap() = 5;
        let mut ch = character_at(here);
        ch.fav_harvest_poi = fav::STAY_HERE;
        turn(&mut ch, 0, &mut ctx);
        assert_eq!(ch.reason, reason::BORED);
        assert_eq!(ch.coord.dist_linf(here), 1);
    }
}
