//! Short-range scans over the local 21x21 window: ranged attacks, threats,
//! loot and shops, and the one step towards (or away from) what was found.

use tracing::debug;

use crate::config::GameConfig;
use crate::env::{MapOracle, is_near_center, is_safezone};
use crate::state::{AiMode, Coord, Role, TileFlags, Trinket, Weapon};

use super::super::context::StepContext;
use super::super::merchants::{merchant_offer, need_to_buy};
use super::super::rules::max_clevel_from_score;
use super::tree::Status;
use super::{Agent, COIN, TEAMS, fav, reason};

const NAV_CENTER: i32 = GameConfig::NAV_CENTER;

const VALUE_HEART: i64 = 100 * COIN;
const VALUE_WEAK_FOE: i64 = 2 * COIN;
/// Blocks between panicking and the recall amulet firing.
const RECALL_DELAY: i32 = 25;
/// Coins are ignored right after an apocalypse.
const COIN_BLACKOUT: i32 = 25;

fn mark(ctx: &mut StepContext, tile: Coord, color: usize, f: TileFlags) {
    if let Some(cell) = ctx.damage.team_mut(tile, color) {
        *cell |= f;
    }
}

// ============================================================================
// Ranged attack
// ============================================================================

/// Fires the spell or crossbow. Area spells mark every qualifying tile;
/// single-target weapons pick the nearest qualifying tile and fire once.
///
/// On equal distance the target in front of (or left of) the attacker wins,
/// which is why the scan direction depends on the facing.
pub(super) fn ranged_attack(a: &mut Agent<'_>) -> Status {
    let weapon = a.ch.weapon;
    let mut max_range = 0;
    if !a.ch.role.is_merchant() && weapon != Weapon::None {
        if weapon == Weapon::Xbow {
            max_range = 2;
        } else if a.clevel > 1 {
            max_range = if weapon == Weapon::Xbow3 { 3 } else { a.base_range };
        }
    }
    a.ch.range_for_display = max_range;

    let here = a.ch.coord;
    if is_safezone(here) || max_range <= 0 {
        return Status::Failure;
    }
    let r = max_range.min(NAV_CENTER);
    let world = a.world;
    let field = a.ctx.local_field(world, here);
    let reverse = a.ch.dir <= 3 || a.ch.dir == 6;
    let (color, clevel, base_range) = (a.color, a.clevel, a.base_range);

    let mut target_dist = super::super::context::DIST_INFINITE;
    let mut target = here;
    for n in 0..=2 * r {
        let i = if reverse { r - n } else { n - r };
        for m in 0..=2 * r {
            let j = if reverse { r - m } else { m - r };
            let tile = here.offset(i, j);
            let dist = field.offset(i, j);
            if dist <= 0 || !tile.is_inside_map() || !world.is_walkable(tile) {
                continue;
            }
            if is_safezone(tile) {
                continue;
            }

            for k in (0..TEAMS).filter(|&k| k != color) {
                if a.ctx.playermap.team(tile, k) == 0 {
                    continue;
                }
                let resist = a.ctx.damage.team(tile, k);
                match weapon {
                    Weapon::Death if dist <= base_range => {
                        let f = if clevel >= 3 {
                            TileFlags::DEATH1TO3
                        } else if clevel >= 2
                            && resist.intersects(TileFlags::RESIST_DEATH0 | TileFlags::RESIST_DEATH1)
                        {
                            TileFlags::DEATH1 | TileFlags::DEATH2
                        } else if resist.contains(TileFlags::RESIST_DEATH0) {
                            TileFlags::DEATH1
                        } else {
                            TileFlags::empty()
                        };
                        if !f.is_empty() {
                            mark(a.ctx, tile, k, f);
                            match a.rng.next(3) {
                                1 => a.ch.chat = 3,
                                2 => a.ch.chat = 6,
                                _ => {}
                            }
                        }
                    }
                    // weaker in the distance
                    Weapon::Poison if dist <= base_range => {
                        let f = if dist <= base_range - 2 {
                            TileFlags::POISON1TO3
                        } else if dist <= base_range - 1
                            && resist.intersects(TileFlags::RESIST_POISON0 | TileFlags::RESIST_POISON1)
                        {
                            TileFlags::POISON1 | TileFlags::POISON2
                        } else if resist.contains(TileFlags::RESIST_POISON0) {
                            TileFlags::POISON1
                        } else {
                            TileFlags::empty()
                        };
                        if !f.is_empty() {
                            mark(a.ctx, tile, k, f);
                            a.ch.chat = 2;
                        }
                    }
                    Weapon::Fire if dist <= base_range => {
                        let hurts = clevel >= 3
                            || (clevel >= 2
                                && resist.intersects(TileFlags::RESIST_FIRE0 | TileFlags::RESIST_FIRE1))
                            || resist.contains(TileFlags::RESIST_FIRE0);
                        if hurts && dist < target_dist {
                            target_dist = dist;
                            target = tile;
                        }
                    }
                    Weapon::Xbow | Weapon::Xbow3 => {
                        let reach = if weapon == Weapon::Xbow { 2 } else { 3 };
                        if dist <= reach
                            && resist.contains(TileFlags::RESIST_DEATH0)
                            && dist < target_dist
                        {
                            target_dist = dist;
                            target = tile;
                        }
                    }
                    // metal armor stops a lightning bolt
                    Weapon::Lightning if dist <= base_range => {
                        if resist.contains(TileFlags::RESIST_LIGHTNING0)
                            && !resist.intersects(
                                TileFlags::RESIST_LIGHTNING1 | TileFlags::RESIST_LIGHTNING2,
                            )
                            && dist < target_dist
                        {
                            target_dist = dist;
                            target = tile;
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    if target_dist == super::super::context::DIST_INFINITE || !target.is_inside_map() {
        return Status::Failure;
    }
    let foes = (0..TEAMS).filter(|&k| k != color);
    match weapon {
        Weapon::Fire => {
            let mut f = TileFlags::FIRE1;
            if clevel >= 2 {
                f |= TileFlags::FIRE2;
            }
            if clevel >= 3 {
                f |= TileFlags::FIRE3;
            }
            for k in foes {
                mark(a.ctx, target, k, f);
            }
            a.ch.chat = 1;
        }
        Weapon::Xbow | Weapon::Xbow3 => {
            for k in foes {
                mark(a.ctx, target, k, TileFlags::DEATH1);
            }
            a.ch.chat = 4;
        }
        Weapon::Lightning => {
            // splash onto the neighbours
            for k in foes {
                for dx in -1..=1 {
                    for dy in -1..=1 {
                        let t = target.offset(dx, dy);
                        if t.is_inside_map() {
                            mark(a.ctx, t, k, TileFlags::LIGHTNING1);
                        }
                    }
                }
            }
            a.ch.chat = 5;
        }
        _ => {}
    }
    Status::Failure
}

// ============================================================================
// Surroundings
// ============================================================================

/// What the window scan found worth walking to.
struct Sighting {
    best: i64,
    at: Coord,
    dist: i32,
    reason: u8,
}

impl Sighting {
    fn take(&mut self, value: i64, at: Coord, dist: i32, reason: u8) {
        self.best = value;
        self.at = at;
        self.dist = dist;
        self.reason = reason;
    }
}

/// Buys from a shop in sight when the item is worth more than anything else
/// seen so far and the character can pay the undiscounted price.
fn consider_shop(a: &mut Agent<'_>, seen: &mut Sighting, tile: Coord, dist: i32, role: Role) {
    let worth = need_to_buy(role);
    if a.ctx.merchants.is_open_at(a.world, role, tile)
        && worth > seen.best
        && a.ch.loot.amount() >= merchant_offer(role, 0, 0).cost()
    {
        a.success = true;
        seen.take(worth, tile, dist, reason::SHOP);
    }
}

/// Scans the window for threats, shops, weak foes, hearts and coins, then
/// weighs up survival and steps towards the best find (or away from the
/// threat). Returns success only when the recall amulet teleported the
/// character home.
pub(super) fn surroundings(a: &mut Agent<'_>) -> Status {
    if a.ch.role.is_merchant() {
        return Status::Failure;
    }

    let world = a.world;
    let here = a.ch.coord;
    let field = a.ctx.local_field(world, here);
    let mut friendlies = a.myscore;
    let mut threats = 0i32;
    let mut seen = Sighting {
        best: 0,
        at: here,
        dist: 0,
        reason: 0,
    };

    if a.ctx.hearts.at(here) {
        a.ch.mode |= AiMode::FULL_OF_HEARTS;
    }
    let color = a.color;
    let in_safezone = is_safezone(here);
    let visiting_center = a.wants_to_visit_center();
    let coins_worth_it = a.blocks_since_apocalypse() > COIN_BLACKOUT;

    for i in -NAV_CENTER..=NAV_CENTER {
        for j in -NAV_CENTER..=NAV_CENTER {
            let tile = here.offset(i, j);
            let dist = field.offset(i, j);
            if dist <= 0 || !tile.is_inside_map() || !world.is_walkable(tile) {
                continue;
            }
            // the window's own table may not reach back this far
            if dist >= NAV_CENTER {
                continue;
            }

            let heart = a.ctx.hearts.at(tile);
            let coins = a.ctx.coins.at(tile);
            if (heart || coins != 0) && a.ch.mapitem_count < 9 {
                a.ch.mapitem_count += 1;
            }

            if !in_safezone {
                let mut hostile = 0i32;
                for k in 0..TEAMS {
                    let n2 = a.ctx.playermap.team(tile, k);
                    if k == color {
                        friendlies += n2;
                        continue;
                    }
                    threats += n2;

                    let foe_level = max_clevel_from_score(n2);
                    if foe_level > a.clevel && a.panic < 1 + foe_level - a.clevel {
                        a.panic = 1 + foe_level - a.clevel;
                        a.panic_foelevel = foe_level;
                        a.panic_at = tile;
                        a.panic_dist = dist;
                        debug!(%here, threat = %tile, dist, "outclassed, panicking");
                    }
                    if a.panic == 0
                        && foe_level >= a.clevel
                        && (a.panic_dist == 0 || dist < a.panic_dist)
                    {
                        a.panic_at = tile;
                        a.panic_dist = dist;
                    }
                    // weaklings do not count
                    hostile += n2 / a.myscore;
                }
                if hostile > 0 {
                    let total = i32::from(a.ch.foe_count) + hostile;
                    a.ch.foe_count = total.min(255) as u8;
                    if dist < i32::from(a.ch.foe_dist) {
                        a.ch.foe_dist = dist as u8;
                    }
                }
            }

            // autonomous shopping; monsters never shop
            if a.ch.mode.contains(AiMode::AUTO_MODE) && !a.ch.role.is_monster() {
                if a.ch.amulet == Trinket::None {
                    consider_shop(a, &mut seen, tile, dist, Role::AMULET_WORD_RECALL);
                }
                if a.ch.weapon == Weapon::None {
                    let staff = match a.h % 100 {
                        0..=33 => Role::STAFF_FIREBALL,
                        34..=66 => Role::STAFF_REAPER,
                        _ => Role::STINKING_CLOUD,
                    };
                    consider_shop(a, &mut seen, tile, dist, staff);
                }
                if a.ch.ring == Trinket::None {
                    consider_shop(a, &mut seen, tile, dist, Role::RING_WORD_RECALL);
                }
                // the ring frees the amulet slot
                if a.ch.ring == Trinket::WordOfRecall
                    && matches!(a.ch.amulet, Trinket::None | Trinket::WordOfRecall)
                {
                    let amulet = if a.ch.status.contains(crate::state::AiStatus::ESSENTIAL) {
                        Role::AMULET_LIFE_SAVING
                    } else {
                        Role::AMULET_REGEN
                    };
                    consider_shop(a, &mut seen, tile, dist, amulet);
                }
            }

            let value = i64::from(dist);
            if a.ch.role.is_monster()
                && !a.on_the_run
                && dist <= GameConfig::MONSTER_DETECTION_RANGE
                && !is_safezone(tile)
                && seen.best < VALUE_WEAK_FOE / value
            {
                for c in (0..TEAMS).filter(|&c| c != color) {
                    let foescore = a.ctx.playermap.team(tile, c);
                    if foescore > 0 && foescore < a.myscore {
                        a.success = true;
                        seen.take(VALUE_WEAK_FOE / value, tile, dist, reason::ENGAGE);
                        if a.ch.mapitem_count < 100 {
                            a.ch.mapitem_count += 10;
                        }
                    }
                }
            }

            if !a.ch.mode.contains(AiMode::FULL_OF_HEARTS)
                && !a.on_the_run
                && heart
                && seen.best < VALUE_HEART / value
            {
                a.success = true;
                seen.take(VALUE_HEART / value, tile, dist, reason::SHINY);
            }

            if coins_worth_it && !a.on_the_run && !visiting_center && coins / value > seen.best {
                a.success = true;
                seen.take(coins / value, tile, dist, reason::SHINY);
            }
        }
    }

    weigh_survival(a, &mut seen, friendlies, threats);

    if recall_tick(a) {
        return Status::Success;
    }

    if a.success {
        step_towards(a, &seen);
    }

    // when running away the long range planner always gets a say
    if a.panic > 0 && a.ch.role.is_monster_or_player() {
        a.success = false;
        a.ch.fav_harvest_poi = fav::CHOOSE_NEW;
    }

    let f = a.fav();
    if f > 0 && f < GameConfig::NUM_POI {
        let kind = a.kind(f);
        a.set_farm_outer(
            kind == crate::env::PoiKind::HARVEST2 || kind == crate::env::PoiKind::BASE,
        );
    }
    Status::Failure
}

/// Panics when hostile strength in view outweighs the friendly one; the
/// threshold depends on who is counting and on the game mode.
fn weigh_survival(a: &mut Agent<'_>, seen: &mut Sighting, friendlies: i32, threats: i32) {
    if !a.ch.role.is_monster_or_player() {
        return;
    }
    let mut threshold = friendlies;
    if a.ch.role.is_monster() || a.ctx.census.berzerk {
        threshold *= 2;
    } else if a.ctx.devmode == 6 || a.ch.mode.contains(AiMode::SURVIVAL) {
        threshold /= 2;
    }

    if a.panic == 0
        && a.ctx.devmode != 7
        && threats >= threshold
        && a.panic_at != a.ch.coord
        && a.panic_dist > 0
    {
        a.panic = 1;
        a.panic_foelevel = a.clevel;
    }

    if a.panic > 0 {
        a.ch.fav_harvest_poi = fav::CHOOSE_NEW;
        if a.panic_at.is_inside_map() {
            a.success = true;
            seen.take(seen.best, a.panic_at, a.panic_dist, reason::PANIC);
        }
    }
}

/// Word of Recall fires a fixed number of blocks after the panic started.
/// Returns true once it teleported the character.
fn recall_tick(a: &mut Agent<'_>) -> bool {
    if a.ch.recall_timer == 0 && a.panic > 0 && a.can_recall() {
        a.ch.recall_timer = RECALL_DELAY;
    } else if a.ch.recall_timer > 0 && a.panic == 0 {
        a.ch.recall_timer = 0;
    } else if a.ch.recall_timer > 0 {
        a.ch.recall_timer -= 1;
        if a.ch.recall_timer == 0 {
            // somewhere else next time
            let near_center = is_near_center(a.ch.coord);
            a.set_farm_outer(near_center);
            a.ch.fav_harvest_poi = fav::CHOOSE_NEW;

            let exit = a
                .world
                .pois()
                .get(a.color * 2 + 1)
                .map_or(a.ch.coord, |p| p.exit);
            debug!(from = %a.ch.coord, to = %exit, "word of recall");
            a.settle(exit, false);
            return true;
        }
    }
    false
}

/// One step along the target's local distance table. A panicking character
/// takes whichever neighbour changes the distance, preferring larger ones
/// found later in the scan.
fn step_towards(a: &mut Agent<'_>, seen: &Sighting) {
    let world = a.world;
    let here = a.ch.coord;
    let field = a.ctx.local_field(world, seen.at);
    let i = NAV_CENTER + here.x - seen.at.x;
    let j = NAV_CENTER + here.y - seen.at.y;
    let panic = a.panic > 0;

    let mut found = false;
    let mut d_best = seen.dist;
    let mut code = seen.reason;
    for i2 in i - 1..=i + 1 {
        for j2 in j - 1..=j + 1 {
            let d = field.at(i2, j2);
            if d < 0 {
                continue;
            }
            let next = here.offset(i2 - i, j2 - j);
            let usable = next.is_inside_map() && (!world.base_map(next).is_avoided() || d == 0);
            if d < d_best || (panic && d > d_best) {
                if usable {
                    d_best = d;
                    a.first_choice(next);
                    found = true;
                    if panic {
                        code = reason::RUN;
                    }
                }
            } else if found && d == d_best && usable {
                a.add_choice(next);
            }
        }
    }

    if found {
        a.ch.reason = code;
        a.pick_move();
    } else if panic {
        debug!(%here, threat = %seen.at, "cornered");
        a.success = false;
        a.ch.reason = reason::GAME_OVER;
    } else {
        // an NPC on an exact diagonal blocks the way
        a.success = false;
        a.ch.reason = reason::NPC_IN_WAY;
    }
}

#[cfg(test)]
mod tests {
    use super::super::run;
    use super::*;
    use crate::engine::rules::score_from_clevel;
    use crate::env::{StepRng, World};
    use crate::state::{AiStatus, BlockHash, CharacterState};
    use crate::testing::{character_at, open_world};

    fn ctx_at(height: i32) -> StepContext {
        StepContext::new(height, &GameConfig::new())
    }

    fn turn(ch: &mut CharacterState, color: u8, ctx: &mut StepContext) {
        let mut rng = StepRng::new(&BlockHash::from_bytes([7; 32]));
        run(ch, color, open_world(), ctx, &mut rng).unwrap();
    }

    fn place(ctx: &mut StepContext, tile: Coord, color: usize, score: i32) {
        *ctx.playermap.team_mut(tile, color).unwrap() += score;
    }

    #[test]
    fn fireball_burns_the_nearest_foe_tile() {
        let mut ctx = ctx_at(5);
        let here = Coord::new(150, 150);
        let foe = Coord::new(152, 150);
        place(&mut ctx, foe, 1, 1);
        *ctx.damage.team_mut(foe, 1).unwrap() |= TileFlags::RESIST_FIRE0;

        let mut ch = character_at(here);
        ch.weapon = Weapon::Fire;
        ch.loot.loot.amount = 400 * COIN;
        turn(&mut ch, 0, &mut ctx);

        assert_eq!(ch.range_for_display, 4);
        assert_eq!(ch.chat, 1);
        assert!(ctx.damage.team(foe, 1).contains(TileFlags::FIRE1TO3));
        assert!(ctx.damage.team(foe, 2).contains(TileFlags::FIRE1TO3));
        assert!(!ctx.damage.team(foe, 0).intersects(TileFlags::FIRE1TO3));
    }

    #[test]
    fn poison_weakens_with_distance() {
        let mut ctx = ctx_at(5);
        let here = Coord::new(150, 150);
        let near = Coord::new(151, 150);
        let far = Coord::new(150, 155);
        for tile in [near, far] {
            place(&mut ctx, tile, 2, 1);
            *ctx.damage.team_mut(tile, 2).unwrap() |= TileFlags::RESIST_POISON0;
        }

        let mut ch = character_at(here);
        ch.weapon = Weapon::Poison;
        ch.loot.loot.amount = 800 * COIN; // level 5, range 5
        turn(&mut ch, 0, &mut ctx);

        assert!(ctx.damage.team(near, 2).contains(TileFlags::POISON1TO3));
        assert_eq!(
            ctx.damage.team(far, 2) & TileFlags::POISON1TO3,
            TileFlags::POISON1
        );
        assert_eq!(ch.chat, 2);
    }

    #[test]
    fn nothing_fires_inside_a_safezone() {
        let mut ctx = ctx_at(5);
        let here = Coord::new(10, 10);
        let foe = Coord::new(11, 10);
        place(&mut ctx, foe, 1, 1);
        *ctx.damage.team_mut(foe, 1).unwrap() |= TileFlags::RESIST_FIRE0;

        let mut ch = character_at(here);
        ch.weapon = Weapon::Fire;
        ch.loot.loot.amount = 400 * COIN;
        ch.fav_harvest_poi = fav::STAY_HERE;
        turn(&mut ch, 0, &mut ctx);
        assert!(!ctx.damage.team(foe, 1).intersects(TileFlags::FIRE1TO3));
        assert_eq!(ch.chat, 0);
    }

    #[test]
    fn monster_engages_a_weaker_foe() {
        let mut ctx = ctx_at(5);
        let here = Coord::new(150, 150);
        place(&mut ctx, Coord::new(153, 150), 1, 1);

        let mut ch = character_at(here);
        ch.role = Role::REAPER;
        ch.weapon = Weapon::Death;
        ch.loot.loot.amount = 100 * COIN;
        turn(&mut ch, 0, &mut ctx);

        assert_eq!(ch.reason, reason::ENGAGE);
        assert_eq!(ch.coord.x, 151);
        assert!(ch.mode.contains(AiMode::NORMAL_STEP));
    }

    #[test]
    fn outclassed_hunter_retreats_far_away() {
        let world: &World = open_world();
        let mut ctx = ctx_at(5);
        let here = Coord::new(150, 150);
        place(&mut ctx, Coord::new(152, 150), 1, score_from_clevel(3));

        let mut ch = character_at(here);
        turn(&mut ch, 0, &mut ctx);

        let k = usize::from(ch.fav_harvest_poi);
        assert_eq!(ch.retreat, reason::RETREAT_GOOD);
        assert!(world.pois().kind(k).is_harvest());
        assert!(world.poi_distance(k, here) >= 100);
        assert_eq!(usize::from(ch.poi), k);
        assert_eq!(ch.coord.dist_linf(here), 1);
        assert!(world.poi_distance(k, ch.coord) < world.poi_distance(k, here));
    }

    #[test]
    fn recall_amulet_fires_after_its_delay() {
        let world = open_world();
        let mut ctx = ctx_at(5);
        let here = Coord::new(150, 150);
        place(&mut ctx, Coord::new(152, 150), 1, score_from_clevel(3));

        let mut ch = character_at(here);
        ch.amulet = Trinket::WordOfRecall;
        turn(&mut ch, 0, &mut ctx);
        assert_eq!(ch.recall_timer, RECALL_DELAY);

        let mut ch = character_at(here);
        ch.amulet = Trinket::WordOfRecall;
        ch.recall_timer = 1;
        turn(&mut ch, 0, &mut ctx);
        assert_eq!(ch.coord, world.pois().get(1).unwrap().exit);
        assert_eq!(ch.recall_timer, 0);
        assert!(ch.mode.contains(AiMode::FARM_OUTER_RING));
        assert!(!ch.status.contains(AiStatus::NORMAL_TP));
    }

    #[test]
    fn calm_hunter_forgets_the_recall_timer() {
        let mut ch = character_at(Coord::new(150, 150));
        ch.recall_timer = 10;
        ch.fav_harvest_poi = fav::STAY_HERE;
        turn(&mut ch, 0, &mut ctx_at(5));
        assert_eq!(ch.recall_timer, 0);
    }

    #[test]
    fn autonomous_hunter_walks_to_an_open_shop() {
        let world = open_world();
        let mut ctx = ctx_at(5);
        let role = Role::AMULET_WORD_RECALL;
        let shop = world.merchants().base(role).unwrap();
        ctx.merchants.exists[role.index()] = true;
        ctx.merchants.pos[role.index()] = shop;

        let here = shop.offset(0, 4);
        let mut ch = character_at(here);
        ch.mode |= AiMode::AUTO_MODE;
        ch.loot.loot.amount = 50 * COIN;
        turn(&mut ch, 0, &mut ctx);

        assert_eq!(ch.reason, reason::SHOP);
        assert_eq!(ch.coord.y, here.y - 1);
    }

    #[test]
    fn hearts_are_worth_a_detour() {
        let mut ctx = ctx_at(5);
        let heart = Coord::new(150, 155);
        ctx.hearts.set(heart, true);

        let mut ch = character_at(Coord::new(150, 150));
        turn(&mut ch, 0, &mut ctx);
        assert_eq!(ch.reason, reason::SHINY);
        assert_eq!(ch.coord.y, 151);
        assert_eq!(ch.mapitem_count, 1);
    }
}
