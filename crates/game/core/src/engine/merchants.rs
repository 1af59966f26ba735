//! Merchant counters, prices and the start of every character's turn.
//!
//! A hunter standing on the home tile of a merchant that is present trades
//! with it: items are paid in whole coins, books and canteens are free and
//! only change the character's registers. Coins paid here are credited to
//! the merchant in Pass 3.

use tracing::{debug, trace};

use crate::config::GameConfig;
use crate::env::{MapOracle, PoiTable, World};
use crate::error::ErrorContext;
use crate::state::{
    AiMode, AiOrders, AiStatus, Armor, CharacterState, CollectedLootInfo, Coord, Role, Trinket,
    Weapon,
};

use super::context::StepContext;
use super::errors::InvariantViolation;

const COIN: i64 = GameConfig::COIN;

/// Waypoint announcing a smuggled name in the following waypoints.
pub const SMUGGLE_MARKER: Coord = Coord::new(0, 21);
/// Characters packed into the two scratch slots.
const SMUGGLED_NAME_MAX: usize = 18;

/// Base price in whole coins; zero for merchants that sell nothing.
pub const fn base_price(role: Role) -> i64 {
    match role {
        Role::ARMOR_RING => 20,
        Role::ARMOR_CHAIN => 35,
        Role::ARMOR_SPLINT => 50,
        Role::ARMOR_PLATE => 80,
        Role::STINKING_CLOUD
        | Role::RING_WORD_RECALL
        | Role::STAFF_FIREBALL
        | Role::STAFF_REAPER
        | Role::WEAPON_SWORD => 10,
        Role::AMULET_LIFE_SAVING | Role::WEAPON_ESTOC | Role::WEAPON_XBOW => 20,
        Role::AMULET_REGEN => 25,
        Role::WEAPON_XBOW3 => 30,
        Role::STAFF_LIGHTNING => 15,
        _ => 0,
    }
}

/// Current price of a merchant's item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Offer {
    /// Whole coins.
    pub price: i64,
    /// Percent taken off the base price.
    pub discount: i64,
}

impl Offer {
    pub const fn cost(&self) -> i64 {
        self.price * COIN
    }
}

/// Price at `height` for a merchant whose last sale was at `last_sale`.
/// Slow sellers drop their price by 10, 20 or 30 percent after 1000, 2000
/// or 5000 blocks without a sale.
pub fn merchant_offer(role: Role, height: i32, last_sale: i32) -> Offer {
    let base = base_price(role);
    if height <= 0 {
        return Offer {
            price: base,
            discount: 0,
        };
    }
    let idle = height - last_sale;
    let discount = match idle {
        i if i > 5_000 => 30,
        i if i > 2_000 => 20,
        i if i > 1_000 => 10,
        _ => 0,
    };
    Offer {
        price: base * (100 - discount) / 100,
        discount,
    }
}

/// How much the autonomous shopper values a merchant's item, in satoshi.
pub const fn need_to_buy(role: Role) -> i64 {
    match role {
        Role::AMULET_WORD_RECALL => 2_000 * COIN,
        Role::STINKING_CLOUD => 1_500 * COIN,
        Role::STAFF_FIREBALL => 1_400 * COIN,
        Role::STAFF_REAPER => 1_300 * COIN,
        Role::RING_WORD_RECALL => 1_000 * COIN,
        Role::AMULET_LIFE_SAVING => 900 * COIN,
        Role::AMULET_REGEN => 800 * COIN,
        _ => 0,
    }
}

/// Counters in the order a hunter's tile is checked against them.
const COUNTERS: [Role; 24] = [
    Role::STINKING_CLOUD,
    Role::STAFF_FIREBALL,
    Role::STAFF_REAPER,
    Role::AMULET_WORD_RECALL,
    Role::RING_WORD_RECALL,
    Role::AMULET_LIFE_SAVING,
    Role::AMULET_REGEN,
    Role::ARMOR_RING,
    Role::ARMOR_CHAIN,
    Role::ARMOR_SPLINT,
    Role::ARMOR_PLATE,
    Role::WEAPON_ESTOC,
    Role::WEAPON_SWORD,
    Role::WEAPON_XBOW,
    Role::WEAPON_XBOW3,
    Role::CHAMPION_TEST,
    Role::BOOK_MARK_RECALL,
    Role::BOOK_RESTING,
    Role::BOOK_SURVIVAL,
    Role::BOOK_CONQUEST,
    Role::CANTEEN_FANATISM,
    Role::CANTEEN_DUTY,
    Role::CANTEEN_FREEDOM,
    Role::STAFF_LIGHTNING,
];

/// Pays `role` for its item if it is present and the purse is deep enough.
fn pay(loot: &mut CollectedLootInfo, role: Role, ctx: &mut StepContext) -> bool {
    if !ctx.merchants.exists(role) {
        return false;
    }
    let last_sale = ctx.merchants.last_sale.get(role.index()).copied().unwrap_or(0);
    let cost = merchant_offer(role, ctx.height, last_sale).cost();
    if loot.amount() < cost {
        return false;
    }
    loot.loot.amount -= cost;
    if let Some(sats) = ctx.merchants.sats_received.get_mut(role.index()) {
        *sats += cost;
    }
    true
}

macro_rules! buy {
    ($ch:ident . $slot:ident, $item:expr, $role:expr, $ctx:expr) => {
        if $ch.$slot != $item && pay(&mut $ch.loot, $role, $ctx) {
            $ch.$slot = $item;
            debug!(role = %$role, item = %$item, "item bought");
        }
    };
}

fn trade(ch: &mut CharacterState, role: Role, color: usize, ctx: &mut StepContext) {
    match role {
        Role::STINKING_CLOUD => buy!(ch.weapon, Weapon::Poison, role, ctx),
        Role::STAFF_FIREBALL => buy!(ch.weapon, Weapon::Fire, role, ctx),
        Role::STAFF_REAPER => buy!(ch.weapon, Weapon::Death, role, ctx),
        Role::AMULET_WORD_RECALL => ch.amulet = Trinket::WordOfRecall,
        Role::RING_WORD_RECALL => buy!(ch.ring, Trinket::WordOfRecall, role, ctx),
        Role::AMULET_LIFE_SAVING => buy!(ch.amulet, Trinket::LifeSaving, role, ctx),
        // listed with a price, handed out for free
        Role::AMULET_REGEN => ch.amulet = Trinket::Regen,
        Role::ARMOR_RING => buy!(ch.armor, Armor::Ring, role, ctx),
        Role::ARMOR_CHAIN => buy!(ch.armor, Armor::Chain, role, ctx),
        Role::ARMOR_SPLINT => buy!(ch.armor, Armor::Splint, role, ctx),
        Role::ARMOR_PLATE => buy!(ch.armor, Armor::Plate, role, ctx),
        Role::WEAPON_ESTOC => buy!(ch.weapon, Weapon::Estoc, role, ctx),
        Role::WEAPON_SWORD => buy!(ch.weapon, Weapon::Knight, role, ctx),
        Role::WEAPON_XBOW => buy!(ch.weapon, Weapon::Xbow, role, ctx),
        Role::WEAPON_XBOW3 => buy!(ch.weapon, Weapon::Xbow3, role, ctx),
        Role::STAFF_LIGHTNING => buy!(ch.weapon, Weapon::Lightning, role, ctx),
        Role::CHAMPION_TEST => {
            if ch.survival_points >= ctx.intervals.champion_required_sp(ctx.height) {
                if let Some(champion) = ctx.champions.get_mut(color) {
                    champion.command = ch.queued_harvest_poi;
                }
                ch.survival_points = 0;
                debug!(color, poi = ch.queued_harvest_poi, "champion commanded");
            }
        }
        Role::BOOK_MARK_RECALL => {
            ch.mode |= AiMode::SURVIVAL | AiMode::RESTING | AiMode::MARK_RECALL;
        }
        Role::BOOK_RESTING => {
            ch.mode |= AiMode::SURVIVAL | AiMode::RESTING;
            ch.mode.remove(AiMode::MARK_RECALL);
        }
        Role::BOOK_SURVIVAL => {
            ch.mode |= AiMode::SURVIVAL;
            ch.mode.remove(AiMode::RESTING | AiMode::MARK_RECALL);
        }
        Role::BOOK_CONQUEST => {
            ch.mode.remove(AiMode::SURVIVAL | AiMode::RESTING | AiMode::MARK_RECALL);
        }
        Role::CANTEEN_FANATISM => ch.orders |= AiOrders::DUTY | AiOrders::FANATISM,
        Role::CANTEEN_DUTY => {
            ch.orders |= AiOrders::DUTY;
            ch.orders.remove(AiOrders::FANATISM);
        }
        Role::CANTEEN_FREEDOM => {
            ch.duty_harvest_poi = 0;
            ch.orders.remove(AiOrders::DUTY | AiOrders::FANATISM);
        }
        _ => {}
    }
}

/// Decodes a name smuggled through the waypoint list.
///
/// When the next waypoint is [`SMUGGLE_MARKER`], up to nine following
/// waypoints carry two printable ASCII characters each (`x` then `y`). The
/// marker and the consumed waypoints are removed. A pair whose `x` is not
/// printable ends the name, `_` stands for a space, and the characters are
/// packed 7 bits each, last character first, into `aux_storage_u1`
/// (characters 0 to 8) and `aux_storage_u2` (characters 9 to 17).
///
/// Returns whether a marker was found.
pub fn decode_smuggled_name(ch: &mut CharacterState) -> bool {
    if ch.waypoints.last() != Some(&SMUGGLE_MARKER) {
        return false;
    }

    let printable = 32..=126;
    let mut buf = [0u8; SMUGGLED_NAME_MAX + 2];
    let mut count = 0usize;
    ch.aux_storage_u1 = 0;
    ch.aux_storage_u2 = 0;
    for w in 0..10 {
        ch.waypoints.pop();
        if w > 8 || count < w * 2 {
            break;
        }
        let Some(&c) = ch.waypoints.last() else {
            break;
        };
        if printable.contains(&c.x) {
            buf[count] = c.x as u8;
            count += 1;
            if printable.contains(&c.y) {
                buf[count] = c.y as u8;
                count += 1;
            }
        }
    }

    for (v, &b) in buf.iter().enumerate().take(SMUGGLED_NAME_MAX).rev() {
        if b == 0 {
            continue;
        }
        let b = u64::from(if b == b'_' { b' ' } else { b });
        if v >= 9 {
            ch.aux_storage_u2 = ch.aux_storage_u2 * 128 + b;
        } else {
            ch.aux_storage_u1 = ch.aux_storage_u1 * 128 + b;
        }
    }
    true
}

/// Where an escaping character lands: monsters go to their home pit, every
/// one else to the exit of their team's base teleporter.
pub fn escape_anchor(world: &World, role: Role, color: usize) -> Coord {
    let pois = world.pois();
    if role.is_monster() {
        let first = *PoiTable::MONSTER_HOMES.start();
        let offset = match role {
            Role::REAPER => 4,
            Role::REDHEAD => 8,
            _ => 0,
        };
        let mut home = first + offset + color;
        if !PoiTable::MONSTER_HOMES.contains(&home) {
            home = first;
        }
        pois.anchor(home)
    } else {
        pois.get(color * 2 + 1).map_or(Coord::ORIGIN, |p| p.exit)
    }
}

/// First half of a character's turn: resets the per-step registers, decodes
/// a smuggled name, trades with a merchant under a hunter and performs a
/// pending escape.
pub fn visit(
    ch: &mut CharacterState,
    color: u8,
    world: &World,
    ctx: &mut StepContext,
) -> Result<(), InvariantViolation> {
    let color = usize::from(color);
    if color >= GameConfig::NUM_TEAM_COLORS || !ch.coord.is_inside_map() {
        ch.from = ch.coord;
        return Err(InvariantViolation::BadPosition {
            color,
            context: ErrorContext::new(ctx.height).with_coord(ch.coord),
        });
    }

    ch.mapitem_count = 0;
    ch.foe_count = 0;
    ch.foe_dist = 255;
    ch.poi = 255;
    ch.mode.remove(AiMode::NORMAL_STEP);
    ch.status.remove(AiStatus::NORMAL_TP);
    ch.chat = 0;

    if decode_smuggled_name(ch) {
        trace!(u1 = ch.aux_storage_u1, u2 = ch.aux_storage_u2, "smuggled name decoded");
    }

    if ch.role == Role::PLAYER {
        let at = ch.coord;
        if let Some(&role) = COUNTERS
            .iter()
            .find(|&&r| ctx.merchants.is_open_at(world, r, at))
        {
            trade(ch, role, color, ctx);
        }
        ch.status.remove(AiStatus::ESSENTIAL);
    }

    if !ch.role.is_merchant() && !world.is_walkable(ch.coord) {
        ch.status |= AiStatus::ESCAPE;
    }

    if ch.status.contains(AiStatus::ESCAPE) {
        ch.status.remove(AiStatus::ESCAPE);
        ch.coord = escape_anchor(world, ch.role, color);
        ch.idle_time = 0;
        ch.retreat = 0;
        ch.stop_moving();
        debug!(coord = %ch.coord, role = %ch.role, "escaped");
    }
    Ok(())
}
