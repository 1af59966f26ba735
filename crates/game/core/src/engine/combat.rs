//! Melee damage, hitscan resolution and the NPC payment passes.

use tracing::{debug, trace};

use crate::config::GameConfig;
use crate::env::{MapOracle, World, is_safezone};
use crate::state::{AiMode, AiStatus, Armor, CharacterState, Coord, GameState, Role, TileFlags, Weapon};

use super::context::StepContext;
use super::rules::{clevel_from_loot, combat_clevel};

const TEAMS: usize = GameConfig::NUM_TEAM_COLORS;

/// Damage one character deals to every adjacent tile of the other teams.
fn melee_flags(ch: &CharacterState) -> TileFlags {
    let clevel = combat_clevel(ch);
    let mut flags = TileFlags::DEATH1;
    match ch.weapon {
        Weapon::Knight if clevel >= 2 => flags |= TileFlags::DEATH2,
        Weapon::Estoc => {
            if clevel >= 2 {
                flags |= TileFlags::DEATH2;
            }
            if clevel >= 3 {
                flags |= TileFlags::DEATH3;
            }
        }
        _ => {}
    }
    flags
}

/// Start of Pass 2: charges the bounty NPC for its payout and lays down the
/// melee damage of every character.
pub fn melee(state: &mut GameState, ctx: &mut StepContext) {
    for player in state.players.values_mut() {
        let color = usize::from(player.color);
        for ch in player.characters.values_mut() {
            if ctx.bounty.paid > 0 && ch.role == Role::INFO_DEVMODE {
                ch.loot.loot.amount -= ctx.bounty.paid;
                ctx.bounty.paid = 0;
            }

            let Coord { x, y } = ch.coord;
            if !ch.coord.is_inside_map() || is_safezone(ch.coord) || ch.role.is_merchant() {
                continue;
            }
            if color >= TEAMS {
                continue;
            }
            let flags = melee_flags(ch);
            for v in y - 1..=y + 1 {
                for u in x - 1..=x + 1 {
                    let tile = Coord::new(u, v);
                    for k in (0..TEAMS).filter(|&k| k != color) {
                        if let Some(f) = ctx.damage.team_mut(tile, k) {
                            *f |= flags;
                        }
                    }
                }
            }
        }
    }
}

/// One damage school as seen by a victim.
struct School {
    any: TileFlags,
    /// Hits a level 2 victim that resists.
    strong: TileFlags,
    /// Hits a level 3+ victim that resists.
    strongest: TileFlags,
    death: AiStatus,
}

const FIRE: School = School {
    any: TileFlags::FIRE1TO3,
    strong: TileFlags::FIRE2.union(TileFlags::FIRE3),
    strongest: TileFlags::FIRE3,
    death: AiStatus::DEATH_FIRE,
};

const POISON: School = School {
    any: TileFlags::POISON1TO3,
    strong: TileFlags::POISON2.union(TileFlags::POISON3),
    strongest: TileFlags::POISON3,
    death: AiStatus::DEATH_POISON,
};

const DEATH: School = School {
    any: TileFlags::DEATH1TO3,
    strong: TileFlags::DEATH2.union(TileFlags::DEATH3),
    strongest: TileFlags::DEATH3,
    death: AiStatus::DEATH_DEATH,
};

const LIGHTNING: School = School {
    any: TileFlags::LIGHTNING1TO3,
    strong: TileFlags::LIGHTNING2.union(TileFlags::LIGHTNING3),
    strongest: TileFlags::LIGHTNING3,
    death: AiStatus::DEATH_LIGHTNING,
};

impl School {
    /// Death flag caused by `f` on a victim of level `clevel`.
    fn resolve(&self, f: TileFlags, clevel: i32, resists: bool) -> AiStatus {
        if !f.intersects(self.any) {
            return AiStatus::empty();
        }
        if resists && clevel > 1 {
            let pierce = if clevel == 2 { self.strong } else { self.strongest };
            if f.intersects(pierce) {
                self.death
            } else {
                AiStatus::empty()
            }
        } else {
            self.death
        }
    }
}

/// Death flags dealt to `ch`, standing on a tile with damage mask `f`.
pub fn hitscan_flags(ch: &CharacterState, f: TileFlags) -> AiStatus {
    let clevel = clevel_from_loot(ch.loot.amount());
    let mut status = AiStatus::empty();
    status |= FIRE.resolve(f, clevel, ch.armor >= Armor::Splint || ch.role == Role::REDHEAD);
    status |= POISON.resolve(f, clevel, ch.armor >= Armor::Chain || ch.role == Role::SPITTER);
    status |= DEATH.resolve(f, clevel, ch.armor >= Armor::Ring || ch.role == Role::REAPER);
    status |= LIGHTNING.resolve(f, clevel, ch.armor == Armor::Plate);
    status
}

/// Tile a character left this step, from its facing.
fn previous_tile(ch: &CharacterState) -> Coord {
    let Coord { mut x, mut y } = ch.coord;
    if ch.mode.contains(AiMode::NORMAL_STEP) {
        if ch.dir <= 3 {
            y -= 1;
        } else if ch.dir >= 7 {
            y += 1;
        }
        match ch.dir % 3 {
            1 => x += 1,
            0 => x -= 1,
            _ => {}
        }
    }
    Coord::new(x, y)
}

/// Pass 3: NPC payouts, ranged hits, merchant income and champion orders.
pub fn hitscan_and_payments(state: &mut GameState, world: &World, ctx: &mut StepContext) {
    let h = ctx.height;
    for (name, player) in state.players.iter_mut() {
        let color = usize::from(player.color);
        for (&index, ch) in player.characters.iter_mut() {
            for payment in ctx.payments.iter_mut() {
                if payment.value != 0 && payment.payee == *name {
                    ch.loot.credit(payment.value, h);
                    debug!(payee = %name, value = payment.value, "payment delivered");
                    payment.value = 0;
                }
            }

            let role = ch.role;
            if !role.is_merchant() {
                let tile = previous_tile(ch);
                if world.is_walkable(tile) && !is_safezone(tile) {
                    let f = ctx.damage.team(tile, color);
                    let hit = hitscan_flags(ch, f);
                    ch.status |= hit;
                    if ch.is_dead_flagged() {
                        ch.coord = tile;
                        trace!(player = %name, index, ?hit, "character hit");
                    }
                }
            }

            if role.is_merchant() {
                let Some(sats) = ctx.merchants.sats_received.get_mut(role.index()) else {
                    continue;
                };
                if *sats > 0 {
                    ch.loot.credit(*sats, h);
                    *sats = 0;
                    ch.last_sale_block = h;
                }
            } else if let Some(champion) = ctx.champions.get(color) {
                if champion.command > 0 && champion.player == *name && champion.index == index {
                    ch.queued_harvest_poi = champion.command;
                    ch.order_time = h;
                }
            }
        }
    }
}

/// Pass 4: payouts nobody received go back to the payer's first character.
pub fn refund_payments(state: &mut GameState, ctx: &mut StepContext) {
    if ctx.payments.iter().all(|p| p.value == 0) {
        return;
    }
    let h = ctx.height;
    for (name, player) in state.players.iter_mut() {
        for ch in player.characters.values_mut() {
            for payment in ctx.payments.iter_mut() {
                if payment.value != 0 && payment.payer == *name {
                    ch.loot.credit(payment.value, h);
                    debug!(payer = %name, value = payment.value, "payment refunded");
                    payment.value = 0;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::context::Payment;
    use crate::state::PlayerState;
    use crate::testing::open_world;

    const COIN: i64 = GameConfig::COIN;

    fn at(coord: Coord) -> CharacterState {
        CharacterState {
            coord,
            from: coord,
            ..CharacterState::default()
        }
    }

    fn single(state: &mut GameState, name: &str, color: u8, ch: CharacterState) {
        let mut player = PlayerState {
            color,
            ..PlayerState::default()
        };
        player.characters.insert(0, ch);
        state.players.insert(name.into(), player);
    }

    #[test]
    fn estoc_hits_harder_with_level() {
        let mut ch = at(Coord::new(100, 100));
        ch.weapon = Weapon::Estoc;
        ch.loot.loot.amount = 250 * COIN;
        assert_eq!(
            melee_flags(&ch),
            TileFlags::DEATH1 | TileFlags::DEATH2 | TileFlags::DEATH3
        );
        ch.weapon = Weapon::None;
        assert_eq!(melee_flags(&ch), TileFlags::DEATH1);
    }

    #[test]
    fn armor_resists_weak_hits_only() {
        let mut ch = at(Coord::new(100, 100));
        ch.armor = Armor::Chain;
        ch.loot.loot.amount = 150 * COIN;
        assert_eq!(hitscan_flags(&ch, TileFlags::POISON1), AiStatus::empty());
        assert_eq!(hitscan_flags(&ch, TileFlags::POISON2), AiStatus::DEATH_POISON);
        // chain mail does not stop fire
        assert_eq!(hitscan_flags(&ch, TileFlags::FIRE1), AiStatus::DEATH_FIRE);

        ch.loot.loot.amount = 0;
        assert_eq!(hitscan_flags(&ch, TileFlags::POISON1), AiStatus::DEATH_POISON);
    }

    #[test]
    fn melee_kills_adjacent_foe_but_not_friends() {
        let world = open_world();
        let mut state = GameState::new();
        single(&mut state, "a", 0, at(Coord::new(100, 100)));
        single(&mut state, "b", 1, at(Coord::new(101, 101)));
        single(&mut state, "c", 0, at(Coord::new(99, 100)));

        let mut ctx = StepContext::new(1, &GameConfig::new());
        melee(&mut state, &mut ctx);
        hitscan_and_payments(&mut state, world, &mut ctx);

        assert!(state.players["b"].characters[&0].is_dead_flagged());
        assert!(state.players["a"].characters[&0].is_dead_flagged());
        // out of reach of b, and a is a team mate
        assert!(!state.players["c"].characters[&0].is_dead_flagged());

        // the tile left behind is the one that counts
        let mut ctx = StepContext::new(1, &GameConfig::new());
        let mut state = GameState::new();
        single(&mut state, "a", 0, at(Coord::new(100, 100)));
        let mut runner = at(Coord::new(103, 100));
        runner.dir = 6;
        runner.mode |= AiMode::NORMAL_STEP;
        single(&mut state, "b", 1, runner);
        melee(&mut state, &mut ctx);
        hitscan_and_payments(&mut state, world, &mut ctx);
        assert!(!state.players["b"].characters[&0].is_dead_flagged());
    }

    #[test]
    fn payouts_are_delivered_or_refunded() {
        let world = open_world();
        let mut state = GameState::new();
        let mut npc = at(Coord::new(5, 300));
        npc.role = Role::INFO_DEVMODE;
        npc.loot.loot.amount = 100 * COIN;
        single(&mut state, "npc", 0, npc);
        single(&mut state, "winner", 1, at(Coord::new(200, 200)));

        let mut ctx = StepContext::new(10, &GameConfig::new());
        ctx.bounty.paid = 30 * COIN;
        ctx.payments.push(Payment {
            value: 30 * COIN,
            payer: "npc".into(),
            payee: "winner".into(),
        });
        ctx.payments.push(Payment {
            value: 5 * COIN,
            payer: "npc".into(),
            payee: "gone".into(),
        });
        melee(&mut state, &mut ctx);
        hitscan_and_payments(&mut state, world, &mut ctx);
        refund_payments(&mut state, &mut ctx);

        let winner = &state.players["winner"].characters[&0];
        assert_eq!(winner.loot.amount(), 30 * COIN);
        assert_eq!(winner.loot.collected_first_block, 10);
        // 100 - 30 paid + 5 refunded
        assert_eq!(state.players["npc"].characters[&0].loot.amount(), 75 * COIN);
        assert!(ctx.payments.iter().all(|p| p.value == 0));
    }
}
