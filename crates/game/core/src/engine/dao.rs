//! Pass 1: bounty requests, fees and weighted votes.
//!
//! Only runs while the devmode info merchant is on the map. Rounds last
//! `bounty_cycle` blocks; the round closes on the block where
//! `height % bounty_cycle == 0`.

use tracing::{debug, info};

use crate::config::GameConfig;
use crate::moves::parse_money;
use crate::state::{GameState, PlayerState, Role};

use super::context::{Payment, StepContext, VoteTally};

const COIN: i64 = GameConfig::COIN;

/// Re-reads a money string; a malformed string keeps the previous value.
fn reparse(text: &str, value: &mut i64) {
    if let Some(parsed) = parse_money(text) {
        *value = parsed;
    }
}

/// Reads a request posted one block ago and lets it bid for the round.
fn read_request(
    name: &str,
    player: &mut PlayerState,
    state_best: &mut (i64, i64, String),
    ctx: &mut StepContext,
) {
    reparse(&player.msg_request, &mut player.coins_request);
    if player.coins_request >= COIN {
        reparse(&player.msg_fee, &mut player.coins_fee);
        player.coins_fee = player.coins_fee.max(player.coins_request / 100);
    }
    let fee = player.coins_fee;
    if fee <= state_best.0 {
        return;
    }

    // only the general pays, and only if it can afford the whole fee
    let Some(general) = player.characters.get_mut(&0) else {
        return;
    };
    if general.loot.amount() < fee {
        return;
    }
    *state_best = (fee, player.coins_request, name.to_string());
    general.loot.loot.amount -= fee;
    ctx.merchants.sats_received[Role::INFO_DEVMODE.index()] += fee;
    if ctx.intervals.ration_price > 0 {
        general.rations += (fee / ctx.intervals.ration_price) as i32;
    }
    debug!(player = name, fee, request = player.coins_request, "bounty bid accepted");
}

/// Weighted vote of one player. Merchants cannot vote.
fn tally_vote(player: &mut PlayerState, final_request: i64, round_closes: bool, tally: &mut VoteTally) {
    let vote = player.coins_vote.min(final_request).max(0);
    let mut weight: i64 = 0;
    let mut is_merchant = false;
    for (&index, ch) in player.characters.iter_mut() {
        if ch.role.is_merchant() {
            is_merchant = true;
        } else if round_closes {
            ch.rations += if index == 0 { 3 } else { 2 };
        }
        weight += ch.loot.amount();
    }
    if is_merchant {
        weight = 0;
    }

    tally.total += weight;
    if vote == 0 {
        tally.zero += weight;
    } else if vote == final_request {
        tally.full += weight;
    } else {
        tally.part += weight;
        tally.vote_part += (vote / COIN) * (weight / COIN);
    }
}

/// Bounty implied by the tally.
pub fn decide_bounty(tally: &mut VoteTally, final_request: i64) -> i64 {
    if tally.zero > tally.total / 2 {
        0
    } else if tally.full > tally.total / 2 {
        final_request
    } else if tally.part > 0 {
        let weight = tally.part + tally.full + tally.zero;
        tally.vote_part += (final_request / COIN) * (tally.full / COIN);
        let divisor = weight / COIN;
        if divisor == 0 {
            0
        } else {
            (tally.vote_part / divisor) * COIN
        }
    } else {
        0
    }
}

pub fn run(state: &mut GameState, ctx: &mut StepContext) {
    ctx.bounty.paid = 0;
    ctx.votes = VoteTally::default();
    if !ctx.merchants.exists(Role::INFO_DEVMODE) {
        return;
    }

    let h = ctx.height;
    let cycle = ctx.intervals.bounty_cycle;
    let block = h % cycle;
    let round_start = if block == 0 { h - cycle } else { h - block };
    let round_closes = block == 0;

    if !round_closes {
        let mut best = (
            state.dao_best_fee,
            state.dao_best_request,
            std::mem::take(&mut state.dao_best_name),
        );
        for (name, player) in state.players.iter_mut() {
            if player.msg_request_block == h - 1 {
                read_request(name, player, &mut best, ctx);
            }
            if player.msg_vote_block == h - 1 {
                reparse(&player.msg_vote, &mut player.coins_vote);
            }
        }
        (state.dao_best_fee, state.dao_best_request, state.dao_best_name) = best;
    }

    let final_request = state.dao_best_request_final;
    let mut tally = VoteTally::default();
    for player in state.players.values_mut() {
        if player.msg_vote_block > round_start {
            tally_vote(player, final_request, round_closes, &mut tally);
        }
    }
    tally.actual_bounty = decide_bounty(&mut tally, final_request);
    ctx.votes = tally;

    if !round_closes {
        return;
    }

    state.dao_name_previous_week.clear();
    state.dao_bounty_previous_week = 0;
    let bounty = tally.actual_bounty;
    if bounty > 0 && ctx.bounty.available >= bounty {
        let payment = Payment {
            value: bounty,
            payer: ctx.bounty.player.clone(),
            payee: state.dao_best_name_final.clone(),
        };
        if ctx.queue_payment(payment) {
            ctx.bounty.paid = bounty;
            state.dao_name_previous_week = state.dao_best_name_final.clone();
            state.dao_bounty_previous_week = bounty;
            info!(height = h, payee = %state.dao_best_name_final, bounty, "bounty round paid out");
        }
    }

    if state.dao_best_fee > 0 {
        state.dao_best_fee_final = state.dao_best_fee;
        state.dao_best_request_final = state.dao_best_request;
        state.dao_best_name_final = state.dao_best_name.clone();
    }
    state.dao_best_fee = 0;
    state.dao_best_request = 0;
    state.dao_best_name.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::CharacterState;

    fn voter(loot: i64, vote: i64, vote_block: i32) -> PlayerState {
        let mut player = PlayerState {
            color: 0,
            coins_vote: vote,
            msg_vote_block: vote_block,
            ..PlayerState::default()
        };
        let mut ch = CharacterState::default();
        ch.loot.loot.amount = loot;
        player.characters.insert(0, ch);
        player
    }

    fn context_with_devmode(height: i32) -> StepContext {
        let mut ctx = StepContext::new(height, &GameConfig::new());
        ctx.merchants.exists[Role::INFO_DEVMODE.index()] = true;
        ctx
    }

    #[test]
    fn majority_decline_and_accept() {
        let mut tally = VoteTally {
            total: 10 * COIN,
            zero: 6 * COIN,
            ..VoteTally::default()
        };
        assert_eq!(decide_bounty(&mut tally, 50 * COIN), 0);

        let mut tally = VoteTally {
            total: 10 * COIN,
            full: 6 * COIN,
            ..VoteTally::default()
        };
        assert_eq!(decide_bounty(&mut tally, 50 * COIN), 50 * COIN);
    }

    #[test]
    fn partial_votes_are_weighted_and_truncated() {
        // 4 coins voting 10, 4 coins voting the full 50, 2 coins declining
        let mut tally = VoteTally {
            total: 10 * COIN,
            part: 4 * COIN,
            full: 4 * COIN,
            zero: 2 * COIN,
            vote_part: 10 * 4,
            actual_bounty: 0,
        };
        // (40 + 50 * 4) / 10 = 24
        assert_eq!(decide_bounty(&mut tally, 50 * COIN), 24 * COIN);
    }

    #[test]
    fn request_is_read_one_block_later_and_fee_charged() {
        let mut state = GameState::new();
        let mut bidder = voter(500 * COIN, 0, 0);
        bidder.msg_request = "200".into();
        bidder.msg_fee = "1".into();
        bidder.msg_request_block = 40;
        state.players.insert("bidder".into(), bidder);

        let mut poor = voter(COIN, 0, 0);
        poor.msg_request = "300".into();
        poor.msg_fee = "50".into();
        poor.msg_request_block = 40;
        state.players.insert("poor".into(), poor);

        let mut ctx = context_with_devmode(41);
        run(&mut state, &mut ctx);

        // fee raised to 1% of the request
        let bidder = &state.players["bidder"];
        assert_eq!(bidder.coins_fee, 2 * COIN);
        assert_eq!(bidder.characters[&0].loot.amount(), 498 * COIN);
        assert_eq!(bidder.characters[&0].rations, 1);
        assert_eq!(state.dao_best_fee, 2 * COIN);
        assert_eq!(state.dao_best_request, 200 * COIN);
        assert_eq!(state.dao_best_name, "bidder");
        assert_eq!(ctx.merchants.sats_received[Role::INFO_DEVMODE.index()], 2 * COIN);
        assert_eq!(state.players["poor"].characters[&0].loot.amount(), COIN);
    }

    fn bidder(fee: &str) -> PlayerState {
        let mut p = voter(500 * COIN, 0, 0);
        p.msg_request = "200".into();
        p.msg_fee = fee.into();
        p.msg_request_block = 40;
        p
    }

    #[test]
    fn bids_are_read_in_name_order_and_ties_keep_the_first() {
        let mut state = GameState::new();
        state.players.insert("zeta".into(), bidder("5"));
        state.players.insert("alpha".into(), bidder("5"));
        let mut ctx = context_with_devmode(41);
        run(&mut state, &mut ctx);

        // an equal fee does not beat the standing bid, so "zeta" keeps its coins
        assert_eq!(state.dao_best_name, "alpha");
        assert_eq!(state.players["alpha"].characters[&0].loot.amount(), 495 * COIN);
        assert_eq!(state.players["zeta"].characters[&0].loot.amount(), 500 * COIN);
        assert_eq!(ctx.merchants.sats_received[Role::INFO_DEVMODE.index()], 5 * COIN);

        // a higher bid later in the order wins, and the earlier bidder has paid already
        let mut state = GameState::new();
        state.players.insert("alpha".into(), bidder("5"));
        state.players.insert("zeta".into(), bidder("6"));
        let mut ctx = context_with_devmode(41);
        run(&mut state, &mut ctx);

        assert_eq!(state.dao_best_name, "zeta");
        assert_eq!(state.dao_best_fee, 6 * COIN);
        assert_eq!(state.players["alpha"].characters[&0].loot.amount(), 495 * COIN);
        assert_eq!(state.players["zeta"].characters[&0].loot.amount(), 494 * COIN);
        assert_eq!(ctx.merchants.sats_received[Role::INFO_DEVMODE.index()], 11 * COIN);
    }

    #[test]
    fn closing_round_queues_the_payout_and_promotes_the_bid() {
        let cycle = 10_000;
        let mut state = GameState::new();
        state.dao_best_request_final = 30 * COIN;
        state.dao_best_name_final = "winner".into();
        state.dao_best_fee = 3 * COIN;
        state.dao_best_request = 70 * COIN;
        state.dao_best_name = "next".into();
        state
            .players
            .insert("a".into(), voter(10 * COIN, 30 * COIN, cycle - 5));

        let mut ctx = context_with_devmode(cycle);
        ctx.bounty.player = "npc".into();
        ctx.bounty.available = 100 * COIN;
        run(&mut state, &mut ctx);

        assert_eq!(ctx.votes.full, 10 * COIN);
        assert_eq!(ctx.bounty.paid, 30 * COIN);
        assert_eq!(
            ctx.payments,
            vec![Payment {
                value: 30 * COIN,
                payer: "npc".into(),
                payee: "winner".into()
            }]
        );
        assert_eq!(state.dao_bounty_previous_week, 30 * COIN);
        assert_eq!(state.dao_best_request_final, 70 * COIN);
        assert_eq!(state.dao_best_name_final, "next");
        assert!(state.dao_best_name.is_empty());
        // voters are rewarded with rations at the round boundary
        assert_eq!(state.players["a"].characters[&0].rations, 3);
    }

    #[test]
    fn nothing_happens_without_the_devmode_merchant() {
        let mut state = GameState::new();
        state.players.insert("a".into(), voter(10 * COIN, 30 * COIN, 5));
        let mut ctx = StepContext::new(10_000, &GameConfig::new());
        run(&mut state, &mut ctx);
        assert_eq!(ctx.votes, VoteTally::default());
        assert_eq!(state.players["a"].characters[&0].rations, 0);
    }
}
