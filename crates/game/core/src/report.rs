//! Human-readable snapshot of a step for the stats pages.
//!
//! [`StatsReport::collect`] runs after the payment passes, while the step's
//! census is still available. Rendering produces plain HTML strings; writing
//! them anywhere is up to the caller and never touches the game state.

use std::fmt;

use crate::config::{GameConfig, Network};
use crate::engine::context::StepContext;
use crate::engine::rules::{clevel_from_loot, population_limit};
use crate::env::World;
use crate::moves::format_money;
use crate::env::PoiTable;
use crate::state::{CharacterId, Coord, GameState, PlayerId, Role};

const CENT: i64 = GameConfig::CENT;

/// Coins shown on the pages are rounded down to whole cents.
fn cents(amount: i64) -> String {
    format_money(amount / CENT * CENT)
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AccountRow {
    pub name: PlayerId,
    /// Loot held by every non-merchant character.
    pub coins: i64,
    pub address: String,
    pub token: String,
}

/// A point of interest a hunter heads for, and how far away it is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AreaTarget {
    pub poi: usize,
    pub at: Coord,
    pub path: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct HunterRow {
    pub id: CharacterId,
    pub level: i32,
    pub coins: i64,
    pub age: i32,
    pub rations: i32,
    pub survival_points: i32,
    pub walk_target: Option<AreaTarget>,
    pub order: Option<AreaTarget>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TeamRow {
    pub color: usize,
    pub score: i32,
    pub strongest: bool,
    pub weakest: bool,
    pub champion: Option<(CharacterId, i64)>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct VoterRow {
    pub name: PlayerId,
    pub coins: i64,
    pub vote_block: i32,
    pub vote: i64,
    pub vote_text: String,
    pub request_block: i32,
    pub request: i64,
    pub request_text: String,
    pub fee: i64,
    pub fee_text: String,
    pub comment: String,
    /// Neither voted nor requested in the last two rounds.
    pub stale: bool,
}

/// Bounty round bookkeeping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DaoSummary {
    pub best_fee: i64,
    pub best_name: String,
    pub best_request: i64,
    pub final_fee: i64,
    pub final_name: String,
    pub final_request: i64,
    pub weight_total: i64,
    pub weight_full: i64,
    pub weight_part: i64,
    pub weight_zero: i64,
    pub actual_bounty: i64,
    pub npc: PlayerId,
    pub npc_available: i64,
    pub npc_paid: i64,
    pub previous_name: String,
    pub previous_bounty: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StatsReport {
    pub height: i32,
    pub network: Network,
    pub accounts: Vec<AccountRow>,
    pub hunters: Vec<HunterRow>,
    pub teams: Vec<TeamRow>,
    pub voters: Vec<VoterRow>,
    pub population: i32,
    pub population_target: i32,
    pub players: i32,
    pub monsters: i32,
    pub devmode: i32,
    pub round_length: i32,
    pub dao: DaoSummary,
}

impl StatsReport {
    pub fn collect(state: &GameState, world: &World, ctx: &StepContext, network: Network) -> Self {
        let h = state.height;
        let census = &ctx.census;
        let pois = world.pois();

        let mut accounts = Vec::new();
        let mut hunters = Vec::new();
        let mut voters = Vec::new();
        for (name, player) in &state.players {
            let mut coins = 0;
            let mut any_hunter = false;
            for (&index, ch) in &player.characters {
                if ch.role.is_merchant() {
                    continue;
                }
                any_hunter = true;
                coins += ch.loot.amount();

                let fav = usize::from(ch.fav_harvest_poi);
                let queued = usize::from(ch.queued_harvest_poi);
                if !ch.coord.is_inside_map() || fav >= pois.len() || queued >= pois.len() {
                    continue;
                }
                let fav_at = pois.anchor(fav);
                let walk_target = (fav >= *PoiTable::NORMAL.start()).then(|| AreaTarget {
                    poi: fav,
                    at: fav_at,
                    path: world.poi_distance(fav, ch.coord),
                });
                // orders are measured from the walk target when there is one
                let order_from = if walk_target.is_some() { fav_at } else { ch.coord };
                let order = (queued > 0).then(|| AreaTarget {
                    poi: queued,
                    at: pois.anchor(queued),
                    path: world.poi_distance(queued, order_from),
                });
                hunters.push(HunterRow {
                    id: CharacterId::new(name.clone(), index),
                    level: clevel_from_loot(ch.loot.amount()),
                    coins: ch.loot.amount(),
                    age: h - ch.spawn_block,
                    rations: ch.rations,
                    survival_points: ch.survival_points,
                    walk_target,
                    order,
                });
            }

            if any_hunter {
                accounts.push(AccountRow {
                    name: name.clone(),
                    coins,
                    address: player.address.clone(),
                    token: player.addr_token.clone(),
                });
            }

            let cycle = ctx.intervals.bounty_cycle;
            let block = h % cycle;
            let round_start = if block == 0 { h - cycle } else { h - block };
            let previous_start = round_start - cycle;
            voters.push(VoterRow {
                name: name.clone(),
                coins,
                vote_block: player.msg_vote_block,
                vote: player.coins_vote,
                vote_text: player.msg_vote.clone(),
                request_block: player.msg_request_block,
                request: player.coins_request,
                request_text: player.msg_request.clone(),
                fee: player.coins_fee,
                fee_text: player.msg_fee.clone(),
                comment: player.msg_comment.clone(),
                stale: player.msg_request_block < previous_start
                    && player.msg_vote_block < previous_start,
            });
        }

        let teams = (0..GameConfig::NUM_TEAM_COLORS)
            .map(|color| {
                let c = &ctx.champions[color];
                let champion = (!c.player.is_empty())
                    .then(|| (CharacterId::new(c.player.clone(), c.index), c.coins));
                TeamRow {
                    color,
                    score: census.team_balance[color],
                    strongest: color == census.strongest_team,
                    weakest: color != census.strongest_team && color == census.weakest_team,
                    champion,
                }
            })
            .collect();

        let dao = DaoSummary {
            best_fee: state.dao_best_fee,
            best_name: state.dao_best_name.clone(),
            best_request: state.dao_best_request,
            final_fee: state.dao_best_fee_final,
            final_name: state.dao_best_name_final.clone(),
            final_request: state.dao_best_request_final,
            weight_total: ctx.votes.total,
            weight_full: ctx.votes.full,
            weight_part: ctx.votes.part,
            weight_zero: ctx.votes.zero,
            actual_bounty: ctx.votes.actual_bounty,
            npc: ctx.bounty.player.clone(),
            npc_available: ctx.bounty.available,
            npc_paid: ctx.bounty.paid,
            previous_name: state.dao_name_previous_week.clone(),
            previous_bounty: state.dao_bounty_previous_week,
        };

        Self {
            height: h,
            network,
            accounts,
            hunters,
            teams,
            voters,
            population: census.total,
            population_target: population_limit(h),
            players: census.population[usize::from(Role::PLAYER.0)],
            monsters: census.monsters,
            devmode: ctx.devmode,
            round_length: ctx.intervals.apocalypse,
            dao,
        }
    }

    /// The three stats pages with their conventional file names.
    pub fn pages(&self) -> [(&'static str, String); 3] {
        [
            ("stats_address.html", AccountsPage(self).to_string()),
            ("stats_hunter.html", HuntersPage(self).to_string()),
            ("stats_bounty.html", BountyPage(self).to_string()),
        ]
    }

    fn header(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "<!doctype html>")?;
        writeln!(f, "<html>")?;
        writeln!(f, "<head>")?;
        writeln!(f, "<meta charset=\"utf-8\">")?;
        writeln!(f, "<title>Hunter Arena hi-score list</title>")?;
        writeln!(f, "<style>")?;
        writeln!(f, "body {{ color: white; background-color: #111111; }}")?;
        writeln!(f, "</style>")?;
        writeln!(f, "</head>")?;
        writeln!(f, "<body>")?;
        writeln!(f, "<pre>")?;
        writeln!(f)?;
        writeln!(f, " Block {:7}, {}", self.height, self.network)?;
        writeln!(f, " ----------------------")?;
        writeln!(f)
    }

    fn footer(f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "</pre>")?;
        writeln!(f, "</body>")?;
        writeln!(f, "</html>")
    }
}

struct AccountsPage<'a>(&'a StatsReport);

impl fmt::Display for AccountsPage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.0;
        r.header(f)?;
        writeln!(f, "      Name       Coins  Reward address                      Token address")?;
        writeln!(f)?;
        for row in &r.accounts {
            writeln!(
                f,
                "{:>10}   {:>9}  {:>34}  {:>42}",
                row.name,
                cents(row.coins),
                row.address,
                row.token
            )?;
        }
        StatsReport::footer(f)
    }
}

struct HuntersPage<'a>(&'a StatsReport);

impl fmt::Display for HuntersPage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.0;
        r.header(f)?;
        writeln!(
            f,
            "                                                  Survival Current walktarget               Player order"
        )?;
        writeln!(
            f,
            "      Name       Level   Coins       Age  Rations points   Area and Position  Path length   Area and Position  Path length"
        )?;
        writeln!(f)?;
        for row in &r.hunters {
            write!(
                f,
                "{:>10}.{:<3} {:3}   {:>9}   {:7}  {:5}  {:5}",
                row.id.player,
                row.id.index,
                row.level,
                cents(row.coins),
                row.age,
                row.rations,
                row.survival_points
            )?;
            match row.walk_target {
                Some(t) => write!(f, "     area#{:<3}  {:3},{:<3}    {:4}", t.poi, t.at.x, t.at.y, t.path)?,
                None if row.order.is_some() => write!(f, "{:38}", "")?,
                None => {}
            }
            if let Some(t) = row.order {
                write!(f, "            #{:<3}  {:3},{:<3}    {:4}", t.poi, t.at.x, t.at.y, t.path)?;
            }
            writeln!(f)?;
        }

        writeln!(f)?;
        writeln!(f)?;
        writeln!(f, " Color Teams:")?;
        writeln!(f, " ------------")?;
        writeln!(f)?;
        writeln!(f, "Number and Color        Total Score             Champion")?;
        writeln!(f)?;
        const COLORS: [&str; 4] = ["yellow", "red", "green", "blue"];
        for team in &r.teams {
            let standing = if team.strongest {
                "strongest"
            } else if team.weakest {
                "weakest"
            } else {
                ""
            };
            let name = COLORS.get(team.color).copied().unwrap_or("?");
            write!(f, "{:10} {:>6}   {:10} {:>10}", team.color, name, team.score, standing)?;
            if let Some((id, coins)) = &team.champion {
                write!(f, "   {:>10}.{:<3}   {}", id.player, id.index, cents(*coins))?;
            }
            writeln!(f)?;
        }

        writeln!(f)?;
        writeln!(f)?;
        writeln!(f, " Global Stats:")?;
        writeln!(f, " -------------")?;
        writeln!(f)?;
        writeln!(f, "Total population (current): {:10}", r.population)?;
        writeln!(f, "Total population (target):  {:10}", r.population_target)?;
        writeln!(f, "Player population:          {:10}", r.players)?;
        writeln!(f, "Monster population:         {:10}", r.monsters)?;
        writeln!(f)?;
        writeln!(f, "Devmode:                    {:10}", r.devmode)?;
        writeln!(f, "Game round in blocks:       {:10}", r.round_length)?;
        StatsReport::footer(f)
    }
}

struct BountyPage<'a>(&'a StatsReport);

impl fmt::Display for BountyPage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.0;
        let d = &r.dao;
        r.header(f)?;
        writeln!(
            f,
            "                            Vote                     Request                   Fee"
        )?;
        writeln!(
            f,
            "      Name       Coins      block  parsed     raw    block  parsed     raw     parsed   raw    Comment"
        )?;
        writeln!(f)?;
        for v in &r.voters {
            if v.stale {
                write!(f, "<font color=gray>")?;
            }
            write!(
                f,
                "{:>10}   {:>9}    {:7} {:>7} {:>7}  {:7} {:>7} {:>7}  {:>7} {:>7}    {}",
                v.name,
                cents(v.coins),
                v.vote_block,
                format_money(v.vote),
                v.vote_text,
                v.request_block,
                format_money(v.request),
                v.request_text,
                format_money(v.fee),
                v.fee_text,
                v.comment
            )?;
            if v.stale {
                write!(f, "</font>")?;
            }
            writeln!(f)?;
        }

        let line = |f: &mut fmt::Formatter<'_>, label: &str, value: &str| {
            writeln!(f, "{label:<34}{value:>10}")
        };
        writeln!(f)?;
        writeln!(f)?;
        writeln!(f, " Next voting round")?;
        writeln!(f, " -----------------")?;
        writeln!(f)?;
        line(f, "Highest fee", &format_money(d.best_fee))?;
        line(f, "Player name", &d.best_name)?;
        line(f, "Requested bounty", &format_money(d.best_request))?;

        writeln!(f)?;
        writeln!(f)?;
        writeln!(f, " Current voting round")?;
        writeln!(f, " --------------------")?;
        writeln!(f)?;
        line(f, "Highest fee", &format_money(d.final_fee))?;
        line(f, "Player name", &d.final_name)?;
        line(f, "Requested bounty", &format_money(d.final_request))?;
        line(f, "Weight, all votes", &format_money(d.weight_total))?;
        line(f, "        accept request", &format_money(d.weight_full))?;
        line(f, "        accept but reduce amount", &format_money(d.weight_part))?;
        line(f, "        decline request", &format_money(d.weight_zero))?;
        line(f, "Actual bounty (predicted)", &format_money(d.actual_bounty))?;
        writeln!(f)?;
        line(f, "Paying NPC", &d.npc)?;
        line(f, "Available amount", &format_money(d.npc_available))?;
        line(f, "Paid (current block)", &format_money(d.npc_paid))?;

        writeln!(f)?;
        writeln!(f)?;
        writeln!(f, " Previous voting round")?;
        writeln!(f, " ---------------------")?;
        writeln!(f)?;
        line(f, "Player name", &d.previous_name)?;
        line(f, "Received bounty", &format_money(d.previous_bounty))?;
        StatsReport::footer(f)
    }
}
