use arrayvec::ArrayVec;

use super::{AiMode, AiOrders, AiStatus, Armor, CollectedLootInfo, Coord, LootInfo, Role, Trinket, Weapon};
use crate::config::GameConfig;
use crate::env::{MapOracle, StepRng};

/// Pending waypoints, stored in reverse so the next one is `last()`.
pub type Waypoints = ArrayVec<Coord, { GameConfig::MAX_WAYPOINTS }>;

/// One movable unit owned by a player.
///
/// Field order is the persisted layout order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CharacterState {
    pub coord: Coord,
    /// Direction of the last move, numeric-keypad encoded (never 5).
    pub dir: u8,
    /// Anchor of the straight line towards the next waypoint.
    pub from: Coord,
    pub waypoints: Waypoints,
    pub loot: CollectedLootInfo,
    pub stay_in_spawn_area: u8,

    pub role: Role,
    pub weapon: Weapon,
    pub cooldown: u8,
    pub amulet: Trinket,
    /// POI the character is walking towards this step (255 = none).
    pub poi: u8,
    pub mode: AiMode,
    pub status: AiStatus,
    pub orders: AiOrders,
    /// Speech-bubble code for the attack used this step.
    pub chat: u8,
    pub idle_time: u8,
    pub mapitem_count: u8,
    pub foe_count: u8,
    pub foe_dist: u8,
    pub fav_harvest_poi: u8,
    pub ring: Trinket,
    pub reserve64_1: i64,
    pub reserve64_2: i64,
    pub retreat: u8,
    pub queued_harvest_poi: u8,
    pub duty_harvest_poi: u8,
    pub survival_points: i32,
    pub rations: i32,
    pub range_for_display: i32,
    pub recall_timer: i32,
    pub regen_timer: i32,
    pub order_time: i32,
    pub marked_harvest_poi: u8,
    pub aux_storage_s1: i64,
    pub aux_storage_s2: i64,
    /// Packed ASCII decoded from the smuggling channel (see `decode_smuggled_name`).
    pub aux_storage_u1: u64,
    pub aux_storage_u2: u64,
    /// One-letter code of the last AI decision.
    pub reason: u8,
    pub armor: Armor,
    pub spawn_block: i32,
    pub last_sale_block: i32,
    pub stasis_block: i64,
    pub reserve6: i64,
}

/// Numeric-keypad direction from `c1` towards `c2`; 5 means "no move".
pub fn direction(c1: Coord, c2: Coord) -> u8 {
    let dx = (c2.x - c1.x).clamp(-1, 1);
    let dy = (c2.y - c1.y).clamp(-1, 1);
    ((1 - dy) * 3 + dx + 2) as u8
}

fn coord_step(x: i32, target: i32) -> i32 {
    x + (target - x).signum()
}

/// Minor-axis coordinate on the line from `from`, rounded half away from zero.
fn coord_upd(u: i32, v: i32, du: i32, dv: i32, from_u: i32, from_v: i32) -> i32 {
    if dv == 0 {
        return v;
    }
    let tmp = (u - from_u) * dv;
    let mut res = (tmp.abs() + du.abs() / 2) / du;
    if tmp < 0 {
        res = -res;
    }
    res + from_v
}

impl CharacterState {
    pub fn stop_moving(&mut self) {
        self.from = self.coord;
        self.waypoints.clear();
    }

    /// Places a fresh character in its team's spawn corner, facing inwards.
    pub fn spawn(&mut self, color: u8, rng: &mut StepRng) {
        let len = GameConfig::SPAWN_AREA_LENGTH;
        let (w, h) = (GameConfig::MAP_WIDTH, GameConfig::MAP_HEIGHT);
        let pos = rng.next(2 * len - 1);
        let x = if pos < len { pos } else { 0 };
        let y = if pos < len { 0 } else { pos - len };
        self.coord = match color {
            0 => Coord::new(x, y),
            1 => Coord::new(w - 1 - x, y),
            2 => Coord::new(w - 1 - x, h - 1 - y),
            _ => Coord::new(x, h - 1 - y),
        };

        let Coord { x, y } = self.coord;
        if x == 0 {
            self.dir = if y == 0 {
                3
            } else if y == h - 1 {
                9
            } else {
                6
            };
        } else if x == w - 1 {
            self.dir = if y == 0 {
                1
            } else if y == h - 1 {
                7
            } else {
                4
            };
        } else if y == 0 {
            self.dir = 2;
        } else if y == h - 1 {
            self.dir = 8;
        }
        self.stop_moving();
    }

    /// Pops waypoints already reached. Returns false once none remain.
    fn pop_reached(&mut self) -> bool {
        while self.waypoints.last() == Some(&self.coord) {
            self.from = self.coord;
            self.waypoints.pop();
        }
        !self.waypoints.is_empty()
    }

    /// Advances one tile along the straight line from `from` to the next
    /// waypoint. An unwalkable next tile ends the path: the character stays
    /// put and its remaining waypoints are dropped.
    ///
    /// `mark_step` records the move in [`AiMode::NORMAL_STEP`] so that hitscan
    /// can resolve attacks against the tile the character just left.
    pub fn step_towards_waypoint(&mut self, map: &impl MapOracle, mark_step: bool) {
        if self.waypoints.is_empty() {
            self.from = self.coord;
            return;
        }
        if !self.pop_reached() {
            return;
        }
        let Some(&target) = self.waypoints.last() else {
            return;
        };

        let dx = target.x - self.from.x;
        let dy = target.y - self.from.y;
        let next = if dx.abs() > dy.abs() {
            let x = coord_step(self.coord.x, target.x);
            Coord::new(x, coord_upd(x, self.coord.y, dx, dy, self.from.x, self.from.y))
        } else {
            let y = coord_step(self.coord.y, target.y);
            Coord::new(coord_upd(y, self.coord.x, dy, dx, self.from.y, self.from.x), y)
        };

        if !map.is_walkable(next) {
            self.stop_moving();
            return;
        }

        let new_dir = direction(self.coord, next);
        if new_dir != 5 {
            self.dir = new_dir;
            if mark_step {
                self.mode |= AiMode::NORMAL_STEP;
            }
        }
        self.coord = next;

        if self.coord == target {
            self.from = self.coord;
            while self.waypoints.last() == Some(&self.coord) {
                self.waypoints.pop();
            }
        }
    }

    /// Plain straight-line motion.
    pub fn move_towards_waypoint(&mut self, map: &impl MapOracle) {
        self.step_towards_waypoint(map, false);
    }

    /// Every tile the character will stand on while following its path
    /// (or `alternative`, given in stored order), starting at the current tile.
    pub fn dump_path(&self, map: &impl MapOracle, alternative: Option<&Waypoints>) -> Vec<Coord> {
        let mut tmp = self.clone();
        if let Some(wp) = alternative {
            tmp.stop_moving();
            tmp.waypoints = wp.clone();
        }

        let mut path = Vec::new();
        if tmp.waypoints.is_empty() {
            return path;
        }
        while !tmp.waypoints.is_empty() {
            path.push(tmp.coord);
            tmp.move_towards_waypoint(map);
        }
        if path.last() != Some(&tmp.coord) {
            path.push(tmp.coord);
        }
        path
    }

    /// Blocks needed to finish the outstanding path (L-infinity length).
    ///
    /// `alternative` is given in forward order (first waypoint first), as
    /// queued moves are.
    pub fn time_to_destination(&self, alternative: Option<&[Coord]>) -> u32 {
        let (points, reverse): (&[Coord], bool) = match alternative {
            Some(wp) => (wp, false),
            None => (&self.waypoints, true),
        };
        let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
            return 0;
        };

        let along: i32 = points.windows(2).map(|w| w[0].dist_linf(w[1])).sum();
        let lead_in = if reverse {
            self.coord.dist_linf(last)
        } else {
            self.coord.dist_linf(first)
        };
        (along + lead_in) as u32
    }

    /// Collects `pile` up to the carrying capacity (`None` = unlimited) and
    /// returns the amount that stays on the ground.
    pub fn collect_loot(&mut self, mut pile: LootInfo, height: i32, capacity: Option<i64>) -> i64 {
        let remaining = match capacity {
            None => 0,
            Some(cap) => {
                let free = (cap - self.loot.amount()).max(0);
                (pile.amount - free).max(0)
            }
        };
        pile.amount -= remaining;
        self.loot.collect(&pile, height);
        remaining
    }

    pub fn is_dead_flagged(&self) -> bool {
        self.status.intersects(AiStatus::DEATH_ALL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct OpenField;

    impl MapOracle for OpenField {
        fn is_walkable(&self, coord: Coord) -> bool {
            coord.is_inside_map()
        }
    }

    struct Wall(Coord);

    impl MapOracle for Wall {
        fn is_walkable(&self, coord: Coord) -> bool {
            coord != self.0
        }
    }

    fn walker(at: Coord, forward: &[Coord]) -> CharacterState {
        let mut ch = CharacterState {
            coord: at,
            from: at,
            ..CharacterState::default()
        };
        ch.waypoints = forward.iter().rev().copied().collect();
        ch
    }

    #[test]
    fn straight_line_follows_the_major_axis() {
        let mut ch = walker(Coord::new(0, 0), &[Coord::new(5, 2)]);
        let mut seen = Vec::new();
        while !ch.waypoints.is_empty() {
            ch.move_towards_waypoint(&OpenField);
            seen.push(ch.coord);
        }
        assert_eq!(
            seen,
            vec![
                Coord::new(1, 0),
                Coord::new(2, 1),
                Coord::new(3, 1),
                Coord::new(4, 2),
                Coord::new(5, 2),
            ]
        );
        assert_eq!(ch.from, Coord::new(5, 2));
        assert_eq!(ch.dir, 6);
    }

    #[test]
    fn blocked_step_drops_the_remaining_waypoints() {
        let mut ch = walker(Coord::new(0, 0), &[Coord::new(3, 0)]);
        ch.move_towards_waypoint(&Wall(Coord::new(2, 0)));
        assert_eq!(ch.coord, Coord::new(1, 0));
        ch.move_towards_waypoint(&Wall(Coord::new(2, 0)));
        assert_eq!(ch.coord, Coord::new(1, 0));
        assert!(ch.waypoints.is_empty());
        assert_eq!(ch.from, ch.coord);
    }

    #[test]
    fn duplicate_arrival_waypoints_are_popped_together() {
        let mut ch = walker(
            Coord::new(0, 0),
            &[Coord::new(1, 1), Coord::new(1, 1), Coord::new(2, 2)],
        );
        ch.move_towards_waypoint(&OpenField);
        assert_eq!(ch.coord, Coord::new(1, 1));
        assert_eq!(ch.waypoints.as_slice(), &[Coord::new(2, 2)]);
    }

    #[test]
    fn dump_path_lists_every_tile_and_time_matches() {
        let ch = walker(Coord::new(10, 10), &[Coord::new(13, 10), Coord::new(13, 12)]);
        let path = ch.dump_path(&OpenField, None);
        assert_eq!(path.first(), Some(&Coord::new(10, 10)));
        assert_eq!(path.last(), Some(&Coord::new(13, 12)));
        assert_eq!(path.len(), 6);
        assert_eq!(ch.time_to_destination(None), 5);
        assert_eq!(
            ch.time_to_destination(Some(&[Coord::new(10, 20)])),
            10
        );
    }

    #[test]
    fn direction_uses_keypad_layout() {
        let c = Coord::new(5, 5);
        assert_eq!(direction(c, Coord::new(5, 4)), 8);
        assert_eq!(direction(c, Coord::new(6, 6)), 3);
        assert_eq!(direction(c, Coord::new(0, 5)), 4);
        assert_eq!(direction(c, c), 5);
    }

    #[test]
    fn capacity_limits_collection_and_conserves_coins() {
        let mut ch = CharacterState::default();
        let rest = ch.collect_loot(LootInfo::new(15, 3), 4, Some(10));
        assert_eq!((ch.loot.amount(), rest), (10, 5));

        let rest = ch.collect_loot(LootInfo::new(15, 3), 4, None);
        assert_eq!((ch.loot.amount(), rest), (25, 0));
    }
}
