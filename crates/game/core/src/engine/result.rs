//! What a step reports besides the new state.

use std::collections::{BTreeMap, BTreeSet};

use crate::state::{CharacterId, CollectedLootInfo, GameState, PlayerId};

/// Why a player was killed.
///
/// The variant order is the order in which kills are listed in the game
/// transaction built from a step result.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KilledBy {
    /// Destructed by a character (including itself).
    Destruct(CharacterId),
    /// Stayed too long in the spawn area.
    Spawn,
    /// Poisoned by a disaster, or killed by ranged attacks.
    Poison,
}

impl KilledBy {
    /// Whether the miner takes a cut of the dropped loot.
    pub fn has_death_tax(&self) -> bool {
        !matches!(self, KilledBy::Spawn)
    }
}

/// Coins banked (or refunded) by a character during a step.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CollectedBounty {
    pub character: CharacterId,
    pub loot: CollectedLootInfo,
    /// Reward address; empty for the name address.
    pub address: String,
}

impl CollectedBounty {
    pub fn new(character: CharacterId, loot: CollectedLootInfo, address: impl Into<String>) -> Self {
        Self {
            character,
            loot,
            address: address.into(),
        }
    }

    /// Re-reads the reward address from `state`, so that an address change
    /// made in the same block still receives the payout.
    pub fn update_address(&mut self, state: &GameState) {
        if let Some(player) = state.players.get(&self.character.player) {
            self.address = player.address.clone();
        }
    }
}

/// Side results of one step.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StepResult {
    /// Miner tax collected from banking and deaths.
    pub tax_amount: i64,
    pub bounties: Vec<CollectedBounty>,
    killed_players: BTreeSet<PlayerId>,
    /// Kill reasons per player, in the order they were recorded.
    killed_by: BTreeMap<PlayerId, Vec<KilledBy>>,
}

impl StepResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kill_player(&mut self, victim: &PlayerId, reason: KilledBy) {
        self.killed_by.entry(victim.clone()).or_default().push(reason);
        self.killed_players.insert(victim.clone());
    }

    pub fn killed_players(&self) -> &BTreeSet<PlayerId> {
        &self.killed_players
    }

    pub fn killed_by(&self) -> &BTreeMap<PlayerId, Vec<KilledBy>> {
        &self.killed_by
    }

    /// The reason recorded first for `victim`.
    pub fn first_reason(&self, victim: &str) -> Option<&KilledBy> {
        self.killed_by.get(victim).and_then(|reasons| reasons.first())
    }

    /// Kill reasons of `victim`, sorted the way a game transaction lists them.
    pub fn sorted_reasons(&self, victim: &str) -> Vec<KilledBy> {
        let mut reasons = self.killed_by.get(victim).cloned().unwrap_or_default();
        reasons.sort();
        reasons
    }

    pub fn is_killed(&self, player: &str) -> bool {
        self.killed_players.contains(player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasons_sort_destruct_spawn_poison() {
        let mut result = StepResult::new();
        let victim = PlayerId::from("v");
        result.kill_player(&victim, KilledBy::Poison);
        result.kill_player(&victim, KilledBy::Spawn);
        result.kill_player(&victim, KilledBy::Destruct(CharacterId::new("k", 2)));

        assert_eq!(result.first_reason("v"), Some(&KilledBy::Poison));
        assert_eq!(
            result.sorted_reasons("v"),
            vec![
                KilledBy::Destruct(CharacterId::new("k", 2)),
                KilledBy::Spawn,
                KilledBy::Poison
            ]
        );
        assert!(result.is_killed("v"));
        assert!(!KilledBy::Spawn.has_death_tax());
    }
}
