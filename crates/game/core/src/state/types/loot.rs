/// Coins lying on a tile, with the height range over which they accumulated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LootInfo {
    pub amount: i64,
    pub first_block: i32,
    pub last_block: i32,
}

impl LootInfo {
    pub const fn new(amount: i64, height: i32) -> Self {
        Self {
            amount,
            first_block: height,
            last_block: height,
        }
    }
}

impl Default for LootInfo {
    fn default() -> Self {
        Self {
            amount: 0,
            first_block: -1,
            last_block: -1,
        }
    }
}

/// Loot held by a character (or paid out as a bounty).
///
/// A refund record has `amount > 0` and `collected_first_block == -1`; its
/// `collected_last_block` is the refunding height. Refund records are only
/// ever built by [`CollectedLootInfo::refund`] and never collect further loot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CollectedLootInfo {
    pub loot: LootInfo,
    pub collected_first_block: i32,
    pub collected_last_block: i32,
}

impl Default for CollectedLootInfo {
    fn default() -> Self {
        Self {
            loot: LootInfo::default(),
            collected_first_block: -1,
            collected_last_block: -1,
        }
    }
}

impl CollectedLootInfo {
    pub fn refund(amount: i64, height: i32) -> Self {
        Self {
            loot: LootInfo {
                amount,
                ..LootInfo::default()
            },
            collected_first_block: -1,
            collected_last_block: height,
        }
    }

    #[inline]
    pub fn amount(&self) -> i64 {
        self.loot.amount
    }

    pub fn is_refund(&self) -> bool {
        self.loot.amount > 0 && self.collected_first_block == -1
    }

    pub fn refund_height(&self) -> Option<i32> {
        self.is_refund().then_some(self.collected_last_block)
    }

    /// Adds coins paid directly (by a merchant customer or an NPC payout).
    pub fn credit(&mut self, amount: i64, height: i32) {
        self.loot.amount += amount;
        if self.collected_first_block < 0 {
            self.collected_first_block = height;
        }
        self.collected_last_block = height;
    }

    /// Merges a pile into this record. Non-positive piles are ignored.
    pub fn collect(&mut self, pile: &LootInfo, height: i32) {
        debug_assert!(!self.is_refund(), "collecting into a refund record");
        if pile.amount <= 0 {
            return;
        }
        self.loot.amount += pile.amount;

        if self.loot.first_block < 0 || pile.first_block < self.loot.first_block {
            self.loot.first_block = pile.first_block;
        }
        if pile.last_block > self.loot.last_block {
            self.loot.last_block = pile.last_block;
        }
        if self.collected_first_block < 0 {
            self.collected_first_block = height;
        }
        self.collected_last_block = height;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_widens_the_block_ranges() {
        let mut held = CollectedLootInfo::default();
        held.collect(&LootInfo::new(5, 10), 12);
        held.collect(
            &LootInfo {
                amount: 7,
                first_block: 4,
                last_block: 11,
            },
            13,
        );
        assert_eq!(held.amount(), 12);
        assert_eq!((held.loot.first_block, held.loot.last_block), (4, 11));
        assert_eq!(
            (held.collected_first_block, held.collected_last_block),
            (12, 13)
        );
        assert!(!held.is_refund());
    }

    #[test]
    fn refund_records_report_their_height() {
        let refund = CollectedLootInfo::refund(300, 77);
        assert!(refund.is_refund());
        assert_eq!(refund.refund_height(), Some(77));
        assert_eq!(CollectedLootInfo::default().refund_height(), None);
    }
}
