//! Card inventory - owned cards/items and aggregate stat queries
//!
//! Cards are kept in acquisition order and only ever leave through a sale
//! or an upgrade-merge. The inventory is deliberately passive: acquisition
//! side effects (coins, color weights, pet feeding, abundance choices)
//! are orchestrated by the session, which owns the RNG and the other
//! subsystems.

use crate::core::SimpleRng;
use crate::types::{CardId, Category, ItemKind};

/// Per-number counts of plain and upgraded copies within one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryStats {
    pub plain: [u32; 4],
    pub upgraded: [u32; 4],
}

impl CategoryStats {
    pub fn plain_of(&self, number: u8) -> u32 {
        self.plain[number as usize - 1]
    }

    pub fn upgraded_of(&self, number: u8) -> u32 {
        self.upgraded[number as usize - 1]
    }

    pub fn total(&self) -> u32 {
        self.plain.iter().sum::<u32>() + self.upgraded.iter().sum::<u32>()
    }

    /// Effective count: plain copies count once, upgraded copies twice.
    pub fn effective_count(&self) -> u32 {
        self.plain.iter().sum::<u32>() + 2 * self.upgraded.iter().sum::<u32>()
    }
}

/// Owned modifier cards and consumable items.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    cards: Vec<CardId>,
    items: [u32; ItemKind::COUNT],
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cards(&self) -> &[CardId] {
        &self.cards
    }

    /// Append a card. Returns true if this (category, number) pair was
    /// never owned before, ignoring the upgrade flag (new-card reward).
    pub fn push_card(&mut self, card: CardId) -> bool {
        let is_new = !self.cards.iter().any(|c| c.base() == card.base());
        self.cards.push(card);
        is_new
    }

    /// Remove one card by index (sale). Returns the removed card.
    pub fn remove_card(&mut self, index: usize) -> Option<CardId> {
        if index < self.cards.len() {
            Some(self.cards.remove(index))
        } else {
            None
        }
    }

    pub fn stats(&self, category: Category) -> CategoryStats {
        let mut stats = CategoryStats::default();
        for card in &self.cards {
            if card.category != category {
                continue;
            }
            let slot = card.number as usize - 1;
            if card.upgraded {
                stats.upgraded[slot] += 1;
            } else {
                stats.plain[slot] += 1;
            }
        }
        stats
    }

    /// Count all cards of a category, plain and upgraded alike.
    pub fn category_count(&self, category: Category) -> u32 {
        self.cards
            .iter()
            .filter(|c| c.category == category)
            .count() as u32
    }

    pub fn count_of(&self, category: Category, number: u8, upgraded: bool) -> u32 {
        self.cards
            .iter()
            .filter(|c| c.category == category && c.number == number && c.upgraded == upgraded)
            .count() as u32
    }

    pub fn owns_base(&self, category: Category, number: u8) -> bool {
        self.cards.iter().any(|c| c.base() == (category, number))
    }

    /// Marker-card count (drives mark chance and marked-clear scoring).
    pub fn marker_count(&self) -> u32 {
        self.category_count(Category::E)
    }

    /// Auto-merge: while a plain unlocking card (A3) is owned, every two
    /// copies of an identical plain A card convert to one upgraded copy.
    /// The unlock is checked once per call, so a pair of A3s can merge
    /// itself away and still finish merging the other numbers.
    /// Returns the number of merges performed.
    pub fn auto_merge(&mut self) -> u32 {
        if self.count_of(Category::A, 3, false) == 0 {
            return 0;
        }
        let mut merges = 0;
        for number in 1..=4u8 {
            loop {
                let indices: Vec<usize> = self
                    .cards
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| {
                        c.category == Category::A && c.number == number && !c.upgraded
                    })
                    .map(|(i, _)| i)
                    .take(2)
                    .collect();
                if indices.len() < 2 {
                    break;
                }
                // Remove the higher index first to keep the lower valid.
                self.cards.remove(indices[1]);
                self.cards.remove(indices[0]);
                let upgraded = CardId::new(Category::A, number)
                    .map(CardId::upgraded)
                    .unwrap_or(CardId {
                        category: Category::A,
                        number,
                        upgraded: true,
                    });
                self.cards.push(upgraded);
                merges += 1;
            }
        }
        merges
    }

    /// Abundance trigger: with the enabling item owned, a category whose
    /// total just reached a multiple of 5 forces a binary choice between
    /// two distinct random numbers of that category.
    pub fn abundance_choice(
        &self,
        just_added: Category,
        rng: &mut SimpleRng,
    ) -> Option<(Category, [u8; 2])> {
        if self.item_count(ItemKind::Banana) == 0 {
            return None;
        }
        let count = self.category_count(just_added);
        if count == 0 || count % 5 != 0 {
            return None;
        }
        let mut numbers = vec![1u8, 2, 3, 4];
        let a = numbers.remove(rng.next_range(numbers.len() as u32) as usize);
        let b = numbers[rng.next_range(numbers.len() as u32) as usize];
        Some((just_added, [a, b]))
    }

    pub fn add_item(&mut self, item: ItemKind) {
        self.items[item.index()] += 1;
    }

    pub fn item_count(&self, item: ItemKind) -> u32 {
        self.items[item.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(s: &str) -> CardId {
        CardId::parse(s).unwrap()
    }

    #[test]
    fn test_push_card_new_base_detection() {
        let mut inv = Inventory::new();
        assert!(inv.push_card(card("A1")));
        assert!(!inv.push_card(card("A1")));
        // Upgrade flag is ignored when deciding novelty.
        assert!(!inv.push_card(card("A+1")));
        assert!(inv.push_card(card("B1")));
    }

    #[test]
    fn test_stats_and_effective_count() {
        let mut inv = Inventory::new();
        for s in ["A1", "A1", "A+2", "A4", "B1"] {
            inv.push_card(card(s));
        }
        let stats = inv.stats(Category::A);
        assert_eq!(stats.plain_of(1), 2);
        assert_eq!(stats.upgraded_of(2), 1);
        assert_eq!(stats.plain_of(4), 1);
        assert_eq!(stats.total(), 4);
        // 3 plain + 2x1 upgraded
        assert_eq!(stats.effective_count(), 5);
    }

    #[test]
    fn test_auto_merge_requires_unlock() {
        let mut inv = Inventory::new();
        inv.push_card(card("A1"));
        inv.push_card(card("A1"));
        assert_eq!(inv.auto_merge(), 0);
        assert_eq!(inv.count_of(Category::A, 1, false), 2);

        inv.push_card(card("A3"));
        assert_eq!(inv.auto_merge(), 1);
        assert_eq!(inv.count_of(Category::A, 1, false), 0);
        assert_eq!(inv.count_of(Category::A, 1, true), 1);
    }

    #[test]
    fn test_auto_merge_repeats_until_fewer_than_two() {
        let mut inv = Inventory::new();
        inv.push_card(card("A3"));
        for _ in 0..5 {
            inv.push_card(card("A2"));
        }
        assert_eq!(inv.auto_merge(), 2);
        assert_eq!(inv.count_of(Category::A, 2, false), 1);
        assert_eq!(inv.count_of(Category::A, 2, true), 2);
    }

    #[test]
    fn test_auto_merge_merges_the_unlock_pair_itself() {
        let mut inv = Inventory::new();
        inv.push_card(card("A3"));
        inv.push_card(card("A3"));
        inv.push_card(card("A4"));
        inv.push_card(card("A4"));
        assert_eq!(inv.auto_merge(), 2);
        assert_eq!(inv.count_of(Category::A, 3, true), 1);
        assert_eq!(inv.count_of(Category::A, 4, true), 1);
        // With the plain A3 gone, merging is locked again.
        inv.push_card(card("A4"));
        inv.push_card(card("A4"));
        assert_eq!(inv.auto_merge(), 0);
    }

    #[test]
    fn test_auto_merge_ignores_other_categories() {
        let mut inv = Inventory::new();
        inv.push_card(card("A3"));
        inv.push_card(card("B1"));
        inv.push_card(card("B1"));
        assert_eq!(inv.auto_merge(), 0);
        assert_eq!(inv.count_of(Category::B, 1, false), 2);
    }

    #[test]
    fn test_abundance_needs_item_and_multiple_of_five() {
        let mut inv = Inventory::new();
        let mut rng = SimpleRng::new(1);
        for _ in 0..5 {
            inv.push_card(card("B1"));
        }
        assert!(inv.abundance_choice(Category::B, &mut rng).is_none());

        inv.add_item(ItemKind::Banana);
        let (cat, options) = inv.abundance_choice(Category::B, &mut rng).unwrap();
        assert_eq!(cat, Category::B);
        assert_ne!(options[0], options[1]);
        assert!(options.iter().all(|n| (1..=4).contains(n)));

        inv.push_card(card("B2"));
        // 6 cards: not a multiple of 5.
        assert!(inv.abundance_choice(Category::B, &mut rng).is_none());
    }

    #[test]
    fn test_remove_card_out_of_range() {
        let mut inv = Inventory::new();
        inv.push_card(card("A1"));
        assert!(inv.remove_card(5).is_none());
        assert_eq!(inv.remove_card(0), Some(card("A1")));
        assert!(inv.cards().is_empty());
    }

    #[test]
    fn test_item_counts() {
        let mut inv = Inventory::new();
        assert_eq!(inv.item_count(ItemKind::IronShield), 0);
        inv.add_item(ItemKind::IronShield);
        inv.add_item(ItemKind::IronShield);
        assert_eq!(inv.item_count(ItemKind::IronShield), 2);
    }
}
