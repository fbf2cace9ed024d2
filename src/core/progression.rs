//! Progression module - levels, tasks, rewards and the shop
//!
//! Pure progression data and generators. The session drives the phase
//! machine; this module supplies level targets, failure damage, task
//! option generation, card draws (with wish honoring) and shop stock.

use crate::core::SimpleRng;
use crate::types::{CardId, Category, Color, ItemKind, ShapeKind, WishKind};

/// Score targets per stage. Score resets to zero when a stage is cleared;
/// clearing the last target wins the run.
pub const LEVEL_TARGETS: [u32; 10] = [
    600, 1_800, 4_000, 8_000, 14_000, 24_000, 40_000, 70_000, 120_000, 240_000,
];

/// Target for a 1-based stage. None past the final stage.
pub fn target_for_stage(stage: u32) -> Option<u32> {
    LEVEL_TARGETS.get(stage as usize - 1).copied()
}

/// HP damage for the n-th failed attempt at a stage (0-based).
pub fn damage_for_attempt(attempt: u32) -> u32 {
    match attempt {
        0 => 10,
        1 => 20,
        2 => 40,
        _ => 50,
    }
}

/// Stages whose clear flags the next task set to carry a card reward.
pub const CARD_TASK_STAGES: [u32; 3] = [2, 5, 8];

/// What a task asks the player to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Remove this many blocks of one color via sweeps.
    RemoveColor(Color),
    /// Clear this many lines.
    ClearLines,
    /// Land this many pieces of one shape.
    DropShape(ShapeKind),
    /// Build any column up to the target height.
    ReachHeight,
}

/// An accepted (or offered) side task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Task {
    pub kind: TaskKind,
    pub target: u32,
    pub progress: u32,
    pub coins: u32,
    /// Completion additionally grants a random card.
    pub card_reward: bool,
    pub completed: bool,
}

impl Task {
    /// Advance progress; returns true on the transition to completed.
    pub fn advance(&mut self, amount: u32) -> bool {
        if self.completed {
            return false;
        }
        self.progress += amount;
        if self.progress >= self.target {
            self.completed = true;
            true
        } else {
            false
        }
    }

    /// For height tasks progress is a level, not a running total.
    pub fn observe(&mut self, value: u32) -> bool {
        if self.completed {
            return false;
        }
        self.progress = self.progress.max(value);
        if self.progress >= self.target {
            self.completed = true;
            true
        } else {
            false
        }
    }
}

/// Coin reward roll; a better shop pays better tasks.
fn task_coins(rng: &mut SimpleRng, shop_tier: u32) -> u32 {
    match shop_tier {
        1 => 1 + rng.next_range(3),
        2 => 2 + rng.next_range(3),
        _ => 3 + rng.next_range(4),
    }
}

fn random_task(rng: &mut SimpleRng, shop_tier: u32, card_reward: bool) -> Task {
    let (kind, target) = match rng.next_range(4) {
        0 => {
            let color = Color::ALL[rng.next_range(4) as usize];
            (TaskKind::RemoveColor(color), 8 + rng.next_range(23))
        }
        1 => (TaskKind::ClearLines, 1 + rng.next_range(8)),
        2 => {
            let shape = ShapeKind::ALL[rng.next_range(7) as usize];
            (TaskKind::DropShape(shape), 5 + rng.next_range(16))
        }
        _ => (TaskKind::ReachHeight, 6 + rng.next_range(15)),
    };
    Task {
        kind,
        target,
        progress: 0,
        coins: task_coins(rng, shop_tier),
        card_reward,
        completed: false,
    }
}

/// Generate the three task options offered before a stage.
pub fn generate_task_options(rng: &mut SimpleRng, shop_tier: u32, include_card: bool) -> Vec<Task> {
    (0..3)
        .map(|_| random_task(rng, shop_tier, include_card))
        .collect()
}

/// Draw one random plain card: uniform drawable category, number up to
/// the cap.
pub fn random_card(rng: &mut SimpleRng, max_number: u8) -> CardId {
    let category = Category::DRAWABLE[rng.next_range(4) as usize];
    let number = 1 + rng.next_range(u32::from(max_number)) as u8;
    CardId::new(category, number).unwrap_or(CardId {
        category,
        number: 1,
        upgraded: false,
    })
}

/// Draw a set of cards, honoring (and consuming) a pending wish: the
/// first slot is forced to match the wished category or number. A wished
/// number above the cap is clamped to it.
pub fn draw_cards(
    rng: &mut SimpleRng,
    count: usize,
    max_number: u8,
    wish: &mut Option<WishKind>,
) -> Vec<CardId> {
    let mut cards: Vec<CardId> = (0..count).map(|_| random_card(rng, max_number)).collect();
    if let Some(kind) = wish.take() {
        if let Some(first) = cards.first_mut() {
            match kind {
                WishKind::Category(category) => first.category = category,
                WishKind::Number(number) => first.number = number.min(max_number).max(1),
            }
        }
    }
    cards
}

/// Highest card number drawable at a shop tier.
pub fn max_card_number(shop_tier: u32) -> u8 {
    match shop_tier {
        1 => 1,
        2 => 2,
        _ => 4,
    }
}

/// Coins to upgrade the shop out of a tier. None at the top tier.
pub fn shop_upgrade_cost(shop_tier: u32) -> Option<u32> {
    match shop_tier {
        1 => Some(5),
        2 => Some(10),
        _ => None,
    }
}

/// Flat price of every card on the shop shelf.
pub const SHOP_CARD_PRICE: u32 = 3;
/// Price of one reroll and of a wish.
pub const REROLL_PRICE: u32 = 1;
pub const WISH_PRICE: u32 = 3;

/// One shop visit's shelf. Regenerated after every purchase and on each
/// reroll; the wish is once per visit.
#[derive(Debug, Clone, Default)]
pub struct ShopStock {
    pub cards: Vec<CardId>,
    pub item: Option<ItemKind>,
    pub rerolls_used: u32,
    pub wish_used: bool,
}

impl ShopStock {
    /// Generate a shelf for the current tier. Tier 1 sells nothing but
    /// the upgrade; tier 2 one low card; tier 3 two cards and an item.
    pub fn generate(rng: &mut SimpleRng, shop_tier: u32, wish: &mut Option<WishKind>) -> Self {
        let max_number = max_card_number(shop_tier);
        let card_count = match shop_tier {
            1 => 0,
            2 => 1,
            _ => 2,
        };
        let cards = draw_cards(rng, card_count, max_number, wish);
        let item = (shop_tier >= 3)
            .then(|| ItemKind::ALL[rng.next_range(ItemKind::COUNT as u32) as usize]);
        Self {
            cards,
            item,
            rerolls_used: 0,
            wish_used: false,
        }
    }

    /// Restock cards and item, keeping the per-visit reroll/wish tallies.
    pub fn restock(&mut self, rng: &mut SimpleRng, shop_tier: u32, wish: &mut Option<WishKind>) {
        let fresh = Self::generate(rng, shop_tier, wish);
        self.cards = fresh.cards;
        self.item = fresh.item;
    }
}

/// Top-level run state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Before `start()`.
    #[default]
    Idle,
    /// Choosing one of three starter cards.
    PreStart,
    /// Choosing one of three side tasks for the stage.
    TaskSelection,
    Playing,
    /// Choosing the level-clear reward card.
    RewardSelection,
    /// Between reward and next stage; the shop is reachable from here.
    InterLevel,
    Shop,
    GameOver {
        victory: bool,
    },
}
