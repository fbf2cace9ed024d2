//! Special mechanics - star meter, sniper, companion pet
//!
//! Three stateful mechanics that sit beside the board. Each is a small
//! counter machine with no knowledge of scoring; the session converts
//! their outcomes into points, coins and healing.

use crate::types::Character;

/// Accumulating star meter (B cards). Layers build on every landing and
/// drain in threshold-sized chunks, each chunk awarding points. Past the
/// explosion threshold the bottom rows detonate and the meter drops by a
/// fixed amount.
#[derive(Debug, Clone, Default)]
pub struct StarMeter {
    layers: u32,
    explosion_in_progress: bool,
}

/// Meter decrease after an explosion resolves.
const EXPLOSION_DRAIN: u32 = 40;
/// Rows emptied by an explosion.
pub const EXPLOSION_ROWS: usize = 3;

impl StarMeter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layers(&self) -> u32 {
        self.layers
    }

    pub fn add(&mut self, layers: u32) {
        self.layers += layers;
    }

    /// Drain the meter in threshold-sized chunks. Returns the number of
    /// chunks drained (each one awards points).
    pub fn drain(&mut self, threshold: u32) -> u32 {
        if threshold == 0 {
            return 0;
        }
        let mut triggers = 0;
        while self.layers >= threshold {
            self.layers -= threshold;
            triggers += 1;
        }
        triggers
    }

    /// Start an explosion if the meter is past the character's threshold
    /// and no explosion is already playing out.
    pub fn try_begin_explosion(&mut self, character: Character) -> bool {
        if self.explosion_in_progress || self.layers < character.explosion_threshold() {
            return false;
        }
        self.explosion_in_progress = true;
        true
    }

    /// Finish an explosion: drop the meter and release the guard.
    pub fn finish_explosion(&mut self) {
        self.layers = self.layers.saturating_sub(EXPLOSION_DRAIN);
        self.explosion_in_progress = false;
    }

    pub fn explosion_in_progress(&self) -> bool {
        self.explosion_in_progress
    }

    pub fn reset(&mut self) {
        self.layers = 0;
        self.explosion_in_progress = false;
    }
}

/// Charge needed to arm one sniper shot.
const SNIPER_ARM_COST: u32 = 15;

/// Sniper state (third marker card). Charge accrues from marked cells
/// cleared by sweeps even before the enabling card is owned; arming only
/// happens while it is, so a late acquisition spends the backlog. Arming
/// while already armed wastes the charge. A shot clears marked cells in
/// a 3x3 around the targeted cell.
#[derive(Debug, Clone, Default)]
pub struct Sniper {
    armed: bool,
    charge: u32,
}

impl Sniper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn armed(&self) -> bool {
        self.armed
    }

    pub fn charge(&self) -> u32 {
        self.charge
    }

    pub fn accrue(&mut self, amount: u32) {
        self.charge += amount;
    }

    /// Convert full charges into armed shots.
    pub fn try_arm(&mut self) {
        while self.charge >= SNIPER_ARM_COST {
            self.charge -= SNIPER_ARM_COST;
            self.armed = true;
        }
    }

    /// Consume the armed shot. Returns false when not armed.
    pub fn fire(&mut self) -> bool {
        if self.armed {
            self.armed = false;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.armed = false;
        self.charge = 0;
    }
}

/// Landings between pet meals once the pet has grown past stage 0.
const PET_EAT_INTERVAL: u32 = 15;
/// Feed totals at which the pet grows.
const PET_STAGE_FEEDS: [u32; 2] = [50, 200];

/// Coins and healing produced by a feeding (caretaker-card passives).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedOutcome {
    pub coins: u32,
    pub heal: u32,
}

/// The companion pet (C cards). Blocks removed by sweeps feed it; growth
/// stages unlock the periodic bottom-row meal and, at the badge stage, a
/// scoring bonus.
#[derive(Debug, Clone, Default)]
pub struct Pet {
    feed_count: u32,
    landing_count: u32,
    coin_milestone: u32,
    heal_milestone: u32,
}

impl Pet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed_count(&self) -> u32 {
        self.feed_count
    }

    /// Growth stage: 0 hatchling, 1 grown (eats), 2 badge.
    pub fn stage(&self) -> u32 {
        PET_STAGE_FEEDS
            .iter()
            .filter(|&&t| self.feed_count >= t)
            .count() as u32
    }

    pub fn has_badge(&self) -> bool {
        self.stage() >= 2
    }

    /// Feed `blocks` blocks. Coin and heal passives pay out per milestone
    /// crossed; milestones only advance while the matching card is owned,
    /// so a later acquisition credits the backlog.
    pub fn feed(&mut self, blocks: u32, has_coin_card: bool, has_heal_card: bool) -> FeedOutcome {
        self.feed_count += blocks;
        let mut outcome = FeedOutcome::default();
        if has_coin_card {
            let milestone = self.feed_count / 50;
            outcome.coins = milestone - self.coin_milestone;
            self.coin_milestone = milestone;
        }
        if has_heal_card {
            let milestone = self.feed_count / 30;
            outcome.heal = 5 * (milestone - self.heal_milestone);
            self.heal_milestone = milestone;
        }
        outcome
    }

    /// Count a landing. Returns true when this landing triggers a meal
    /// (every 15th landing, once the pet has grown).
    pub fn record_landing(&mut self) -> bool {
        self.landing_count += 1;
        self.stage() >= 1 && self.landing_count % PET_EAT_INTERVAL == 0
    }
}
