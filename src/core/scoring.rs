//! Scoring module - pure score and timing formulas
//!
//! Everything here is a pure function of counts, so card effects are
//! testable without a board. Fractional intermediates are kept in f64 and
//! floored exactly once, at the outermost formula that awards points.

use crate::core::CategoryStats;
use crate::types::{BASE_DROP_MS, DROP_MS_FLOOR, DROP_MS_PER_LEVEL};

/// Base points for clearing 1..=4+ rows at once.
pub fn line_clear_base(rows: u32) -> u32 {
    match rows {
        0 => 0,
        1 => 100,
        2 => 300,
        3 => 500,
        _ => 800,
    }
}

/// Speed level derived from total cleared lines.
pub fn speed_level(lines: u32) -> u32 {
    lines / 10 + 1
}

/// Gravity interval for a speed level, clamped to the floor.
pub fn gravity_ms(level: u32) -> u32 {
    BASE_DROP_MS
        .saturating_sub(level.saturating_sub(1) * DROP_MS_PER_LEVEL)
        .max(DROP_MS_FLOOR)
}

/// Per-copy rates for the multiplying amplifier cards. Upgraded copies
/// run at five times the plain rate.
const A1_RATE: f64 = 0.08;
const A2_RATE: f64 = 0.03;

/// Multiplicative line-clear bonus from amplifier (A) cards.
///
/// A1 multiplies per copy at 8% (upgraded copies at five times the rate);
/// A2 at 3% per effective A card owned, again x5 when upgraded. The
/// effective count weighs upgraded copies double.
pub fn per_line_multiplier(a: &CategoryStats) -> f64 {
    let effective = f64::from(a.effective_count());
    let mut mult = 1.0;
    mult *= (1.0 + A1_RATE).powi(a.plain_of(1) as i32);
    mult *= (1.0 + A1_RATE * 5.0).powi(a.upgraded_of(1) as i32);
    mult *= (1.0 + A2_RATE * effective).powi(a.plain_of(2) as i32);
    mult *= (1.0 + A2_RATE * 5.0 * effective).powi(a.upgraded_of(2) as i32);
    mult
}

/// Total points for a sweep: base x speed level x card multiplier,
/// floored once.
pub fn line_clear_score(rows: u32, level: u32, multiplier: f64) -> u32 {
    let raw = f64::from(line_clear_base(rows)) * f64::from(level) * multiplier;
    raw.floor() as u32
}

/// Flat landing bonus from A4 copies, scaled by speed level and the
/// effective A count.
pub fn landing_bonus(a: &CategoryStats, level: u32) -> u32 {
    let copies = f64::from(a.plain_of(4)) + 5.0 * f64::from(a.upgraded_of(4));
    if copies == 0.0 {
        return 0;
    }
    let effective = f64::from(a.effective_count());
    let raw = 100.0 * f64::from(level) * copies * (1.0 + 0.15 * effective);
    raw.floor() as u32
}

/// Points for clearing `cells` marked blocks (sweep of a marked row, or
/// a sniper shot), scaled by owned marker cards.
pub fn marked_clear_score(marker_cards: u32, cells: u32) -> u32 {
    if cells == 0 {
        return 0;
    }
    let raw = 100.0 * (1.0 + 0.5 * f64::from(marker_cards)) * f64::from(cells);
    raw.floor() as u32
}

/// D1: flat bonus per blue block removed by a sweep.
pub fn blue_sweep_bonus(d1_copies: u32, blue_blocks: u32) -> u32 {
    20 * d1_copies * blue_blocks
}

/// Iron sword: flat bonus per block removed by a sweep.
pub fn sword_sweep_bonus(sword_copies: u32, blocks: u32) -> u32 {
    50 * sword_copies * blocks
}

/// D2: flat bonus when a red piece lands.
pub fn red_landing_bonus(d2_copies: u32) -> u32 {
    100 * d2_copies
}

/// D3: flat bonus from the second consecutive green landing onward.
pub fn green_streak_bonus(d3_copies: u32) -> u32 {
    50 * d3_copies
}

/// Star meter threshold: every B3 copy lowers it, never below 3.
pub fn star_threshold(b3_copies: u32) -> u32 {
    3.max(12u32.saturating_sub(b3_copies))
}

/// Points per star trigger, compounding 25% per B2 copy.
pub fn star_award(b2_copies: u32) -> u32 {
    (200.0 * 1.25f64.powi(b2_copies as i32)).floor() as u32
}

/// Points per block removed by a star explosion.
pub const EXPLOSION_SCORE_PER_BLOCK: u32 = 300;

/// Points for a companion-pet meal of `blocks` blocks. C4 copies scale
/// the per-block value; a badge-stage pet adds a flat term per block
/// driven by the total caretaker (C) card count.
pub fn pet_eat_score(blocks: u32, c4_copies: u32, badge: bool, total_c: u32) -> u32 {
    if blocks == 0 {
        return 0;
    }
    let c4 = f64::from(c4_copies);
    let mut per_block = 200.0 * (1.0 + 0.5 * c4);
    if badge {
        per_block += f64::from(total_c) * 200.0 * (1.0 + 0.3 * c4);
    }
    (per_block * f64::from(blocks)).floor() as u32
}
