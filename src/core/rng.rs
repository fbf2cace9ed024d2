//! RNG module - weighted shape and color generation
//!
//! A simple LCG drives all randomness so whole sessions replay
//! deterministically from a seed. Shape selection is weighted with an
//! anti-streak bias: once the same shape has been drawn twice in a row its
//! weight is cut to 5% for the next draw. Color selection samples over
//! mutable per-color weights that only ever grow (D-card acquisitions).

use crate::types::{
    Color, ShapeKind, BASE_COLOR_WEIGHT, COLOR_WEIGHT_BOOST, STREAK_PENALTY,
};

/// Simple LCG (Linear Congruential Generator) RNG
/// Uses constants from Numerical Recipes
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u32) -> Self {
        // Avoid 0 seed which would produce all zeros
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u32
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Generate random value in range [0, max)
    pub fn next_range(&mut self, max: u32) -> u32 {
        self.next_u32() % max
    }

    /// Generate a random f64 in [0, 1)
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / (f64::from(u32::MAX) + 1.0)
    }

    /// Random roll against a probability in [0, 1]
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Pick an index from a weight table. Zero-total tables fall back to
    /// a uniform pick.
    pub fn pick_weighted(&mut self, weights: &[f64]) -> usize {
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return self.next_range(weights.len() as u32) as usize;
        }
        let mut r = self.next_f64() * total;
        for (i, &w) in weights.iter().enumerate() {
            if r < w {
                return i;
            }
            r -= w;
        }
        weights.len() - 1
    }
}

/// Weighted piece and color generator with anti-streak bias.
#[derive(Debug, Clone)]
pub struct PieceGenerator {
    rng: SimpleRng,
    last_shape: Option<ShapeKind>,
    streak: u32,
    color_weights: [f64; 4],
}

impl PieceGenerator {
    pub fn new(seed: u32) -> Self {
        Self {
            rng: SimpleRng::new(seed),
            last_shape: None,
            streak: 0,
            color_weights: [BASE_COLOR_WEIGHT; 4],
        }
    }

    /// Draw a shape id. All 7 shapes carry base weight 1; a shape that has
    /// already appeared twice in a row is de-emphasized but stays possible.
    pub fn gen_shape(&mut self) -> ShapeKind {
        let mut weights = [1.0f64; 7];
        if let Some(last) = self.last_shape {
            if self.streak >= 2 {
                weights[last.id() as usize - 1] *= STREAK_PENALTY;
            }
        }
        let idx = self.rng.pick_weighted(&weights);
        let chosen = ShapeKind::ALL[idx];

        if Some(chosen) == self.last_shape {
            self.streak += 1;
        } else {
            self.last_shape = Some(chosen);
            self.streak = 1;
        }
        chosen
    }

    /// Weighted pick over the four colors using the current weights.
    pub fn sample_color(&mut self) -> Color {
        let idx = self.rng.pick_weighted(&self.color_weights);
        Color::from_index(idx).unwrap_or(Color::Red)
    }

    /// Permanently raise one color's weight (D-card acquisition).
    pub fn boost_color(&mut self, color: Color) {
        self.color_weights[color.index()] += COLOR_WEIGHT_BOOST;
    }

    pub fn color_weights(&self) -> &[f64; 4] {
        &self.color_weights
    }

    /// Whether orange currently outweighs every other color strictly
    /// (the wildcard condition for D4 scoring).
    pub fn orange_is_wildcard(&self) -> bool {
        let w = &self.color_weights;
        w[3] > w[0].max(w[1]).max(w[2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rng_deterministic() {
        let mut rng1 = SimpleRng::new(12345);
        let mut rng2 = SimpleRng::new(12345);
        for _ in 0..100 {
            assert_eq!(rng1.next_u32(), rng2.next_u32());
        }
    }

    #[test]
    fn test_next_f64_range() {
        let mut rng = SimpleRng::new(7);
        for _ in 0..1000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_pick_weighted_skips_zero_weight() {
        let mut rng = SimpleRng::new(42);
        for _ in 0..200 {
            let idx = rng.pick_weighted(&[0.0, 1.0, 0.0]);
            assert_eq!(idx, 1);
        }
    }

    #[test]
    fn test_gen_shape_covers_all_shapes() {
        let mut gen = PieceGenerator::new(1);
        let mut seen = [false; 7];
        for _ in 0..2000 {
            seen[gen.gen_shape().id() as usize - 1] = true;
        }
        assert!(seen.iter().all(|&s| s), "all 7 shapes should appear");
    }

    #[test]
    fn test_anti_streak_suppresses_long_runs() {
        let mut gen = PieceGenerator::new(99);
        let mut longest = 0u32;
        let mut current = 0u32;
        let mut last = None;
        for _ in 0..5000 {
            let s = gen.gen_shape();
            if Some(s) == last {
                current += 1;
            } else {
                current = 1;
                last = Some(s);
            }
            longest = longest.max(current);
        }
        // With the 5% penalty a run of 5+ is vanishingly unlikely.
        assert!(longest <= 4, "longest streak was {longest}");
    }

    #[test]
    fn test_color_boost_shifts_distribution() {
        let mut gen = PieceGenerator::new(5);
        for _ in 0..200 {
            gen.boost_color(Color::Blue);
        }
        let mut blue = 0;
        let n = 2000;
        for _ in 0..n {
            if gen.sample_color() == Color::Blue {
                blue += 1;
            }
        }
        // Blue weight 2100 of 2400 total; expect a dominant share.
        assert!(blue > n / 2, "blue drawn {blue} of {n}");
    }

    #[test]
    fn test_orange_wildcard_condition() {
        let mut gen = PieceGenerator::new(1);
        assert!(!gen.orange_is_wildcard());
        gen.boost_color(Color::Orange);
        assert!(gen.orange_is_wildcard());
        gen.boost_color(Color::Red);
        assert!(!gen.orange_is_wildcard());
    }
}
