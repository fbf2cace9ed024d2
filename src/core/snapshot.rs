//! Snapshot module - a render-ready view of one session frame
//!
//! The renderer never reaches into the session; it pulls an owned
//! snapshot once per frame. The grid comes pre-composited with the
//! active piece drawn in.

use crate::core::session::EffectKind;
use crate::core::{Phase, Session, ShopStock, Task};
use crate::types::{CardId, Cell, Color, ShapeKind, BOARD_HEIGHT, BOARD_WIDTH};

/// Visual effect in flight, with its remaining window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotEffect {
    LineClear,
    StarExplosion,
    PetEat,
}

#[derive(Debug, Clone)]
pub struct GameSnapshot {
    /// Board cells, row-major, with the active piece composited in.
    pub cells: Vec<Cell>,
    pub next_shape: ShapeKind,
    pub next_color: Color,
    pub score: u32,
    pub target: u32,
    pub lines: u32,
    pub coins: u32,
    pub hp: u32,
    pub max_hp: u32,
    pub stage: u32,
    pub shop_tier: u32,
    pub speed_level: u32,
    pub time_left_ms: u32,
    pub star_layers: u32,
    pub sniper_armed: bool,
    /// (stage, feed count) when a pet exists.
    pub pet: Option<(u32, u32)>,
    pub phase: Phase,
    pub paused: bool,
    pub cards: Vec<CardId>,
    pub task: Option<Task>,
    pub effect: Option<(SnapshotEffect, u32)>,
    /// Offered cards (starter pick or level reward).
    pub offers: Vec<CardId>,
    pub task_options: Vec<Task>,
    /// Current shop shelf (meaningful during the shop phase).
    pub shop: ShopStock,
    /// Suspended abundance choice, if one is pending.
    pub abundance: Option<[CardId; 2]>,
}

impl GameSnapshot {
    pub fn capture(session: &Session) -> Self {
        let width = BOARD_WIDTH as usize;
        let mut cells = session.board().cells().to_vec();
        if let Some(piece) = session.active_piece() {
            for (x, y) in piece.cells() {
                if x >= 0 && y >= 0 && (x as usize) < width && (y as usize) < BOARD_HEIGHT as usize
                {
                    cells[y as usize * width + x as usize] = Cell::Occupied {
                        color: piece.color,
                        shape: piece.shape,
                        marked: false,
                    };
                }
            }
        }
        let (next_shape, next_color) = session.next_piece();
        let effect = session.effect().map(|(kind, remaining)| {
            let label = match kind {
                EffectKind::LineClear { .. } => SnapshotEffect::LineClear,
                EffectKind::StarExplosion => SnapshotEffect::StarExplosion,
                EffectKind::PetEat => SnapshotEffect::PetEat,
            };
            (label, remaining)
        });
        let abundance = session.pending_abundance().and_then(|(category, numbers)| {
            let a = CardId::new(category, numbers[0])?;
            let b = CardId::new(category, numbers[1])?;
            Some([a, b])
        });
        Self {
            cells,
            next_shape,
            next_color,
            score: session.score(),
            target: session.stage_target(),
            lines: session.lines(),
            coins: session.coins(),
            hp: session.hp(),
            max_hp: session.max_hp(),
            stage: session.stage(),
            shop_tier: session.shop_tier(),
            speed_level: session.speed_level(),
            time_left_ms: session.time_left_ms(),
            star_layers: session.star_layers(),
            sniper_armed: session.sniper_armed(),
            pet: session.pet().map(|p| (p.stage(), p.feed_count())),
            phase: session.phase(),
            paused: session.paused(),
            cards: session.inventory().cards().to_vec(),
            task: session.task().copied(),
            effect,
            offers: session.offers().to_vec(),
            task_options: session.task_options().to_vec(),
            shop: session.shop_stock().clone(),
            abundance,
        }
    }

    pub fn cell(&self, x: usize, y: usize) -> Cell {
        self.cells
            .get(y * BOARD_WIDTH as usize + x)
            .copied()
            .unwrap_or(Cell::Empty)
    }
}
