//! GameView: maps a `GameSnapshot` into a terminal framebuffer.
//!
//! This module is pure (no I/O). It can be unit-tested.

use crate::core::progression::shop_upgrade_cost;
use crate::core::snapshot::{GameSnapshot, SnapshotEffect};
use crate::core::{Phase, Task, TaskKind};
use crate::term::fb::{FrameBuffer, GlyphStyle, Rgb};
use crate::types::{Cell, Color, ShapeKind, BOARD_HEIGHT, BOARD_WIDTH};

/// Terminal viewport dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

/// Framebuffer-based view of one run.
pub struct GameView {
    /// Board cell width in terminal columns.
    cell_w: u16,
    /// Board cell height in terminal rows.
    cell_h: u16,
}

impl Default for GameView {
    fn default() -> Self {
        // 2x1 compensates for typical terminal glyph aspect ratio.
        Self {
            cell_w: 2,
            cell_h: 1,
        }
    }
}

const BG: Rgb = Rgb::new(28, 28, 36);
const PANEL_FG: Rgb = Rgb::new(210, 210, 210);

fn color_rgb(color: Color) -> Rgb {
    match color {
        Color::Red => Rgb::new(220, 80, 80),
        Color::Green => Rgb::new(100, 220, 120),
        Color::Blue => Rgb::new(90, 140, 240),
        Color::Orange => Rgb::new(255, 165, 0),
    }
}

impl GameView {
    pub fn new(cell_w: u16, cell_h: u16) -> Self {
        Self { cell_w, cell_h }
    }

    /// Top-left terminal coordinate of the board frame.
    fn board_origin(&self, viewport: Viewport) -> (u16, u16) {
        let frame_h = BOARD_HEIGHT as u16 * self.cell_h + 2;
        let start_y = viewport.height.saturating_sub(frame_h) / 2;
        (1, start_y)
    }

    /// Map a terminal coordinate back to a board cell (mouse targeting).
    pub fn board_cell_at(&self, viewport: Viewport, col: u16, row: u16) -> Option<(i8, i8)> {
        let (ox, oy) = self.board_origin(viewport);
        let inner_x = col.checked_sub(ox + 1)?;
        let inner_y = row.checked_sub(oy + 1)?;
        let x = inner_x / self.cell_w;
        let y = inner_y / self.cell_h;
        if x < BOARD_WIDTH as u16 && y < BOARD_HEIGHT as u16 {
            Some((x as i8, y as i8))
        } else {
            None
        }
    }

    /// Render one frame.
    pub fn render(&self, snap: &GameSnapshot, viewport: Viewport) -> FrameBuffer {
        let mut fb = FrameBuffer::new(viewport.width, viewport.height);
        fb.clear();

        let (start_x, start_y) = self.board_origin(viewport);
        let board_w = BOARD_WIDTH as u16 * self.cell_w;
        let board_h = BOARD_HEIGHT as u16 * self.cell_h;
        let frame_w = board_w + 2;
        let frame_h = board_h + 2;

        fb.fill_rect(
            start_x + 1,
            start_y + 1,
            board_w,
            board_h,
            ' ',
            GlyphStyle::plain(Rgb::new(80, 80, 90), BG),
        );
        self.draw_border(&mut fb, start_x, start_y, frame_w, frame_h);

        for y in 0..BOARD_HEIGHT as usize {
            for x in 0..BOARD_WIDTH as usize {
                match snap.cell(x, y) {
                    Cell::Empty => {
                        let style = GlyphStyle {
                            fg: Rgb::new(70, 70, 80),
                            bg: BG,
                            bold: false,
                            dim: true,
                        };
                        self.fill_cell(&mut fb, start_x, start_y, x as u16, y as u16, '·', style);
                    }
                    Cell::Occupied { color, marked, .. } => {
                        let style = GlyphStyle {
                            fg: color_rgb(color),
                            bg: BG,
                            bold: true,
                            dim: false,
                        };
                        let ch = if marked { '◆' } else { '█' };
                        self.fill_cell(&mut fb, start_x, start_y, x as u16, y as u16, ch, style);
                    }
                }
            }
        }

        self.draw_side_panel(&mut fb, snap, viewport, start_x + frame_w + 2, start_y);
        self.draw_overlays(&mut fb, snap, start_x, start_y, frame_w, frame_h);
        fb
    }

    fn draw_border(&self, fb: &mut FrameBuffer, x: u16, y: u16, w: u16, h: u16) {
        let style = GlyphStyle::plain(Rgb::new(200, 200, 200), Rgb::new(0, 0, 0));
        fb.put_char(x, y, '┌', style);
        fb.put_char(x + w - 1, y, '┐', style);
        fb.put_char(x, y + h - 1, '└', style);
        fb.put_char(x + w - 1, y + h - 1, '┘', style);
        for dx in 1..w - 1 {
            fb.put_char(x + dx, y, '─', style);
            fb.put_char(x + dx, y + h - 1, '─', style);
        }
        for dy in 1..h - 1 {
            fb.put_char(x, y + dy, '│', style);
            fb.put_char(x + w - 1, y + dy, '│', style);
        }
    }

    fn fill_cell(
        &self,
        fb: &mut FrameBuffer,
        start_x: u16,
        start_y: u16,
        x: u16,
        y: u16,
        ch: char,
        style: GlyphStyle,
    ) {
        let px = start_x + 1 + x * self.cell_w;
        let py = start_y + 1 + y * self.cell_h;
        fb.fill_rect(px, py, self.cell_w, self.cell_h, ch, style);
    }

    fn draw_side_panel(
        &self,
        fb: &mut FrameBuffer,
        snap: &GameSnapshot,
        viewport: Viewport,
        panel_x: u16,
        start_y: u16,
    ) {
        if panel_x + 12 >= viewport.width {
            return;
        }
        let label = GlyphStyle {
            fg: PANEL_FG,
            bg: Rgb::new(0, 0, 0),
            bold: true,
            dim: false,
        };
        let value = GlyphStyle::plain(Rgb::new(190, 190, 190), Rgb::new(0, 0, 0));

        let mut y = start_y;
        let mut line = |fb: &mut FrameBuffer, y: &mut u16, head: &str, body: String| {
            fb.put_str(panel_x, *y, head, label);
            fb.put_str(panel_x + 7, *y, &body, value);
            *y += 1;
        };

        line(fb, &mut y, "STAGE", format!("{}", snap.stage));
        line(fb, &mut y, "SCORE", format!("{}/{}", snap.score, snap.target));
        let secs = snap.time_left_ms / 1000;
        line(fb, &mut y, "TIME", format!("{}:{:02}", secs / 60, secs % 60));
        line(fb, &mut y, "HP", format!("{}/{}", snap.hp, snap.max_hp));
        line(fb, &mut y, "COINS", format!("{}", snap.coins));
        line(fb, &mut y, "LINES", format!("{}", snap.lines));
        line(fb, &mut y, "SPEED", format!("{}", snap.speed_level));
        line(fb, &mut y, "STAR", format!("{}", snap.star_layers));
        y += 1;

        fb.put_str(panel_x, y, "NEXT", label);
        let next_style = GlyphStyle {
            fg: color_rgb(snap.next_color),
            bg: Rgb::new(0, 0, 0),
            bold: true,
            dim: false,
        };
        fb.put_str(panel_x + 7, y, shape_letter(snap.next_shape), next_style);
        y += 1;

        if snap.sniper_armed {
            fb.put_str(panel_x, y, "SNIPER ARMED - click a mark", label);
            y += 1;
        }
        if let Some((stage, feeds)) = snap.pet {
            line(fb, &mut y, "PET", format!("stage {stage} ({feeds} fed)"));
        }
        if let Some(task) = &snap.task {
            fb.put_str(panel_x, y, "TASK", label);
            y += 1;
            fb.put_str(panel_x, y, &task_label(task), value);
            y += 1;
        }
        y += 1;

        fb.put_str(panel_x, y, "CARDS", label);
        y += 1;
        let mut row = String::new();
        for card in &snap.cards {
            if row.len() + 4 > (viewport.width - panel_x) as usize {
                fb.put_str(panel_x, y, &row, value);
                y += 1;
                row.clear();
            }
            row.push_str(&card.to_string());
            row.push(' ');
        }
        if !row.is_empty() {
            fb.put_str(panel_x, y, &row, value);
        }
    }

    fn draw_overlays(
        &self,
        fb: &mut FrameBuffer,
        snap: &GameSnapshot,
        start_x: u16,
        start_y: u16,
        frame_w: u16,
        frame_h: u16,
    ) {
        let mut lines: Vec<String> = Vec::new();
        match &snap.phase {
            Phase::PreStart => {
                lines.push("PICK A STARTER CARD".to_string());
                for (i, card) in snap.offers.iter().enumerate() {
                    lines.push(format!("[{}] {card}", i + 1));
                }
            }
            Phase::TaskSelection => {
                lines.push("PICK A TASK".to_string());
                for (i, task) in snap.task_options.iter().enumerate() {
                    lines.push(format!("[{}] {} (+{}c)", i + 1, task_label(task), task.coins));
                }
            }
            Phase::RewardSelection => {
                lines.push("PICK A REWARD".to_string());
                for (i, card) in snap.offers.iter().enumerate() {
                    lines.push(format!("[{}] {card}", i + 1));
                }
                lines.push("[0] skip (+2c, cowboy)".to_string());
            }
            Phase::InterLevel => {
                lines.push(format!("STAGE {} CLEARED", snap.stage));
                lines.push("[n] next stage  [e] shop".to_string());
            }
            Phase::Shop => {
                lines.push(format!("SHOP tier {}", snap.shop_tier));
                for (i, card) in snap.shop.cards.iter().enumerate() {
                    lines.push(format!("[{}] {card} (3c)", i + 1));
                }
                if let Some(item) = snap.shop.item {
                    lines.push(format!("[i] {} (3c)", item.name()));
                }
                if let Some(cost) = shop_upgrade_cost(snap.shop_tier) {
                    lines.push(format!("[u] upgrade shop ({cost}c)"));
                }
                lines.push("[r] reroll (1c)  [x] sell newest card (+1c)".to_string());
                if !snap.shop.wish_used {
                    lines.push("[a/s/d/f] wish category  [6-9] wish number (3c)".to_string());
                }
                lines.push("[esc] leave".to_string());
            }
            Phase::GameOver { victory } => {
                lines.push(if *victory { "VICTORY" } else { "GAME OVER" }.to_string());
                lines.push("[q] quit".to_string());
            }
            _ => {}
        }

        if let Some(options) = &snap.abundance {
            lines.push("ABUNDANCE - pick one".to_string());
            lines.push(format!("[1] {}  [2] {}", options[0], options[1]));
        }
        if snap.paused {
            lines.push("PAUSED".to_string());
        }
        if let Some((effect, _)) = snap.effect {
            lines.push(
                match effect {
                    SnapshotEffect::LineClear => "LINE CLEAR!",
                    SnapshotEffect::StarExplosion => "STAR EXPLOSION!",
                    SnapshotEffect::PetEat => "NOM NOM",
                }
                .to_string(),
            );
        }
        if lines.is_empty() {
            return;
        }

        let style = GlyphStyle {
            fg: Rgb::new(255, 255, 255),
            bg: Rgb::new(0, 0, 0),
            bold: true,
            dim: false,
        };
        let mid = start_y + frame_h / 2;
        let top = mid.saturating_sub(lines.len() as u16 / 2);
        for (i, text) in lines.iter().enumerate() {
            let text_w = text.chars().count() as u16;
            let x = start_x.saturating_add(frame_w.saturating_sub(text_w) / 2);
            fb.put_str(x, top + i as u16, text, style);
        }
    }
}

fn shape_letter(kind: ShapeKind) -> &'static str {
    match kind {
        ShapeKind::I => "I",
        ShapeKind::O => "O",
        ShapeKind::T => "T",
        ShapeKind::J => "J",
        ShapeKind::L => "L",
        ShapeKind::S => "S",
        ShapeKind::Z => "Z",
    }
}

fn task_label(task: &Task) -> String {
    let what = match task.kind {
        TaskKind::RemoveColor(color) => format!("remove {} blocks", color.as_str()),
        TaskKind::ClearLines => "clear lines".to_string(),
        TaskKind::DropShape(shape) => format!("drop {} pieces", shape_letter(shape)),
        TaskKind::ReachHeight => "stack height".to_string(),
    };
    format!("{what} {}/{}", task.progress.min(task.target), task.target)
}
