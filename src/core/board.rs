//! Board module - manages the game grid
//!
//! The board is a 10x20 grid stored as a flat array for cache locality.
//! Coordinates: (x, y) with x 0..9 left to right, y 0..19 top to bottom.
//! Besides the regular full-row sweep the board supports three special
//! removals: emptying the bottom three rows in place (star explosion),
//! eating the bottom row with a shift-down (companion pet), and clearing
//! marked cells in a 3x3 neighborhood (sniper shot).

use arrayvec::ArrayVec;

use crate::types::{Cell, BOARD_HEIGHT, BOARD_WIDTH};

/// Total number of cells on the board
const BOARD_SIZE: usize = (BOARD_WIDTH as usize) * (BOARD_HEIGHT as usize);

/// Snapshot of one row, captured before a sweep removes it.
pub type RowData = [Cell; BOARD_WIDTH as usize];

/// The game board - 10 columns x 20 rows using flat array storage
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    /// Flat array of cells, row-major order (y * WIDTH + x)
    cells: [Cell; BOARD_SIZE],
}

impl Board {
    pub fn new() -> Self {
        Self {
            cells: [Cell::Empty; BOARD_SIZE],
        }
    }

    #[inline(always)]
    fn index(x: i8, y: i8) -> Option<usize> {
        if x < 0 || x >= BOARD_WIDTH as i8 || y < 0 || y >= BOARD_HEIGHT as i8 {
            return None;
        }
        Some((y as usize) * (BOARD_WIDTH as usize) + (x as usize))
    }

    pub fn in_bounds(&self, x: i8, y: i8) -> bool {
        Self::index(x, y).is_some()
    }

    /// Get cell at position (x, y). Returns None if out of bounds.
    pub fn get(&self, x: i8, y: i8) -> Option<Cell> {
        Self::index(x, y).map(|idx| self.cells[idx])
    }

    /// Set cell at position (x, y). Returns false if out of bounds.
    pub fn set(&mut self, x: i8, y: i8, cell: Cell) -> bool {
        match Self::index(x, y) {
            Some(idx) => {
                self.cells[idx] = cell;
                true
            }
            None => false,
        }
    }

    pub fn is_occupied(&self, x: i8, y: i8) -> bool {
        matches!(self.get(x, y), Some(cell) if !cell.is_empty())
    }

    /// Check if a row is completely filled
    pub fn is_row_full(&self, y: usize) -> bool {
        if y >= BOARD_HEIGHT as usize {
            return false;
        }
        let start = y * BOARD_WIDTH as usize;
        let end = start + BOARD_WIDTH as usize;
        self.cells[start..end].iter().all(|cell| !cell.is_empty())
    }

    /// Collect full rows bottom-up without mutating (sweep is two-phase:
    /// detection happens immediately, removal after the effect window).
    pub fn full_rows(&self) -> ArrayVec<usize, 4> {
        let mut rows = ArrayVec::new();
        for y in (0..BOARD_HEIGHT as usize).rev() {
            if self.is_row_full(y) && rows.try_push(y).is_err() {
                break;
            }
        }
        rows
    }

    /// Copy out one row (for tallying colors/marks before removal).
    pub fn row_data(&self, y: usize) -> RowData {
        let mut out = [Cell::Empty; BOARD_WIDTH as usize];
        let start = y * BOARD_WIDTH as usize;
        out.copy_from_slice(&self.cells[start..start + BOARD_WIDTH as usize]);
        out
    }

    /// Remove all full rows with a two-pointer compaction, prepending
    /// empty rows at the top and preserving the order of the remainder.
    /// Returns the number of rows removed.
    pub fn remove_full_rows(&mut self) -> usize {
        let width = BOARD_WIDTH as usize;
        let mut removed = 0;
        let mut write_y = BOARD_HEIGHT as usize;

        for read_y in (0..BOARD_HEIGHT as usize).rev() {
            if self.is_row_full(read_y) {
                removed += 1;
            } else {
                write_y -= 1;
                if write_y != read_y {
                    let src = read_y * width;
                    let dst = write_y * width;
                    self.cells.copy_within(src..src + width, dst);
                }
            }
        }

        for cell in &mut self.cells[..write_y * width] {
            *cell = Cell::Empty;
        }
        removed
    }

    /// Empty the bottom `n` rows in place (no shifting). Returns the
    /// number of blocks removed.
    pub fn clear_bottom_rows(&mut self, n: usize) -> u32 {
        let mut removed = 0;
        for r in 0..n.min(BOARD_HEIGHT as usize) {
            let y = BOARD_HEIGHT as usize - 1 - r;
            let start = y * BOARD_WIDTH as usize;
            for cell in &mut self.cells[start..start + BOARD_WIDTH as usize] {
                if !cell.is_empty() {
                    removed += 1;
                }
                *cell = Cell::Empty;
            }
        }
        removed
    }

    /// Remove the bottom row entirely and shift everything above down,
    /// like a line clear. Returns the number of blocks removed.
    pub fn eat_bottom_row(&mut self) -> u32 {
        let width = BOARD_WIDTH as usize;
        let bottom = (BOARD_HEIGHT as usize - 1) * width;
        let removed = self.cells[bottom..bottom + width]
            .iter()
            .filter(|c| !c.is_empty())
            .count() as u32;

        self.cells.copy_within(0..bottom, width);
        for cell in &mut self.cells[..width] {
            *cell = Cell::Empty;
        }
        removed
    }

    /// Clear marked cells in the 3x3 neighborhood of (cx, cy). Returns
    /// the number of marked cells removed.
    pub fn clear_marked_around(&mut self, cx: i8, cy: i8) -> u32 {
        let mut removed = 0;
        for dy in -1..=1 {
            for dx in -1..=1 {
                let (x, y) = (cx + dx, cy + dy);
                if let Some(cell) = self.get(x, y) {
                    if cell.is_marked() {
                        removed += 1;
                        self.set(x, y, Cell::Empty);
                    }
                }
            }
        }
        removed
    }

    /// Height of the tallest column (for reach-height tasks).
    pub fn max_column_height(&self) -> u32 {
        let mut max_h = 0;
        for x in 0..BOARD_WIDTH as i8 {
            for y in 0..BOARD_HEIGHT as i8 {
                if self.is_occupied(x, y) {
                    max_h = max_h.max(BOARD_HEIGHT as u32 - y as u32);
                    break;
                }
            }
        }
        max_h
    }

    /// Per-color tally of the occupied cells in a set of row snapshots.
    pub fn tally_colors(rows: &[RowData]) -> [u32; 4] {
        let mut counts = [0u32; 4];
        for row in rows {
            for cell in row {
                if let Some(color) = cell.color() {
                    counts[color.index()] += 1;
                }
            }
        }
        counts
    }

    /// Count marked cells in a set of row snapshots.
    pub fn tally_marked(rows: &[RowData]) -> u32 {
        rows.iter()
            .flat_map(|row| row.iter())
            .filter(|c| c.is_marked())
            .count() as u32
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Clear the entire board
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            *cell = Cell::Empty;
        }
    }

    #[cfg(test)]
    pub fn occupy_for_test(&mut self, x: i8, y: i8) {
        use crate::types::{Color, ShapeKind};
        self.set(
            x,
            y,
            Cell::Occupied {
                color: Color::Red,
                shape: ShapeKind::I,
                marked: false,
            },
        );
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
