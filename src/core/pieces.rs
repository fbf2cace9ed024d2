//! Piece module - shape matrices and the active falling piece
//!
//! Shapes are square occupancy matrices (I is 4x4, O is 2x2, the rest
//! 3x3) rotated in place by transpose + reverse. The active piece may sit
//! partly above the visible board right after spawn (y = -1); rows above
//! the board never collide.

use crate::core::Board;
use crate::types::{Color, ShapeKind, BOARD_WIDTH};

/// Square occupancy matrix for one shape orientation.
pub type ShapeMatrix = Vec<Vec<bool>>;

/// Build the spawn-orientation matrix for a shape.
pub fn shape_matrix(kind: ShapeKind) -> ShapeMatrix {
    let rows: &[&[u8]] = match kind {
        ShapeKind::I => &[
            &[0, 0, 0, 0],
            &[1, 1, 1, 1],
            &[0, 0, 0, 0],
            &[0, 0, 0, 0],
        ],
        ShapeKind::O => &[&[1, 1], &[1, 1]],
        ShapeKind::T => &[&[0, 1, 0], &[1, 1, 1], &[0, 0, 0]],
        ShapeKind::J => &[&[1, 0, 0], &[1, 1, 1], &[0, 0, 0]],
        ShapeKind::L => &[&[0, 0, 1], &[1, 1, 1], &[0, 0, 0]],
        ShapeKind::S => &[&[0, 1, 1], &[1, 1, 0], &[0, 0, 0]],
        ShapeKind::Z => &[&[1, 1, 0], &[0, 1, 1], &[0, 0, 0]],
    };
    rows.iter()
        .map(|row| row.iter().map(|&v| v != 0).collect())
        .collect()
}

/// Rotation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spin {
    Cw,
    Ccw,
}

/// Rotate a square matrix in place: transpose, then reverse each row
/// (clockwise) or reverse the row order (counter-clockwise).
pub fn rotate_matrix(matrix: &mut ShapeMatrix, dir: Spin) {
    let n = matrix.len();
    for y in 0..n {
        for x in 0..y {
            let tmp = matrix[y][x];
            matrix[y][x] = matrix[x][y];
            matrix[x][y] = tmp;
        }
    }
    match dir {
        Spin::Cw => {
            for row in matrix.iter_mut() {
                row.reverse();
            }
        }
        Spin::Ccw => matrix.reverse(),
    }
}

/// The active falling piece, replaced wholesale on each landing.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivePiece {
    pub matrix: ShapeMatrix,
    pub x: i8,
    pub y: i8,
    pub color: Color,
    pub shape: ShapeKind,
}

impl ActivePiece {
    /// Spawn a piece horizontally centered, one row above the board.
    pub fn spawn(shape: ShapeKind, color: Color) -> Self {
        let matrix = shape_matrix(shape);
        let x = (BOARD_WIDTH as i8 - matrix[0].len() as i8) / 2;
        Self {
            matrix,
            x,
            y: -1,
            color,
            shape,
        }
    }

    pub fn width(&self) -> usize {
        self.matrix.first().map_or(0, |row| row.len())
    }

    /// Absolute board coordinates of every occupied cell.
    pub fn cells(&self) -> impl Iterator<Item = (i8, i8)> + '_ {
        self.matrix.iter().enumerate().flat_map(move |(my, row)| {
            row.iter().enumerate().filter_map(move |(mx, &occ)| {
                occ.then_some((self.x + mx as i8, self.y + my as i8))
            })
        })
    }

    /// True if any occupied cell is outside the side/bottom bounds or
    /// overlaps an occupied board cell. Cells above the board are ignored.
    pub fn collides(&self, board: &Board) -> bool {
        self.cells().any(|(x, y)| {
            if y < 0 {
                return false;
            }
            !board.in_bounds(x, y) || board.is_occupied(x, y)
        })
    }

    /// Rotate with wall-kick correction: after the turn, try horizontal
    /// offsets 1, -2, 3, -4, ... up to the matrix width; if none fits,
    /// revert both rotation and position.
    pub fn rotate_with_kicks(&mut self, dir: Spin, board: &Board) -> bool {
        let saved_x = self.x;
        rotate_matrix(&mut self.matrix, dir);
        let mut offset: i8 = 1;
        while self.collides(board) {
            self.x += offset;
            offset = -(offset + if offset > 0 { 1 } else { -1 });
            if offset as i32 > self.width() as i32 {
                let undo = match dir {
                    Spin::Cw => Spin::Ccw,
                    Spin::Ccw => Spin::Cw,
                };
                rotate_matrix(&mut self.matrix, undo);
                self.x = saved_x;
                return false;
            }
        }
        true
    }
}
