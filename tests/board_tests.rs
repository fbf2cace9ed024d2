//! Board behavior through the public API.

use cardfall::core::Board;
use cardfall::types::{Cell, Color, ShapeKind, BOARD_HEIGHT, BOARD_WIDTH};

fn block(color: Color) -> Cell {
    Cell::Occupied {
        color,
        shape: ShapeKind::T,
        marked: false,
    }
}

fn fill_row(board: &mut Board, y: i8, color: Color) {
    for x in 0..BOARD_WIDTH as i8 {
        board.set(x, y, block(color));
    }
}

#[test]
fn full_rows_report_bottom_up() {
    let mut board = Board::new();
    fill_row(&mut board, 19, Color::Red);
    fill_row(&mut board, 15, Color::Blue);
    assert_eq!(board.full_rows().as_slice(), &[19, 15]);
}

#[test]
fn sweep_drops_partial_rows_to_the_bottom() {
    let mut board = Board::new();
    fill_row(&mut board, 19, Color::Red);
    board.set(4, 18, block(Color::Green));
    assert_eq!(board.remove_full_rows(), 1);
    assert_eq!(board.get(4, 19), Some(block(Color::Green)));
    assert!(board.get(4, 18).unwrap().is_empty());
}

#[test]
fn quadruple_sweep_empties_the_stack() {
    let mut board = Board::new();
    for y in 16..20 {
        fill_row(&mut board, y, Color::Orange);
    }
    assert_eq!(board.remove_full_rows(), 4);
    assert!(board.cells().iter().all(|c| c.is_empty()));
}

#[test]
fn explosion_clears_in_place_and_meal_shifts_down() {
    let mut board = Board::new();
    fill_row(&mut board, 19, Color::Red);
    board.set(0, 16, block(Color::Blue));

    let mut exploded = board.clone();
    assert_eq!(exploded.clear_bottom_rows(3), 10);
    // No shifting: the block above the blast zone stays put.
    assert_eq!(exploded.get(0, 16), Some(block(Color::Blue)));

    let mut eaten = board.clone();
    assert_eq!(eaten.eat_bottom_row(), 10);
    assert_eq!(eaten.get(0, 17), Some(block(Color::Blue)));
}

#[test]
fn color_tallies_survive_row_snapshots() {
    let mut board = Board::new();
    fill_row(&mut board, 19, Color::Blue);
    board.set(0, 19, block(Color::Red));
    board.set(1, 19, block(Color::Red));

    let data = vec![board.row_data(19)];
    let tally = Board::tally_colors(&data);
    assert_eq!(tally[Color::Red.index()], 2);
    assert_eq!(tally[Color::Blue.index()], 8);

    board.remove_full_rows();
    // Snapshots stay valid after the rows are gone.
    assert_eq!(Board::tally_colors(&data)[Color::Blue.index()], 8);
}

#[test]
fn max_column_height_tracks_tallest_stack() {
    let mut board = Board::new();
    assert_eq!(board.max_column_height(), 0);
    board.set(2, BOARD_HEIGHT as i8 - 1, block(Color::Red));
    board.set(7, 10, block(Color::Green));
    assert_eq!(board.max_column_height(), BOARD_HEIGHT as u32 - 10);
}
