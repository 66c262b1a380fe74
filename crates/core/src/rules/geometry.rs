//! Border predicates and compass steps on the linear board encoding
//!
//! Rows are numbered 1..=8 from the top (index 0..8 is row 1). A step must be
//! guarded by the relevant border predicate before its delta is applied,
//! otherwise a move off the left or right edge wraps onto the neighbouring row.

use super::types::Square;

pub const BOARD_SIZE: usize = 64;
pub const ROW_LEN: usize = 8;

pub fn row(square: Square) -> usize {
    square / ROW_LEN + 1
}

pub fn file(square: Square) -> usize {
    square % ROW_LEN
}

pub fn in_row(square: Square, row: usize) -> bool {
    square >= (row - 1) * ROW_LEN && square < row * ROW_LEN
}

pub fn at_left_border(square: Square) -> bool {
    file(square) == 0
}

pub fn at_right_border(square: Square) -> bool {
    file(square) == ROW_LEN - 1
}

pub fn at_top_border(square: Square) -> bool {
    in_row(square, 1)
}

pub fn at_bottom_border(square: Square) -> bool {
    in_row(square, 8)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    N,
    S,
    E,
    W,
    NW,
    NE,
    SW,
    SE,
}

impl Direction {
    pub const ORTHOGONAL: [Direction; 4] = [Direction::S, Direction::N, Direction::W, Direction::E];
    pub const DIAGONAL: [Direction; 4] = [Direction::NW, Direction::NE, Direction::SW, Direction::SE];
    pub const ALL: [Direction; 8] = [
        Direction::NW,
        Direction::NE,
        Direction::SW,
        Direction::SE,
        Direction::S,
        Direction::N,
        Direction::W,
        Direction::E,
    ];

    pub fn delta(self) -> isize {
        match self {
            Direction::N => -8,
            Direction::S => 8,
            Direction::E => 1,
            Direction::W => -1,
            Direction::NW => -9,
            Direction::NE => -7,
            Direction::SW => 7,
            Direction::SE => 9,
        }
    }

    /// True when a piece on `square` cannot take one step this way.
    pub fn blocked_at(self, square: Square) -> bool {
        match self {
            Direction::N => at_top_border(square),
            Direction::S => at_bottom_border(square),
            Direction::E => at_right_border(square),
            Direction::W => at_left_border(square),
            Direction::NW => at_top_border(square) || at_left_border(square),
            Direction::NE => at_top_border(square) || at_right_border(square),
            Direction::SW => at_bottom_border(square) || at_left_border(square),
            Direction::SE => at_bottom_border(square) || at_right_border(square),
        }
    }
}

/// One guarded step, or `None` if it would leave the board.
pub fn step(square: Square, direction: Direction) -> Option<Square> {
    if direction.blocked_at(square) {
        return None;
    }
    offset(square, direction.delta())
}

/// Applies a raw delta without any border reasoning. Callers guard first.
pub(crate) fn offset(square: Square, delta: isize) -> Option<Square> {
    square
        .checked_add_signed(delta)
        .filter(|&target| target < BOARD_SIZE)
}
