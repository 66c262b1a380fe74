//! Pawn advances and diagonal captures
//!
//! White moves up the board (towards index 0), black moves down. Moves and
//! captures use separate geometry, so both subsets are computed directly and
//! the interactable set is their union.

use super::board::Board;
use super::geometry::{at_bottom_border, at_left_border, at_right_border, at_top_border, in_row, offset, Direction};
use super::movement::{holds_opponent, Movement};
use super::types::{Color, Piece, Square};

pub struct PawnMoves;

pub(crate) static PAWN: PawnMoves = PawnMoves;

impl PawnMoves {
    /// Forward deltas: single step, and the double step from the start row.
    fn advances(piece: &Piece) -> Vec<isize> {
        let square = piece.position();
        let (far_row, start_row, forward) = match piece.color() {
            Color::White => (1, 7, Direction::N.delta()),
            Color::Black => (8, 2, Direction::S.delta()),
        };

        if in_row(square, far_row) {
            return Vec::new();
        }

        let mut deltas = Vec::with_capacity(2);
        if in_row(square, start_row) {
            deltas.push(2 * forward);
        }
        deltas.push(forward);
        deltas
    }

    /// Both forward diagonals, whether or not anything stands there.
    fn diagonals(piece: &Piece) -> Vec<Square> {
        let square = piece.position();
        let (at_far_row, left, right) = match piece.color() {
            Color::White => (at_top_border(square), Direction::NW, Direction::NE),
            Color::Black => (at_bottom_border(square), Direction::SW, Direction::SE),
        };

        if at_far_row {
            return Vec::new();
        }

        let mut squares = Vec::with_capacity(2);
        if !at_left_border(square) {
            squares.extend(offset(square, left.delta()));
        }
        if !at_right_border(square) {
            squares.extend(offset(square, right.delta()));
        }
        squares
    }
}

impl Movement for PawnMoves {
    fn interactable(&self, piece: &Piece, board: &Board) -> Vec<Square> {
        let mut squares = self.movable_fields(piece, board);
        squares.extend(self.attackable_fields(piece, board));
        squares
    }

    // Single and double steps are each filtered on their own, so a blocked
    // intermediate square does not hide an empty double-step target.
    fn movable_fields(&self, piece: &Piece, board: &Board) -> Vec<Square> {
        Self::advances(piece)
            .into_iter()
            .filter_map(|delta| offset(piece.position(), delta))
            .filter(|&square| board.at(square).is_none())
            .collect()
    }

    fn attackable_fields(&self, piece: &Piece, board: &Board) -> Vec<Square> {
        Self::diagonals(piece)
            .into_iter()
            .filter(|&square| holds_opponent(board, piece, square))
            .collect()
    }

    fn threatened(&self, piece: &Piece, _board: &Board) -> Vec<Square> {
        Self::diagonals(piece)
    }
}
