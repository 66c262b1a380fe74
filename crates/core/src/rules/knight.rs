//! Knight jumps

use super::board::Board;
use super::geometry::{at_bottom_border, at_left_border, at_right_border, at_top_border, file, offset};
use super::movement::Movement;
use super::types::{Piece, Square};

pub struct KnightMoves;

pub(crate) static KNIGHT: KnightMoves = KnightMoves;

impl Movement for KnightMoves {
    fn interactable(&self, piece: &Piece, _board: &Board) -> Vec<Square> {
        let square = piece.position();
        let file = file(square);
        // (guard, delta) for each of the eight jumps
        let jumps = [
            (!at_top_border(square) && file > 1, -8 - 2),
            (!at_top_border(square) && file < 6, -8 + 2),
            (square >= 16 && !at_left_border(square), -16 - 1),
            (square >= 16 && !at_right_border(square), -16 + 1),
            (square < 48 && !at_left_border(square), 16 - 1),
            (square < 48 && !at_right_border(square), 16 + 1),
            (!at_bottom_border(square) && file > 1, 8 - 2),
            (!at_bottom_border(square) && file < 6, 8 + 2),
        ];

        jumps
            .into_iter()
            .filter(|&(allowed, _)| allowed)
            .filter_map(|(_, delta)| offset(square, delta))
            .collect()
    }
}
