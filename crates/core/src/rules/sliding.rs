//! Ray-casting for bishops, rooks and queens

use super::board::Board;
use super::geometry::{step, Direction};
use super::movement::{move_or_capture, Movement};
use super::types::{Piece, RookInteract, Square};
use crate::error::Result;

/// A piece that slides along a fixed set of rays.
pub struct Slider {
    directions: &'static [Direction],
}

pub(crate) static BISHOP: Slider = Slider {
    directions: &Direction::DIAGONAL,
};

pub(crate) static QUEEN: Slider = Slider {
    directions: &Direction::ALL,
};

pub(crate) static ROOK: RookMoves = RookMoves;

/// Walks from `from` towards `direction` and stops after the first occupied
/// square, which is included.
pub fn ray(board: &Board, from: Square, direction: Direction) -> Vec<Square> {
    let mut squares = Vec::new();
    let mut current = from;

    while let Some(next) = step(current, direction) {
        squares.push(next);
        if board.at(next).is_some() {
            break;
        }
        current = next;
    }

    squares
}

impl Slider {
    fn rays(&self, board: &Board, from: Square) -> Vec<Square> {
        self.directions
            .iter()
            .flat_map(|&direction| ray(board, from, direction))
            .collect()
    }
}

impl Movement for Slider {
    fn interactable(&self, piece: &Piece, board: &Board) -> Vec<Square> {
        self.rays(board, piece.position())
    }
}

pub struct RookMoves;

impl Movement for RookMoves {
    fn interactable(&self, piece: &Piece, board: &Board) -> Vec<Square> {
        Direction::ORTHOGONAL
            .iter()
            .flat_map(|&direction| ray(board, piece.position(), direction))
            .collect()
    }

    fn interact(&self, piece: &Piece, board: &mut Board, target: Square) -> Result<bool> {
        match board.rules().rook_interact {
            RookInteract::Capture => move_or_capture(self, piece, board, target),
            RookInteract::SwapOnly => {
                if !self.movable_fields(piece, board).contains(&target) {
                    return Ok(false);
                }
                board.swap(piece.position(), target)?;
                board.mark_moved(target);
                Ok(true)
            }
        }
    }
}
