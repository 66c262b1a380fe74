//! King steps, castling and the check query

use super::board::Board;
use super::geometry::{row, step, Direction};
use super::movement::{move_or_capture, Movement};
use super::types::{CheckScan, Color, Piece, PieceKind, Square};
use crate::error::Result;

pub struct KingMoves;

pub(crate) static KING: KingMoves = KingMoves;

impl Movement for KingMoves {
    fn interactable(&self, piece: &Piece, _board: &Board) -> Vec<Square> {
        Direction::ALL
            .iter()
            .filter_map(|&direction| step(piece.position(), direction))
            .collect()
    }

    fn interact(&self, piece: &Piece, board: &mut Board, target: Square) -> Result<bool> {
        if move_or_capture(self, piece, board, target)? {
            return Ok(true);
        }
        castle(piece, board, target)
    }
}

/// True when some piece of the other color covers `square`.
///
/// Which squares count as covered depends on the board's [`CheckScan`].
pub fn is_in_check(board: &Board, color: Color, square: Square) -> bool {
    let scan = board.rules().check_scan;
    board.pieces_of(color.opponent()).any(|enemy| {
        let covered = match scan {
            CheckScan::Attackable => enemy.attackable_fields(board),
            CheckScan::Threatened => enemy.threatened(board),
        };
        covered.contains(&square)
    })
}

/// Castles `king` with the rook standing on `rook_square`.
///
/// The king ends two squares towards the rook and the rook lands on the
/// square the king passed over. Any failed precondition leaves the board as
/// it was.
fn castle(king: &Piece, board: &mut Board, rook_square: Square) -> Result<bool> {
    if king.has_moved() {
        return Ok(false);
    }

    let Some(rook) = board.occupant(rook_square)?.copied() else {
        return Ok(false);
    };
    if rook.kind() != PieceKind::Rook || rook.has_moved() || rook.color() != king.color() {
        return Ok(false);
    }

    let from = king.position();
    // the rook must share the king's row and leave room for both pieces
    if row(from) != row(rook_square) || from.abs_diff(rook_square) < 3 {
        return Ok(false);
    }

    let towards_rook = |square: Square| {
        if rook_square > from {
            square + 1
        } else {
            square - 1
        }
    };

    let mut between = towards_rook(from);
    while between != rook_square {
        if board.at(between).is_some() {
            return Ok(false);
        }
        between = towards_rook(between);
    }

    let passed = towards_rook(from);
    let destination = towards_rook(passed);

    if is_in_check(board, king.color(), from) || is_in_check(board, king.color(), destination) {
        tracing::debug!(from, rook_square, "castling refused: king in check");
        return Ok(false);
    }

    if board.rules().castling_transit_check && is_in_check(board, king.color(), passed) {
        tracing::debug!(from, passed, "castling refused: transit square attacked");
        return Ok(false);
    }

    board.replace(from, destination)?;
    board.replace(rook_square, passed)?;
    if board.rules().castling_marks_moved {
        board.mark_moved(destination);
        board.mark_moved(passed);
    }
    Ok(true)
}
