//! Shared movement interface and the default interaction protocol

use super::board::Board;
use super::king::KING;
use super::knight::KNIGHT;
use super::pawn::PAWN;
use super::sliding::{BISHOP, QUEEN, ROOK};
use super::types::{Piece, PieceKind, Square};
use crate::error::Result;

/// Per-variant movement rules.
///
/// A variant only has to say which squares it can reach; the movable and
/// attackable subsets and the plain move/capture interaction are derived here.
pub trait Movement: Sync {
    /// Every square the piece could move to or attack, before occupancy and
    /// color filtering.
    fn interactable(&self, piece: &Piece, board: &Board) -> Vec<Square>;

    fn movable_fields(&self, piece: &Piece, board: &Board) -> Vec<Square> {
        self.interactable(piece, board)
            .into_iter()
            .filter(|&square| board.at(square).is_none())
            .collect()
    }

    fn attackable_fields(&self, piece: &Piece, board: &Board) -> Vec<Square> {
        self.interactable(piece, board)
            .into_iter()
            .filter(|&square| holds_opponent(board, piece, square))
            .collect()
    }

    /// Squares this piece would capture on if an opposing piece stood there.
    fn threatened(&self, piece: &Piece, board: &Board) -> Vec<Square> {
        self.interactable(piece, board)
    }

    fn interact(&self, piece: &Piece, board: &mut Board, target: Square) -> Result<bool> {
        move_or_capture(self, piece, board, target)
    }
}

pub(crate) fn holds_opponent(board: &Board, piece: &Piece, square: Square) -> bool {
    board
        .at(square)
        .is_some_and(|other| other.color() != piece.color())
}

/// Relocates onto a movable or attackable target and marks the piece moved.
pub(crate) fn move_or_capture<M: Movement + ?Sized>(
    movement: &M,
    piece: &Piece,
    board: &mut Board,
    target: Square,
) -> Result<bool> {
    let reachable = movement.movable_fields(piece, board).contains(&target)
        || movement.attackable_fields(piece, board).contains(&target);
    if !reachable {
        return Ok(false);
    }

    board.replace(piece.position(), target)?;
    board.mark_moved(target);
    Ok(true)
}

impl PieceKind {
    pub fn movement(self) -> &'static dyn Movement {
        match self {
            PieceKind::King => &KING,
            PieceKind::Queen => &QUEEN,
            PieceKind::Rook => &ROOK,
            PieceKind::Bishop => &BISHOP,
            PieceKind::Knight => &KNIGHT,
            PieceKind::Pawn => &PAWN,
        }
    }
}

impl Piece {
    pub fn interactable(&self, board: &Board) -> Vec<Square> {
        self.kind().movement().interactable(self, board)
    }

    pub fn movable_fields(&self, board: &Board) -> Vec<Square> {
        self.kind().movement().movable_fields(self, board)
    }

    pub fn attackable_fields(&self, board: &Board) -> Vec<Square> {
        self.kind().movement().attackable_fields(self, board)
    }

    pub fn threatened(&self, board: &Board) -> Vec<Square> {
        self.kind().movement().threatened(self, board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Color, BOARD_SIZE};

    fn snapshot(board: &Board) -> Vec<Option<Piece>> {
        (0..BOARD_SIZE)
            .map(|square| board.occupant(square).unwrap().copied())
            .collect()
    }

    #[test]
    fn test_failed_interactions_leave_board_untouched() {
        let mut board = Board::new();
        board.spawn(PieceKind::King, Color::White, 60).unwrap();
        board.spawn(PieceKind::Queen, Color::White, 59).unwrap();
        board.spawn(PieceKind::Knight, Color::Black, 1).unwrap();
        board.spawn(PieceKind::Pawn, Color::Black, 12).unwrap();
        board.spawn(PieceKind::Bishop, Color::White, 61).unwrap();

        let before = snapshot(&board);
        for source in [60, 59, 1, 12, 61] {
            for target in 0..BOARD_SIZE {
                let reachable = board.movable_fields(source).unwrap().contains(&target)
                    || board.attackable_fields(source).unwrap().contains(&target);
                if reachable {
                    continue;
                }
                let mut scratch = board.clone();
                assert!(!scratch.interact(source, target).unwrap());
                assert_eq!(snapshot(&scratch), before);
            }
        }
    }

    #[test]
    fn test_successful_move_marks_piece_moved() {
        let mut board = Board::new();
        board.spawn(PieceKind::Knight, Color::White, 57).unwrap();

        assert!(board.interact(57, 42).unwrap());

        let knight = board.occupant(42).unwrap().unwrap();
        assert!(knight.has_moved());
        assert_eq!(knight.position(), 42);
        assert!(!board.is_occupied(57).unwrap());
    }

    #[test]
    fn test_capture_drops_the_victim() {
        let mut board = Board::new();
        board.spawn(PieceKind::Bishop, Color::White, 63).unwrap();
        board.spawn(PieceKind::Pawn, Color::Black, 27).unwrap();

        assert!(board.interact(63, 27).unwrap());

        assert_eq!(board.pieces().count(), 1);
        assert_eq!(board.color_at(27).unwrap(), Color::White);
    }

    #[test]
    fn test_cannot_land_on_own_piece() {
        let mut board = Board::new();
        board.spawn(PieceKind::Queen, Color::Black, 3).unwrap();
        board.spawn(PieceKind::Pawn, Color::Black, 11).unwrap();

        assert!(!board.interact(3, 11).unwrap());
        assert!(board.interactable(3).unwrap().contains(&11));
    }
}
