//! Chess Rooms Core Library
//!
//! A chess rules engine plus the collaborators that keep a board in sync with
//! a room server: wire messages, a reconnecting socket, an HTTP room client
//! and SQLite persistence.

pub mod api;
pub mod config;
pub mod error;
pub mod room;
pub mod rules;
pub mod storage;
pub mod sync;

pub use api::RoomClient;
pub use config::{ClientConfig, Settings};
pub use error::{Error, Result};
pub use room::{Role, Room};
pub use rules::{Board, Color, Piece, PieceKind, RuleSet, Square};
pub use storage::Database;
pub use sync::ChessSocket;

/// A board holding the standard starting position
pub fn starting_board(rules: RuleSet) -> Result<Board> {
    let mut board = Board::with_rules(rules);
    sync::reconstruct(&mut board, &room::standard_setup())?;
    Ok(board)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starting_board_has_every_piece() {
        let board = starting_board(RuleSet::default()).unwrap();
        assert_eq!(board.pieces().count(), 32);
        assert_eq!(board.pieces_of(Color::White).count(), 16);
        assert_eq!(board.color_at(0).unwrap(), Color::Black);
        assert_eq!(board.color_at(63).unwrap(), Color::White);
    }

    #[test]
    fn test_no_piece_can_castle_in_starting_position() {
        let mut board = starting_board(RuleSet::strict()).unwrap();
        assert!(!board.interact(60, 63).unwrap());
        assert!(!board.interact(4, 0).unwrap());
    }
}
