//! Square names, FEN placement and a plain-text board diagram
//!
//! Index 0 is a8 and index 63 is h1, so conversion to shakmaty's a1-based
//! numbering mirrors the rows.

use shakmaty::Role;

use super::board::Board;
use super::geometry::{file, row, BOARD_SIZE, ROW_LEN};
use super::types::{Color, Piece, PieceKind, Square};

pub fn to_shakmaty(square: Square) -> shakmaty::Square {
    let mirrored = (ROW_LEN - row(square)) * ROW_LEN + file(square);
    shakmaty::Square::new(mirrored as u32)
}

pub fn from_shakmaty(square: shakmaty::Square) -> Square {
    let index = square as usize;
    (ROW_LEN - 1 - index / ROW_LEN) * ROW_LEN + index % ROW_LEN
}

/// Algebraic name, e.g. `"e2"` for square 52.
pub fn square_name(square: Square) -> String {
    to_shakmaty(square).to_string()
}

fn role(kind: PieceKind) -> Role {
    match kind {
        PieceKind::King => Role::King,
        PieceKind::Queen => Role::Queen,
        PieceKind::Rook => Role::Rook,
        PieceKind::Bishop => Role::Bishop,
        PieceKind::Knight => Role::Knight,
        PieceKind::Pawn => Role::Pawn,
    }
}

fn to_shakmaty_piece(piece: &Piece) -> shakmaty::Piece {
    let color = match piece.color() {
        Color::White => shakmaty::Color::White,
        Color::Black => shakmaty::Color::Black,
    };
    shakmaty::Piece {
        color,
        role: role(piece.kind()),
    }
}

pub fn to_shakmaty_board(board: &Board) -> shakmaty::Board {
    let mut converted = shakmaty::Board::empty();
    for piece in board.pieces() {
        converted.set_piece_at(to_shakmaty(piece.position()), to_shakmaty_piece(piece));
    }
    converted
}

/// Piece placement field of a FEN string.
pub fn board_fen(board: &Board) -> String {
    to_shakmaty_board(board).board_fen().to_string()
}

/// Eight lines of `KQRBNP` (white) / `kqrbnp` (black) with `.` for empty
/// squares, top row first, followed by file letters.
pub fn render(board: &Board) -> String {
    let mut out = String::with_capacity(BOARD_SIZE * 2 + 32);
    for square in 0..BOARD_SIZE {
        if file(square) == 0 {
            out.push_str(&format!("{} ", ROW_LEN + 1 - row(square)));
        }
        let symbol = board
            .at(square)
            .map(|piece| to_shakmaty_piece(piece).char())
            .unwrap_or('.');
        out.push(symbol);
        out.push(if file(square) == ROW_LEN - 1 { '\n' } else { ' ' });
    }
    out.push_str("  a b c d e f g h\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_names() {
        assert_eq!(square_name(0), "a8");
        assert_eq!(square_name(7), "h8");
        assert_eq!(square_name(52), "e2");
        assert_eq!(square_name(63), "h1");
    }

    #[test]
    fn test_shakmaty_conversion_roundtrip() {
        for square in 0..BOARD_SIZE {
            assert_eq!(from_shakmaty(to_shakmaty(square)), square);
        }
        assert_eq!(to_shakmaty(60), shakmaty::Square::E1);
    }

    #[test]
    fn test_board_fen() {
        let mut board = Board::new();
        board.spawn(PieceKind::King, Color::Black, 4).unwrap();
        board.spawn(PieceKind::King, Color::White, 60).unwrap();
        board.spawn(PieceKind::Pawn, Color::White, 52).unwrap();

        assert_eq!(board_fen(&board), "4k3/8/8/8/8/8/4P3/4K3");
    }

    #[test]
    fn test_render() {
        let mut board = Board::new();
        board.spawn(PieceKind::Rook, Color::Black, 0).unwrap();
        board.spawn(PieceKind::Queen, Color::White, 63).unwrap();

        let text = render(&board);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "8 r . . . . . . .");
        assert_eq!(lines[7], "1 . . . . . . . Q");
        assert_eq!(lines[8], "  a b c d e f g h");
    }
}
