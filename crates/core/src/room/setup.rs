//! Standard starting position

use crate::rules::{Color, PieceKind};
use crate::sync::PieceRecord;

const BACK_ROW: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

/// The 32 pieces of a new game. Black occupies squares 0..16, white 48..64.
pub fn standard_setup() -> Vec<PieceRecord> {
    let mut records = Vec::with_capacity(32);

    for (file, &kind) in BACK_ROW.iter().enumerate() {
        records.push(PieceRecord { pos: file, kind, color: Color::Black });
        records.push(PieceRecord { pos: 56 + file, kind, color: Color::White });
    }
    for file in 0..8 {
        records.push(PieceRecord { pos: 8 + file, kind: PieceKind::Pawn, color: Color::Black });
        records.push(PieceRecord { pos: 48 + file, kind: PieceKind::Pawn, color: Color::White });
    }

    records
}
