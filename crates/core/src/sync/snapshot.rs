//! Full-state reconstruction, serialization and single-move application

use crate::error::Result;
use crate::rules::{Board, Square};

use super::messages::PieceRecord;

/// Clears `board` and spawns every record onto it.
///
/// On error the board holds the records spawned so far.
pub fn reconstruct(board: &mut Board, records: &[PieceRecord]) -> Result<()> {
    board.clear();
    for record in records {
        board.spawn(record.kind, record.color, record.pos)?;
    }
    Ok(())
}

/// Current occupancy as records, in square order.
pub fn serialize(board: &Board) -> Vec<PieceRecord> {
    board
        .pieces()
        .map(|piece| PieceRecord {
            pos: piece.position(),
            kind: piece.kind(),
            color: piece.color(),
        })
        .collect()
}

/// Applies one remote move. `Ok(false)` means it was illegal here.
pub fn apply_move(board: &mut Board, source: Square, target: Square) -> Result<bool> {
    let applied = board.interact(source, target)?;
    if !applied {
        tracing::debug!(source, target, "rejected move");
    }
    Ok(applied)
}
