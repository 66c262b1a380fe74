//! Room API data types

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::room::Role;
use crate::rules::{Board, Color, RuleSet};
use crate::sync::{reconstruct, PieceRecord};

/// A room as reported by `GET /api/chess/rooms/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomInfo {
    pub id: u32,
    /// RFC 3339 timestamp.
    pub last_accessed: String,
    #[serde(default)]
    pub white_assigned: bool,
    #[serde(default)]
    pub black_assigned: bool,
    pub pieces: Vec<PieceRecord>,
    pub turn: Color,
}

impl RoomInfo {
    /// Rebuilds the room's board locally.
    pub fn to_board(&self, rules: RuleSet) -> Result<Board> {
        let mut board = Board::with_rules(rules);
        reconstruct(&mut board, &self.pieces)?;
        Ok(board)
    }

    pub fn open_colors(&self) -> Vec<Color> {
        let mut open = Vec::with_capacity(2);
        if !self.white_assigned {
            open.push(Color::White);
        }
        if !self.black_assigned {
            open.push(Color::Black);
        }
        open
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleResponse {
    pub role: Role,
}
