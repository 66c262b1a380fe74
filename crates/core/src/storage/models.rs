//! Database models

use serde::{Deserialize, Serialize};

/// A row of the `rooms` table. Pieces live in their own table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRoom {
    pub id: u32,
    pub last_accessed: u64,
    pub white: Option<String>,
    pub black: Option<String>,
    pub turn: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPiece {
    pub room_id: u32,
    pub pos: u32,
    pub piece_type: String,
    pub color: String,
}

/// A chat participant, named once per room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredUser {
    pub room_id: u32,
    pub session_key: String,
    pub name: String,
}
