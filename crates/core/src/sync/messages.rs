//! WebSocket message types shared by the room server and the client

use serde::{Deserialize, Serialize};

use crate::rules::{Color, PieceKind, Square};

/// One occupied square, as sent over the wire and stored in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PieceRecord {
    pub pos: Square,
    #[serde(rename = "type")]
    pub kind: PieceKind,
    pub color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub color: Color,
    pub source: Square,
    pub target: Square,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchStateEvent {
    pub pieces: Vec<PieceRecord>,
    pub turn: Color,
}

/// Envelope: `{"type": "...", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ChessMessage {
    State(MatchStateEvent),
    Interaction(InteractionEvent),
}

/// What a chat client sends: just the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatInput {
    pub text: String,
}

/// A chat line as relayed to everyone in the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatLine {
    pub user: String,
    pub text: String,
}

impl ChessMessage {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}
