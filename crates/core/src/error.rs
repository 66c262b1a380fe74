//! Error types for chess-rooms-core

use thiserror::Error;

use crate::rules::Color;

#[derive(Error, Debug)]
pub enum Error {
    #[error("square {0} is outside the board")]
    SquareOutOfRange(usize),

    #[error("square {0} is empty")]
    EmptySquare(usize),

    #[error("square {0} is already occupied")]
    SquareOccupied(usize),

    #[error("invalid piece type: {0}")]
    UnknownPieceType(String),

    #[error("invalid piece color: {0}")]
    UnknownColor(String),

    #[error("{0} has already been claimed")]
    SeatTaken(Color),

    #[error("this player has already claimed a color")]
    AlreadySeated,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Room API error: {0}")]
    Api(String),

    #[error("WebSocket error: {0}")]
    Socket(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Faults point at caller or data misuse, as opposed to transport or
    /// storage trouble.
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            Error::SquareOutOfRange(_)
                | Error::EmptySquare(_)
                | Error::SquareOccupied(_)
                | Error::UnknownPieceType(_)
                | Error::UnknownColor(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
