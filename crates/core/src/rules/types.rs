//! Piece, color and rule-set types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Linear board index. 0 is the top-left corner (a8), 63 the bottom-right (h1).
pub type Square = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn as_str(&self) -> &'static str {
        match self {
            Color::White => "W",
            Color::Black => "B",
        }
    }

    pub fn opponent(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "W" => Ok(Color::White),
            "B" => Ok(Color::Black),
            other => Err(Error::UnknownColor(other.to_string())),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for &'static str {
    fn from(color: Color) -> Self {
        color.as_str()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => f.write_str("white"),
            Color::Black => f.write_str("black"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum PieceKind {
    King,
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
}

impl PieceKind {
    pub const ALL: [PieceKind; 6] = [
        PieceKind::King,
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
        PieceKind::Pawn,
    ];

    /// Two-letter code used on the wire and in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            PieceKind::King => "KI",
            PieceKind::Queen => "QU",
            PieceKind::Rook => "RO",
            PieceKind::Bishop => "BI",
            PieceKind::Knight => "KN",
            PieceKind::Pawn => "PA",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PieceKind::King => "King",
            PieceKind::Queen => "Queen",
            PieceKind::Rook => "Rook",
            PieceKind::Bishop => "Bishop",
            PieceKind::Knight => "Knight",
            PieceKind::Pawn => "Pawn",
        }
    }
}

impl FromStr for PieceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PieceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::UnknownPieceType(s.to_string()))
    }
}

impl TryFrom<String> for PieceKind {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PieceKind> for &'static str {
    fn from(kind: PieceKind) -> Self {
        kind.as_str()
    }
}

/// A piece as stored on a [`Board`](super::Board).
///
/// Copies handed out by the board are snapshots; once the board mutates they
/// may no longer match what is stored there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    kind: PieceKind,
    color: Color,
    pub(crate) position: Square,
    pub(crate) has_moved: bool,
}

impl Piece {
    pub fn new(kind: PieceKind, color: Color, position: Square) -> Self {
        Self {
            kind,
            color,
            position,
            has_moved: false,
        }
    }

    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn position(&self) -> Square {
        self.position
    }

    pub fn has_moved(&self) -> bool {
        self.has_moved
    }
}

/// How a rook's own interaction behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RookInteract {
    /// Only moves into empty squares, relocating with a swap. Never captures.
    #[default]
    SwapOnly,
    /// Uses the shared interaction, so it can capture like every other piece.
    Capture,
}

/// Which squares of an opposing piece count when asking whether a square is
/// in check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckScan {
    /// Only `attackable_fields`, so an empty square is never in check.
    #[default]
    Attackable,
    /// Every square the piece threatens, empty or not.
    Threatened,
}

/// Behaviour switches for the ambiguous parts of the rules.
///
/// `RuleSet::default()` keeps the long-standing room behaviour;
/// `RuleSet::strict()` turns every correction on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RuleSet {
    pub rook_interact: RookInteract,
    /// Reject castling when a square the king passes over is in check.
    pub castling_transit_check: bool,
    /// Mark king and rook as moved after castling, so neither can castle again.
    pub castling_marks_moved: bool,
    pub check_scan: CheckScan,
}

impl RuleSet {
    pub fn strict() -> Self {
        Self {
            rook_interact: RookInteract::Capture,
            castling_transit_check: true,
            castling_marks_moved: true,
            check_scan: CheckScan::Threatened,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_roundtrip_through_serde() {
        let json = serde_json::to_string(&(PieceKind::Knight, Color::Black)).unwrap();
        assert_eq!(json, r#"["KN","B"]"#);

        let (kind, color): (PieceKind, Color) = serde_json::from_str(&json).unwrap();
        assert_eq!(kind, PieceKind::Knight);
        assert_eq!(color, Color::Black);
    }

    #[test]
    fn test_unknown_piece_type_is_reported() {
        let err = "XX".parse::<PieceKind>().unwrap_err();
        assert!(matches!(err, Error::UnknownPieceType(ref code) if code == "XX"));
        assert!(err.is_fault());

        assert!(serde_json::from_str::<PieceKind>(r#""ZZ""#).is_err());
    }

    #[test]
    fn test_unknown_color_is_reported() {
        assert!(matches!("G".parse::<Color>(), Err(Error::UnknownColor(_))));
    }

    #[test]
    fn test_default_rules_are_faithful() {
        let rules = RuleSet::default();
        assert_eq!(rules.rook_interact, RookInteract::SwapOnly);
        assert!(!rules.castling_transit_check);
        assert_eq!(rules.check_scan, CheckScan::Attackable);
    }
}
