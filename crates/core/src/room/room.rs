//! A match room: board, seats and turn order

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use super::setup::standard_setup;
use crate::error::{Error, Result};
use crate::rules::{Board, Color, RuleSet, Square};
use crate::sync::{reconstruct, serialize, InteractionEvent, MatchStateEvent, PieceRecord};

/// What a session is allowed to do in a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Role {
    White,
    Black,
    Observer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::White => "W",
            Role::Black => "B",
            Role::Observer => "O",
        }
    }

    pub fn color(&self) -> Option<Color> {
        match self {
            Role::White => Some(Color::White),
            Role::Black => Some(Color::Black),
            Role::Observer => None,
        }
    }
}

impl From<Color> for Role {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Role::White,
            Color::Black => Role::Black,
        }
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "O" => Ok(Role::Observer),
            other => other.parse::<Color>().map(Role::from),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = Error;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Role> for &'static str {
    fn from(role: Role) -> Self {
        role.as_str()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.color() {
            Some(color) => fmt::Display::fmt(&color, f),
            None => f.write_str("observer"),
        }
    }
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

#[derive(Debug, Clone)]
pub struct Room {
    id: u32,
    board: Board,
    turn: Color,
    white: Option<String>,
    black: Option<String>,
    last_accessed: u64,
}

impl Room {
    /// A fresh room with the standard setup and white to move.
    pub fn new(id: u32, rules: RuleSet) -> Result<Self> {
        Self::from_parts(id, rules, &standard_setup(), Color::White, None, None, unix_now())
    }

    pub fn from_parts(
        id: u32,
        rules: RuleSet,
        pieces: &[PieceRecord],
        turn: Color,
        white: Option<String>,
        black: Option<String>,
        last_accessed: u64,
    ) -> Result<Self> {
        let mut board = Board::with_rules(rules);
        reconstruct(&mut board, pieces)?;
        Ok(Self {
            id,
            board,
            turn,
            white,
            black,
            last_accessed,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn white(&self) -> Option<&str> {
        self.white.as_deref()
    }

    pub fn black(&self) -> Option<&str> {
        self.black.as_deref()
    }

    pub fn last_accessed(&self) -> u64 {
        self.last_accessed
    }

    pub fn touch(&mut self) {
        self.last_accessed = unix_now();
    }

    pub fn pieces(&self) -> Vec<PieceRecord> {
        serialize(&self.board)
    }

    pub fn state(&self) -> MatchStateEvent {
        MatchStateEvent {
            pieces: self.pieces(),
            turn: self.turn,
        }
    }

    pub fn role_of(&self, session: &str) -> Role {
        if self.white.as_deref() == Some(session) {
            Role::White
        } else if self.black.as_deref() == Some(session) {
            Role::Black
        } else {
            Role::Observer
        }
    }

    /// Seats `session` as `color`.
    pub fn claim(&mut self, session: &str, color: Color) -> Result<()> {
        if self.role_of(session) != Role::Observer {
            return Err(Error::AlreadySeated);
        }

        let seat = match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        };
        if seat.is_some() {
            return Err(Error::SeatTaken(color));
        }

        *seat = Some(session.to_string());
        tracing::info!(room = self.id, %color, "seat claimed");
        Ok(())
    }

    /// Plays `source -> target` for `session`.
    ///
    /// Returns the event to broadcast, or `None` when the session may not move
    /// that piece now or the move is illegal. The turn passes only on success.
    pub fn apply_interaction(
        &mut self,
        session: &str,
        source: Square,
        target: Square,
    ) -> Result<Option<InteractionEvent>> {
        let Some(color) = self.role_of(session).color() else {
            return Ok(None);
        };
        if color != self.turn {
            return Ok(None);
        }
        match self.board.occupant(source)? {
            Some(piece) if piece.color() == color => {}
            _ => return Ok(None),
        }

        if !self.board.interact(source, target)? {
            return Ok(None);
        }

        self.turn = self.turn.opponent();
        Ok(Some(InteractionEvent {
            color,
            source,
            target,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::PieceKind;

    fn seated_room() -> Room {
        let mut room = Room::new(7, RuleSet::default()).unwrap();
        room.claim("alice", Color::White).unwrap();
        room.claim("bob", Color::Black).unwrap();
        room
    }

    #[test]
    fn test_role_codes() {
        assert_eq!(serde_json::to_string(&Role::Observer).unwrap(), r#""O""#);
        assert_eq!(serde_json::from_str::<Role>(r#""B""#).unwrap(), Role::Black);
        assert!(serde_json::from_str::<Role>(r#""X""#).is_err());
    }

    #[test]
    fn test_new_room_starts_with_white() {
        let room = Room::new(1, RuleSet::default()).unwrap();
        assert_eq!(room.turn(), Color::White);
        assert_eq!(room.pieces().len(), 32);
        assert_eq!(room.role_of("anyone"), Role::Observer);
    }

    #[test]
    fn test_claiming_seats() {
        let mut room = Room::new(1, RuleSet::default()).unwrap();
        room.claim("alice", Color::White).unwrap();

        assert_eq!(room.role_of("alice"), Role::White);
        assert!(matches!(room.claim("alice", Color::Black), Err(Error::AlreadySeated)));
        assert!(matches!(
            room.claim("bob", Color::White),
            Err(Error::SeatTaken(Color::White))
        ));

        room.claim("bob", Color::Black).unwrap();
        assert_eq!(room.role_of("bob"), Role::Black);
        assert_eq!(room.white(), Some("alice"));
        assert_eq!(room.black(), Some("bob"));
    }

    #[test]
    fn test_turns_alternate_on_success() {
        let mut room = seated_room();

        let event = room.apply_interaction("alice", 52, 36).unwrap().unwrap();
        assert_eq!(event.color, Color::White);
        assert_eq!(room.turn(), Color::Black);

        assert!(room.apply_interaction("alice", 51, 43).unwrap().is_none());
        assert!(room.apply_interaction("bob", 12, 28).unwrap().is_some());
        assert_eq!(room.turn(), Color::White);
    }

    #[test]
    fn test_cannot_move_opponent_pieces_or_observe_moves() {
        let mut room = seated_room();

        assert!(room.apply_interaction("alice", 12, 28).unwrap().is_none());
        assert!(room.apply_interaction("mallory", 52, 36).unwrap().is_none());
        assert!(room.apply_interaction("alice", 30, 22).unwrap().is_none());
        assert_eq!(room.turn(), Color::White);
    }

    #[test]
    fn test_illegal_move_keeps_turn() {
        let mut room = seated_room();
        let before = room.pieces();

        assert!(room.apply_interaction("alice", 60, 52).unwrap().is_none());
        assert_eq!(room.turn(), Color::White);
        assert_eq!(room.pieces(), before);
    }

    #[test]
    fn test_out_of_range_source_is_a_fault() {
        let mut room = seated_room();
        assert!(matches!(
            room.apply_interaction("alice", 99, 0),
            Err(Error::SquareOutOfRange(99))
        ));
    }

    #[test]
    fn test_state_reflects_board() {
        let mut room = seated_room();
        room.apply_interaction("alice", 62, 45).unwrap();

        let state = room.state();
        assert_eq!(state.turn, Color::Black);
        assert!(state
            .pieces
            .iter()
            .any(|p| p.pos == 45 && p.kind == PieceKind::Knight && p.color == Color::White));
    }
}
