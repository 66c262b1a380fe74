//! 64-square occupancy and the positional mutation primitives

use super::geometry::BOARD_SIZE;
use super::types::{Color, Piece, PieceKind, RuleSet, Square};
use crate::error::{Error, Result};

/// Owns every piece on it. A stored piece always records the square it sits on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    fields: [Option<Piece>; BOARD_SIZE],
    rules: RuleSet,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self::with_rules(RuleSet::default())
    }

    pub fn with_rules(rules: RuleSet) -> Self {
        Self {
            fields: [None; BOARD_SIZE],
            rules,
        }
    }

    pub fn rules(&self) -> RuleSet {
        self.rules
    }

    fn check(square: Square) -> Result<Square> {
        if square < BOARD_SIZE {
            Ok(square)
        } else {
            Err(Error::SquareOutOfRange(square))
        }
    }

    pub fn occupant(&self, square: Square) -> Result<Option<&Piece>> {
        Ok(self.fields[Self::check(square)?].as_ref())
    }

    pub fn is_occupied(&self, square: Square) -> Result<bool> {
        Ok(self.occupant(square)?.is_some())
    }

    pub fn color_at(&self, square: Square) -> Result<Color> {
        self.occupant(square)?
            .map(Piece::color)
            .ok_or(Error::EmptySquare(square))
    }

    /// Creates a piece on an empty square.
    pub fn spawn(&mut self, kind: PieceKind, color: Color, square: Square) -> Result<&Piece> {
        let slot = &mut self.fields[Self::check(square)?];
        if slot.is_some() {
            return Err(Error::SquareOccupied(square));
        }
        Ok(&*slot.insert(Piece::new(kind, color, square)))
    }

    /// Exchanges the occupants of two squares. An empty side simply lets the
    /// other piece relocate.
    pub fn swap(&mut self, a: Square, b: Square) -> Result<()> {
        let (a, b) = (Self::check(a)?, Self::check(b)?);
        self.fields.swap(a, b);
        self.sync_position(a);
        self.sync_position(b);
        Ok(())
    }

    /// Moves the occupant of `src` onto `dst`, dropping whatever stood there.
    pub fn replace(&mut self, src: Square, dst: Square) -> Result<()> {
        let (src, dst) = (Self::check(src)?, Self::check(dst)?);
        if src == dst {
            return Ok(());
        }
        self.fields[dst] = self.fields[src].take();
        self.sync_position(dst);
        Ok(())
    }

    fn sync_position(&mut self, square: Square) {
        if let Some(piece) = self.fields[square].as_mut() {
            piece.position = square;
        }
    }

    pub(crate) fn mark_moved(&mut self, square: Square) {
        if let Some(piece) = self.fields[square].as_mut() {
            piece.has_moved = true;
        }
    }

    pub fn clear(&mut self) {
        self.fields = [None; BOARD_SIZE];
    }

    pub fn pieces(&self) -> impl Iterator<Item = &Piece> + '_ {
        self.fields.iter().flatten()
    }

    pub fn pieces_of(&self, color: Color) -> impl Iterator<Item = &Piece> + '_ {
        self.pieces().filter(move |piece| piece.color() == color)
    }

    /// Lets the occupant of `source` interact with `target`.
    ///
    /// `Ok(false)` means the interaction is illegal (or `source` is empty) and
    /// nothing changed.
    pub fn interact(&mut self, source: Square, target: Square) -> Result<bool> {
        Self::check(target)?;
        let Some(piece) = self.occupant(source)?.copied() else {
            return Ok(false);
        };
        piece.kind().movement().interact(&piece, self, target)
    }

    /// Squares the occupant of `square` could reach before occupancy filtering.
    pub fn interactable(&self, square: Square) -> Result<Vec<Square>> {
        Ok(self
            .occupant(square)?
            .map(|piece| piece.kind().movement().interactable(piece, self))
            .unwrap_or_default())
    }

    pub fn movable_fields(&self, square: Square) -> Result<Vec<Square>> {
        Ok(self
            .occupant(square)?
            .map(|piece| piece.kind().movement().movable_fields(piece, self))
            .unwrap_or_default())
    }

    pub fn attackable_fields(&self, square: Square) -> Result<Vec<Square>> {
        Ok(self
            .occupant(square)?
            .map(|piece| piece.kind().movement().attackable_fields(piece, self))
            .unwrap_or_default())
    }

    /// Unchecked lookup for move generation, which only ever produces
    /// in-range squares.
    pub(crate) fn at(&self, square: Square) -> Option<&Piece> {
        self.fields.get(square).and_then(Option::as_ref)
    }
}
