//! Database operations

use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::path::Path;

use super::models::*;
use crate::error::{Error, Result};
use crate::room::{unix_now, Room};
use crate::rules::{Color, PieceKind, RuleSet};
use crate::sync::PieceRecord;

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS rooms (
                id INTEGER PRIMARY KEY,
                last_accessed INTEGER NOT NULL,
                white TEXT,
                black TEXT,
                turn TEXT NOT NULL DEFAULT 'W'
            );

            CREATE TABLE IF NOT EXISTS pieces (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                room_id INTEGER NOT NULL,
                pos INTEGER NOT NULL CHECK (pos >= 0 AND pos < 64),
                type TEXT NOT NULL,
                color TEXT NOT NULL,
                FOREIGN KEY (room_id) REFERENCES rooms(id) ON DELETE CASCADE,
                UNIQUE (room_id, pos)
            );

            CREATE INDEX IF NOT EXISTS idx_pieces_room_id ON pieces(room_id);

            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                room_id INTEGER NOT NULL,
                session_key TEXT NOT NULL,
                name TEXT NOT NULL,
                FOREIGN KEY (room_id) REFERENCES rooms(id) ON DELETE CASCADE,
                UNIQUE (room_id, session_key)
            );
            "#,
        )?;
        Ok(())
    }

    /// Stores a room that is not in the database yet.
    pub fn insert_room(&mut self, room: &Room) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO rooms (id, last_accessed, white, black, turn) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                room.id(),
                room.last_accessed(),
                room.white(),
                room.black(),
                room.turn().as_str(),
            ],
        )?;
        write_pieces(&tx, room)?;
        tx.commit()?;
        Ok(())
    }

    /// Writes the room row, its seats and its full piece set in one transaction.
    pub fn save_room(&mut self, room: &Room) -> Result<()> {
        let tx = self.conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO rooms (id, last_accessed, white, black, turn)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                last_accessed = ?2, white = ?3, black = ?4, turn = ?5
            "#,
            params![
                room.id(),
                room.last_accessed(),
                room.white(),
                room.black(),
                room.turn().as_str(),
            ],
        )?;

        tx.execute("DELETE FROM pieces WHERE room_id = ?1", params![room.id()])?;
        write_pieces(&tx, room)?;

        tx.commit()?;
        Ok(())
    }

    pub fn get_room_row(&self, id: u32) -> Result<Option<StoredRoom>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, last_accessed, white, black, turn FROM rooms WHERE id = ?1",
                params![id],
                |row| {
                    Ok(StoredRoom {
                        id: row.get(0)?,
                        last_accessed: row.get(1)?,
                        white: row.get(2)?,
                        black: row.get(3)?,
                        turn: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    pub fn get_pieces(&self, room_id: u32) -> Result<Vec<StoredPiece>> {
        let mut stmt = self.conn.prepare(
            "SELECT room_id, pos, type, color FROM pieces WHERE room_id = ?1 ORDER BY pos",
        )?;

        let pieces = stmt
            .query_map(params![room_id], |row| {
                Ok(StoredPiece {
                    room_id: row.get(0)?,
                    pos: row.get(1)?,
                    piece_type: row.get(2)?,
                    color: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(pieces)
    }

    /// Loads a room and rebuilds its board under `rules`.
    pub fn load_room(&self, id: u32, rules: RuleSet) -> Result<Option<Room>> {
        let Some(row) = self.get_room_row(id)? else {
            return Ok(None);
        };

        let records = self
            .get_pieces(id)?
            .into_iter()
            .map(|piece| -> Result<PieceRecord> {
                Ok(PieceRecord {
                    pos: piece.pos as usize,
                    kind: piece.piece_type.parse::<PieceKind>()?,
                    color: piece.color.parse::<Color>()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let room = Room::from_parts(
            row.id,
            rules,
            &records,
            row.turn.parse()?,
            row.white,
            row.black,
            row.last_accessed,
        )?;
        Ok(Some(room))
    }

    pub fn touch_room(&self, id: u32) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE rooms SET last_accessed = ?1 WHERE id = ?2",
            params![unix_now(), id],
        )?;
        if updated == 0 {
            return Err(Error::Api(format!("room {} does not exist", id)));
        }
        Ok(())
    }

    /// Chat name of `session` in a room, registering it as `user<N>` on first
    /// use, where N counts the users already registered there.
    pub fn chat_user(&mut self, room_id: u32, session: &str) -> Result<String> {
        let tx = self.conn.transaction()?;

        let existing: Option<String> = tx
            .query_row(
                "SELECT name FROM users WHERE room_id = ?1 AND session_key = ?2",
                params![room_id, session],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(name) = existing {
            return Ok(name);
        }

        let count: u32 = tx.query_row(
            "SELECT COUNT(*) FROM users WHERE room_id = ?1",
            params![room_id],
            |row| row.get(0),
        )?;
        let name = format!("user{}", count);
        tx.execute(
            "INSERT INTO users (room_id, session_key, name) VALUES (?1, ?2, ?3)",
            params![room_id, session, name],
        )?;
        tx.commit()?;

        tracing::debug!(room = room_id, %name, "chat user registered");
        Ok(name)
    }

    pub fn get_users(&self, room_id: u32) -> Result<Vec<StoredUser>> {
        let mut stmt = self.conn.prepare(
            "SELECT room_id, session_key, name FROM users WHERE room_id = ?1 ORDER BY id",
        )?;

        let users = stmt
            .query_map(params![room_id], |row| {
                Ok(StoredUser {
                    room_id: row.get(0)?,
                    session_key: row.get(1)?,
                    name: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(users)
    }

    pub fn count_rooms(&self) -> Result<u32> {
        let count: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM rooms",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

fn write_pieces(tx: &Transaction<'_>, room: &Room) -> Result<()> {
    let mut insert =
        tx.prepare("INSERT INTO pieces (room_id, pos, type, color) VALUES (?1, ?2, ?3, ?4)")?;
    for record in room.pieces() {
        insert.execute(params![
            room.id(),
            record.pos as u32,
            record.kind.as_str(),
            record.color.as_str(),
        ])?;
    }
    Ok(())
}
