//! Board model and per-piece movement rules

mod board;
pub mod geometry;
mod king;
mod knight;
mod movement;
pub mod notation;
mod pawn;
mod sliding;
mod types;

pub use board::Board;
pub use geometry::{Direction, BOARD_SIZE};
pub use king::is_in_check;
pub use movement::Movement;
pub use sliding::ray;
pub use types::*;
