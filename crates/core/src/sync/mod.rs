//! Board synchronisation with the room server

mod messages;
pub mod snapshot;
pub mod socket;

pub use messages::*;
pub use snapshot::{apply_move, reconstruct, serialize};
pub use socket::{Backoff, ChessSocket};
