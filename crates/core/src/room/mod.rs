//! Match rooms: seats, turn order and the starting position

mod room;
mod setup;

pub use room::{Role, Room};
pub(crate) use room::unix_now;
pub use setup::standard_setup;
