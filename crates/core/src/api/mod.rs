//! Room and role lookup over HTTP

mod client;
mod types;

pub use client::{RoomClient, SESSION_COOKIE};
pub use types::*;
