//! SQLite storage for rooms, their pieces and chat users

mod db;
mod models;

pub use db::Database;
pub use models::*;
