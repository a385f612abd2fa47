//! Persistence: pooled SQLite plus schema migrations

pub mod connection;
pub mod migrations;

pub use connection::{Database, DbError, DbResult};
