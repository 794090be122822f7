//! # votemarket-db
//!
//! SQLite persistence for the market.
//! Manages the single database at `$VOTEMARKET_DATA_DIR/votemarket.db`.
//!
//! ## Schema
//!
//! - WAL mode, foreign keys enforced
//! - Addresses and hashes are BLOBs, amounts are decimal TEXT (they exceed
//!   SQLite's 64-bit integers), timestamps are Unix seconds
//! - Schema version stored in `PRAGMA user_version`
//!
//! Committed market events are applied to the tables and appended to the
//! journal in one transaction per call (see [`journal`]). The full state can
//! be written and read back as a [`MarketSnapshot`](votemarket_market::MarketSnapshot)
//! (see [`snapshot`]).

mod codec;
pub mod journal;
pub mod migrations;
pub mod queries;
pub mod schema;
pub mod snapshot;

use rusqlite::Connection;
use std::path::Path;

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Database error types.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Open or create the database at the given path.
///
/// Configures WAL mode, foreign keys, and runs any pending migrations.
pub fn open(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    configure(&conn)?;
    migrations::run(&conn)?;
    Ok(conn)
}

/// Open an in-memory database (for testing).
pub fn open_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure(&conn)?;
    migrations::run(&conn)?;
    Ok(conn)
}

/// Configure SQLite pragmas.
fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;",
    )?;
    Ok(())
}
