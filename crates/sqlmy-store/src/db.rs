//! Database connection management
//!
//! Provides utilities for opening and configuring SQLite connections

use crate::errors::{from_rusqlite, Result};
use rusqlite::Connection;
use sqlmy_core::SqliteTarget;
use std::path::Path;

/// Open a SQLite database at the given path
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
    Connection::open(path).map_err(from_rusqlite)
}

/// Open an in-memory SQLite database
pub fn open_in_memory() -> Result<Connection> {
    Connection::open_in_memory().map_err(from_rusqlite)
}

/// Open and configure a connection to `target`
pub fn open_target(target: &SqliteTarget) -> Result<Connection> {
    let conn = match target {
        SqliteTarget::Memory => open_in_memory()?,
        SqliteTarget::File(path) => open(path)?,
    };
    configure(&conn, matches!(target, SqliteTarget::File(_)))?;
    Ok(conn)
}

/// Configure a connection
///
/// WAL only applies to file-backed databases; in-memory ones keep the
/// `memory` journal.
pub fn configure(conn: &Connection, file_backed: bool) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", true)
        .map_err(from_rusqlite)?;

    if file_backed {
        let mode: String = conn
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
            .map_err(from_rusqlite)?;
        tracing::debug!(journal_mode = %mode, "configured sqlite connection");
    }

    Ok(())
}
