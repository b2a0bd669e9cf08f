//! Connection setup.

use std::time::Duration;

use modelsql_core::config::ConnectionConfig;
use modelsql_core::errors::ExecError;
use rusqlite::{Connection, OpenFlags};

use crate::statement::sqlite_error;

/// Open the writer connection, creating the file if needed.
pub(super) fn open_writer(config: &ConnectionConfig) -> Result<Connection, ExecError> {
    let conn = if config.is_memory() {
        Connection::open_in_memory().map_err(sqlite_error)?
    } else {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        Connection::open_with_flags(&config.path, flags).map_err(sqlite_error)?
    };
    apply_common(&conn, config)?;
    if !config.is_memory() {
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")
            .map_err(sqlite_error)?;
    }
    Ok(conn)
}

/// Open one read-only pool connection to an existing file.
pub(super) fn open_reader(config: &ConnectionConfig) -> Result<Connection, ExecError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = Connection::open_with_flags(&config.path, flags).map_err(sqlite_error)?;
    apply_common(&conn, config)?;
    conn.execute_batch("PRAGMA query_only = ON;")
        .map_err(sqlite_error)?;
    Ok(conn)
}

fn apply_common(conn: &Connection, config: &ConnectionConfig) -> Result<(), ExecError> {
    conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(sqlite_error)?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(sqlite_error)?;
    Ok(())
}
