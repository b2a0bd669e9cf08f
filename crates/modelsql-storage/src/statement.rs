//! Single-statement execution against a connection or open transaction.

use modelsql_core::errors::ExecError;
use modelsql_core::types::{ParamMap, Record};
use rusqlite::types::ValueRef;
use rusqlite::Connection;

use crate::binding::bind_named;
use crate::materialize::{materialize, RowShape};

pub fn sqlite_error(e: rusqlite::Error) -> ExecError {
    ExecError::SqliteError {
        message: e.to_string(),
    }
}

/// Run a row-returning statement and materialize every row.
pub fn query(conn: &Connection, sql: &str, params: &ParamMap) -> Result<Vec<Record>, ExecError> {
    let mut stmt = conn.prepare_cached(sql).map_err(sqlite_error)?;
    let shape = RowShape::of(&stmt);
    bind_named(&mut stmt, params)?;
    let records = materialize(stmt.raw_query(), &shape)?;
    tracing::debug!(sql, rows = records.len(), "query");
    Ok(records)
}

/// Run a mutating statement; returns the number of rows changed.
pub fn execute(conn: &Connection, sql: &str, params: &ParamMap) -> Result<usize, ExecError> {
    let mut stmt = conn.prepare_cached(sql).map_err(sqlite_error)?;
    bind_named(&mut stmt, params)?;
    let changed = stmt.raw_execute().map_err(sqlite_error)?;
    tracing::debug!(sql, changed, "execute");
    Ok(changed)
}

/// Run a count statement that must yield exactly one row with one integer column.
pub fn query_total(conn: &Connection, sql: &str, params: &ParamMap) -> Result<i64, ExecError> {
    let mut stmt = conn.prepare_cached(sql).map_err(sqlite_error)?;
    let columns = stmt.column_count();
    if columns != 1 {
        return Err(ExecError::PagingColumnCount { columns });
    }
    bind_named(&mut stmt, params)?;

    let mut rows = stmt.raw_query();
    let mut seen = 0usize;
    let mut total = None;
    while let Some(row) = rows.next().map_err(sqlite_error)? {
        seen += 1;
        if seen == 1 {
            total = match row.get_ref(0).map_err(sqlite_error)? {
                ValueRef::Integer(n) => Some(n),
                ValueRef::Real(f) if f.fract() == 0.0 => Some(f as i64),
                ValueRef::Text(t) => std::str::from_utf8(t).ok().and_then(|s| s.trim().parse().ok()),
                _ => None,
            };
        }
    }

    if seen != 1 {
        return Err(ExecError::PagingRowCount { rows: seen });
    }
    let total = total.ok_or(ExecError::PagingTotal)?;
    tracing::debug!(sql, total, "count");
    Ok(total)
}
