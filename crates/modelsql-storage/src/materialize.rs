//! Result rows → [`Record`]s.
//!
//! Each column gets a [`ColumnKind`] from its declared type once per
//! statement; every value is then decoded by that kind. NULLs are omitted.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use modelsql_core::errors::ExecError;
use modelsql_core::types::{Record, Value};
use rusqlite::types::ValueRef;
use rusqlite::{Rows, Statement};

use crate::statement::sqlite_error;

const TEXT_TIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Decoder selected for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Follow the storage class: integer, float, text or bytes.
    Storage,
    /// Non-negative integers only.
    Unsigned,
    /// Integers 0 and 1.
    Bool,
    /// Date/time text or unix seconds.
    Time,
}

impl ColumnKind {
    /// Kind for a declared column type (`BOOLEAN`, `DATETIME`, `INT UNSIGNED`, ...).
    pub fn from_declared(declared: &str) -> Self {
        let upper = declared.trim().to_ascii_uppercase();
        if upper.starts_with("BOOL") {
            Self::Bool
        } else if upper.starts_with("DATE") || upper.starts_with("TIMESTAMP") {
            Self::Time
        } else if upper.contains("UNSIGNED") || upper.starts_with("UINT") {
            Self::Unsigned
        } else {
            Self::Storage
        }
    }

    /// Decode one value. `Ok(None)` for NULL, `Err(storage class)` when the
    /// stored value does not fit this kind.
    pub fn decode(self, raw: ValueRef<'_>) -> Result<Option<Value>, &'static str> {
        let value = match (self, raw) {
            (_, ValueRef::Null) => return Ok(None),

            (Self::Storage, ValueRef::Integer(i)) => Value::Int(i),
            (Self::Storage, ValueRef::Real(f)) => Value::Float(f),
            (Self::Storage, ValueRef::Text(t)) => Value::Text(utf8(t)?.to_string()),
            (Self::Storage, ValueRef::Blob(b)) => Value::Bytes(b.to_vec()),

            (Self::Unsigned, ValueRef::Integer(i)) => {
                Value::UInt(u64::try_from(i).map_err(|_| "negative integer")?)
            }

            (Self::Bool, ValueRef::Integer(0)) => Value::Bool(false),
            (Self::Bool, ValueRef::Integer(1)) => Value::Bool(true),
            (Self::Bool, ValueRef::Integer(_)) => return Err("non-boolean integer"),

            (Self::Time, ValueRef::Text(t)) => Value::Time(parse_time(utf8(t)?).ok_or("text")?),
            (Self::Time, ValueRef::Integer(secs)) => Value::Time(
                DateTime::from_timestamp(secs, 0)
                    .map(|dt| dt.naive_utc())
                    .ok_or("integer")?,
            ),

            (_, other) => return Err(storage_name(other)),
        };
        Ok(Some(value))
    }
}

fn utf8(bytes: &[u8]) -> Result<&str, &'static str> {
    std::str::from_utf8(bytes).map_err(|_| "non-utf8 text")
}

fn storage_name(raw: ValueRef<'_>) -> &'static str {
    match raw {
        ValueRef::Null => "null",
        ValueRef::Integer(_) => "integer",
        ValueRef::Real(_) => "real",
        ValueRef::Text(_) => "text",
        ValueRef::Blob(_) => "blob",
    }
}

fn parse_time(text: &str) -> Option<NaiveDateTime> {
    TEXT_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.naive_utc()))
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[derive(Debug, Clone)]
struct ColumnShape {
    name: String,
    declared: String,
    kind: ColumnKind,
}

/// Column names and decoders of a prepared statement.
#[derive(Debug, Clone)]
pub struct RowShape {
    columns: Vec<ColumnShape>,
}

impl RowShape {
    pub fn of(stmt: &Statement<'_>) -> Self {
        let columns = stmt
            .columns()
            .into_iter()
            .map(|col| {
                let declared = col.decl_type().unwrap_or_default().to_string();
                ColumnShape {
                    name: col.name().to_string(),
                    kind: ColumnKind::from_declared(&declared),
                    declared,
                }
            })
            .collect();
        Self { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Drain `rows` into records.
pub fn materialize(mut rows: Rows<'_>, shape: &RowShape) -> Result<Vec<Record>, ExecError> {
    let mut records = Vec::new();
    while let Some(row) = rows.next().map_err(sqlite_error)? {
        let mut record = Record::new();
        for (idx, column) in shape.columns.iter().enumerate() {
            let raw = row.get_ref(idx).map_err(sqlite_error)?;
            let decoded = column
                .kind
                .decode(raw)
                .map_err(|storage| ExecError::UnsupportedColumn {
                    column: column.name.clone(),
                    declared: column.declared.clone(),
                    storage,
                })?;
            if let Some(value) = decoded {
                record.insert(column.name.clone(), value);
            }
        }
        records.push(record);
    }
    Ok(records)
}
