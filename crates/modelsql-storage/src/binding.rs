//! Named-parameter binding from a JSON parameter map.
//!
//! Placeholders may use any of SQLite's named forms (`:name`, `@name`,
//! `$name`); the prefix is dropped for the map lookup. A placeholder with no
//! map entry binds NULL. Anonymous `?` placeholders are rejected.

use modelsql_core::errors::ExecError;
use modelsql_core::types::ParamMap;
use rusqlite::types::Value as SqlValue;
use rusqlite::Statement;
use serde_json::Value as JsonValue;

use crate::statement::sqlite_error;

/// Bind every placeholder of `stmt` from `params`.
pub fn bind_named(stmt: &mut Statement<'_>, params: &ParamMap) -> Result<(), ExecError> {
    for index in 1..=stmt.parameter_count() {
        let key = stmt
            .parameter_name(index)
            .and_then(placeholder_key)
            .ok_or(ExecError::AnonymousPlaceholder { index })?
            .to_string();
        let value = params.get(&key).map(to_sql_value).unwrap_or(SqlValue::Null);
        stmt.raw_bind_parameter(index, value).map_err(sqlite_error)?;
    }
    Ok(())
}

/// Map key of a named placeholder, or `None` for `?`/`?NNN`.
fn placeholder_key(placeholder: &str) -> Option<&str> {
    let mut chars = placeholder.chars();
    match chars.next() {
        Some(':' | '@' | '$') => Some(chars.as_str()).filter(|k| !k.is_empty()),
        _ => None,
    }
}

/// Convert one JSON value to a SQLite value. Arrays and objects are stored as
/// their JSON text.
pub fn to_sql_value(value: &JsonValue) -> SqlValue {
    match value {
        JsonValue::Null => SqlValue::Null,
        JsonValue::Bool(b) => SqlValue::Integer(i64::from(*b)),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => n.as_f64().map(SqlValue::Real).unwrap_or(SqlValue::Null),
        },
        JsonValue::String(s) => SqlValue::Text(s.clone()),
        JsonValue::Array(_) | JsonValue::Object(_) => SqlValue::Text(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;
    use serde_json::json;

    #[test]
    fn test_placeholder_key() {
        assert_eq!(placeholder_key(":id"), Some("id"));
        assert_eq!(placeholder_key("@id"), Some("id"));
        assert_eq!(placeholder_key("$id"), Some("id"));
        assert_eq!(placeholder_key("?1"), None);
        assert_eq!(placeholder_key(":"), None);
    }

    #[test]
    fn test_json_conversion() {
        assert_eq!(to_sql_value(&json!(true)), SqlValue::Integer(1));
        assert_eq!(to_sql_value(&json!(7)), SqlValue::Integer(7));
        assert_eq!(to_sql_value(&json!(1.5)), SqlValue::Real(1.5));
        assert_eq!(to_sql_value(&json!([1, 2])), SqlValue::Text("[1,2]".into()));
    }

    #[test]
    fn test_binds_by_name_and_nulls_missing() {
        let conn = Connection::open_in_memory().unwrap();
        let mut stmt = conn.prepare("SELECT :a, @b, $c").unwrap();
        let mut params = ParamMap::new();
        params.insert("a".into(), json!(1));
        params.insert("b".into(), json!("two"));
        bind_named(&mut stmt, &params).unwrap();

        let mut rows = stmt.raw_query();
        let row = rows.next().unwrap().unwrap();
        assert_eq!(row.get::<_, i64>(0).unwrap(), 1);
        assert_eq!(row.get::<_, String>(1).unwrap(), "two");
        assert_eq!(row.get::<_, Option<i64>>(2).unwrap(), None);
    }

    #[test]
    fn test_rejects_anonymous_placeholder() {
        let conn = Connection::open_in_memory().unwrap();
        let mut stmt = conn.prepare("SELECT :a, ?").unwrap();
        let err = bind_named(&mut stmt, &ParamMap::new()).unwrap_err();
        assert_eq!(err, ExecError::AnonymousPlaceholder { index: 2 });
    }
}
