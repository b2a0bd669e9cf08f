//! Decoded column values.

use std::collections::BTreeMap;

use base64::Engine as _;
use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};

/// Rendering of [`Value::Time`] in JSON output.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// One decoded, non-NULL column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Bool(bool),
    Time(NaiveDateTime),
}

/// One result row: column name → value. NULL columns are absent.
pub type Record = BTreeMap<String, Value>;

impl Value {
    /// Kind name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::UInt(_) => "uint",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Bool(_) => "bool",
            Self::Time(_) => "time",
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::UInt(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// JSON form, as written by [`Serialize`].
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Int(v) => serde_json::Value::from(*v),
            Self::UInt(v) => serde_json::Value::from(*v),
            Self::Float(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::Bytes(b) => serde_json::Value::String(encode_bytes(b)),
            Self::Bool(v) => serde_json::Value::Bool(*v),
            Self::Time(t) => serde_json::Value::String(t.format(TIME_FORMAT).to_string()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Int(v) => serializer.serialize_i64(*v),
            Self::UInt(v) => serializer.serialize_u64(*v),
            Self::Float(v) => serializer.serialize_f64(*v),
            Self::Text(s) => serializer.serialize_str(s),
            Self::Bytes(b) => serializer.serialize_str(&encode_bytes(b)),
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::Time(t) => serializer.collect_str(&t.format(TIME_FORMAT)),
        }
    }
}

fn encode_bytes(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}
