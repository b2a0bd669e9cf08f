//! Generic value and record types shared by the storage and engine layers.

pub mod collections;
mod value;

pub use value::{Record, Value, TIME_FORMAT};

/// Caller-supplied parameters of one invocation, keyed by parameter name.
pub type ParamMap = serde_json::Map<String, serde_json::Value>;
