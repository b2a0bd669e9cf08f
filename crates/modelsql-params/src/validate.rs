//! Per-value contract checks.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use modelsql_core::errors::ParamError;
use regex::Regex;
use serde_json::Value as JsonValue;

use crate::param_spec::{describe_bounds, ParamSpec, ParamType};

/// Tolerance applied to both ends of a numeric range.
pub const RANGE_EPSILON: f64 = 1e-9;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .unwrap_or_else(|e| panic!("invalid e-mail pattern: {e}"))
});

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

/// Check a caller-supplied value against its contract.
///
/// `None` and JSON null both mean "absent". An absent or empty value only
/// fails when the parameter is required; type checks apply to the rest.
pub fn validate_value(spec: &ParamSpec, value: Option<&JsonValue>) -> Result<(), ParamError> {
    let name = || spec.name.clone();

    let value = match value {
        None | Some(JsonValue::Null) if spec.required => {
            return Err(ParamError::Missing { name: name() })
        }
        None | Some(JsonValue::Null) => return Ok(()),
        Some(v) => v,
    };

    if let JsonValue::String(s) = value {
        if s.is_empty() {
            return if spec.required {
                Err(ParamError::Empty { name: name() })
            } else {
                Ok(())
            };
        }
    }

    let Some(param_type) = spec.param_type else {
        return Ok(());
    };

    match param_type {
        ParamType::Blob => Ok(()),
        ParamType::String => {
            let s = expect_str(spec, value)?;
            check_length(spec, s)
        }
        ParamType::Int => {
            let n = as_integer(value).ok_or_else(|| ParamError::NotInteger { name: name() })?;
            check_range(spec, n as f64)
        }
        ParamType::Float => {
            let n = as_float(value).ok_or_else(|| ParamError::NotFloat { name: name() })?;
            check_range(spec, n)
        }
        ParamType::Date => {
            let s = expect_str(spec, value)?;
            NaiveDate::parse_from_str(s, DATE_FORMAT)
                .map(|_| ())
                .map_err(|_| ParamError::NotDate { name: name() })
        }
        ParamType::DateTime => {
            let s = expect_str(spec, value)?;
            if is_datetime(s) {
                Ok(())
            } else {
                Err(ParamError::NotDateTime { name: name() })
            }
        }
        ParamType::Email => {
            let s = expect_str(spec, value)?;
            if EMAIL_PATTERN.is_match(s) {
                Ok(())
            } else {
                Err(ParamError::NotEmail { name: name() })
            }
        }
    }
}

fn expect_str<'a>(spec: &ParamSpec, value: &'a JsonValue) -> Result<&'a str, ParamError> {
    value.as_str().ok_or_else(|| ParamError::NotString {
        name: spec.name.clone(),
    })
}

fn check_length(spec: &ParamSpec, s: &str) -> Result<(), ParamError> {
    let length = s.chars().count();
    let too_short = spec.min_len.is_some_and(|min| length < min);
    let too_long = spec.max_len.is_some_and(|max| length > max);
    if too_short || too_long {
        return Err(ParamError::Length {
            name: spec.name.clone(),
            length,
            bounds: describe_bounds(spec.min_len, spec.max_len),
        });
    }
    Ok(())
}

fn check_range(spec: &ParamSpec, value: f64) -> Result<(), ParamError> {
    let below = spec.min_value.is_some_and(|min| value < min - RANGE_EPSILON);
    let above = spec.max_value.is_some_and(|max| value > max + RANGE_EPSILON);
    if below || above {
        return Err(ParamError::Range {
            name: spec.name.clone(),
            value,
            bounds: describe_bounds(spec.min_value, spec.max_value),
        });
    }
    Ok(())
}

/// Integer view of a JSON value: integers, whole floats and numeric strings.
pub fn as_integer(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Float view of a JSON value: numbers and numeric strings.
pub fn as_float(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn is_datetime(s: &str) -> bool {
    DATETIME_FORMATS
        .iter()
        .any(|fmt| NaiveDateTime::parse_from_str(s, fmt).is_ok())
        || DateTime::parse_from_rfc3339(s).is_ok()
}
