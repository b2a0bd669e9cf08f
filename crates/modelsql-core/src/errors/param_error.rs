//! Errors raised while validating or defaulting caller parameters.

/// A caller parameter failed its contract. Every variant names the parameter.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamError {
    #[error("parameter '{name}' is required")]
    Missing { name: String },

    #[error("parameter '{name}' must not be empty")]
    Empty { name: String },

    #[error("parameter '{name}' must be a string")]
    NotString { name: String },

    #[error("parameter '{name}' has length {length}, allowed {bounds}")]
    Length {
        name: String,
        length: usize,
        bounds: String,
    },

    #[error("parameter '{name}' is not a valid integer")]
    NotInteger { name: String },

    #[error("parameter '{name}' is not a valid number")]
    NotFloat { name: String },

    #[error("parameter '{name}' value {value} is outside {bounds}")]
    Range {
        name: String,
        value: f64,
        bounds: String,
    },

    #[error("parameter '{name}' is not a valid date (YYYY-MM-DD)")]
    NotDate { name: String },

    #[error("parameter '{name}' is not a valid date-time")]
    NotDateTime { name: String },

    #[error("parameter '{name}' is not a valid e-mail address")]
    NotEmail { name: String },

    #[error("default of '{parameter}': named value '{name}' is not registered")]
    UnknownNamedValue { parameter: String, name: String },

    #[error("default of '{parameter}': '{name}' takes {expected} argument(s), {supplied} supplied")]
    ArityMismatch {
        parameter: String,
        name: String,
        expected: usize,
        supplied: usize,
    },

    #[error("default of '{parameter}': '{name}' must return exactly one value, returned {returned}")]
    ReturnCount {
        parameter: String,
        name: String,
        returned: usize,
    },

    #[error("'{name}' is not a valid named value identifier")]
    InvalidName { name: String },
}

impl ParamError {
    /// Name of the offending parameter (or registration name).
    pub fn parameter(&self) -> &str {
        match self {
            Self::Missing { name }
            | Self::Empty { name }
            | Self::NotString { name }
            | Self::Length { name, .. }
            | Self::NotInteger { name }
            | Self::NotFloat { name }
            | Self::Range { name, .. }
            | Self::NotDate { name }
            | Self::NotDateTime { name }
            | Self::NotEmail { name }
            | Self::InvalidName { name } => name,
            Self::UnknownNamedValue { parameter, .. }
            | Self::ArityMismatch { parameter, .. }
            | Self::ReturnCount { parameter, .. } => parameter,
        }
    }
}
