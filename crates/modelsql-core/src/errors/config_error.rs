//! Configuration loading errors.

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {message}")]
    Read { path: String, message: String },

    #[error("invalid config TOML: {message}")]
    Parse { message: String },

    #[error("invalid config value for {field}: {message}")]
    Invalid { field: String, message: String },
}
