//! # modelsql-core
//!
//! Shared foundation for the modelsql engine crates: error taxonomy,
//! TOML configuration, generic value/record types, tracing setup and
//! constants.

pub mod config;
pub mod constants;
pub mod errors;
pub mod tracing;
pub mod types;

pub use config::ModelSqlConfig;
pub use errors::{EngineError, StatusClass};
pub use types::{ParamMap, Record, Value};
