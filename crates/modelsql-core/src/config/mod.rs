//! TOML configuration for the engine.
//!
//! Every section and field is defaulted, so an empty document is a valid
//! configuration (no roots, caching disabled, no watcher).

mod modelsql_config;
mod sections;

pub use modelsql_config::ModelSqlConfig;
pub use sections::{
    CacheConfig, ConnectionConfig, DatabaseConfig, IdGenConfig, LoggingConfig, RegistryConfig,
};
