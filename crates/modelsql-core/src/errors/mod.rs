//! Error taxonomy.
//!
//! One enum per concern, joined by [`EngineError`] at the engine boundary.
//! Definition errors are logged and skip the offending document; parameter
//! and execution errors abort one invocation; cache errors are swallowed.

mod cache_error;
mod config_error;
mod definition_error;
mod engine_error;
mod exec_error;
mod param_error;

pub use cache_error::CacheError;
pub use config_error::ConfigError;
pub use definition_error::DefinitionError;
pub use engine_error::{EngineError, StatusClass};
pub use exec_error::ExecError;
pub use param_error::ParamError;
