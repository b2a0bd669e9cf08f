//! # modelsql-engine
//!
//! Executes the command groups of loaded models.
//!
//! - `executor`: per group type execution over one database
//! - `cache`: fingerprinted JSON result cache
//! - `engine`: the facade: lookup, type checks, tracing, cached JSON reads
//! - `runtime`: optional process-wide engine instance

pub mod cache;
pub mod engine;
pub mod executor;
pub mod runtime;

pub use cache::ResultCache;
pub use engine::{Engine, EngineStats};
pub use executor::{
    BatchMultiOutcome, BatchOutcome, ExecOutcome, MultiResult, PagingResult, PinBatches,
};
