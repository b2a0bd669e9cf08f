//! Process-wide engine singleton via `OnceLock`, lock-free after initialization.
//!
//! Embedders that serve many requests initialize it once from configuration
//! and reach the engine through [`get`] afterwards.

use std::path::Path;
use std::sync::{Arc, OnceLock};

use modelsql_core::errors::EngineError;
use modelsql_core::ModelSqlConfig;

use crate::engine::Engine;

static RUNTIME: OnceLock<Arc<Engine>> = OnceLock::new();

/// Install the tracing subscriber (unless the host already has one), build
/// the engine from `config` and install it.
///
/// Fails with [`EngineError::AlreadyInitialized`] on a second call; the
/// engine built by the losing call is shut down.
pub fn initialize(config: &ModelSqlConfig) -> Result<Arc<Engine>, EngineError> {
    if RUNTIME.get().is_some() {
        return Err(EngineError::AlreadyInitialized);
    }
    if !modelsql_core::tracing::init_tracing(&config.logging) {
        tracing::debug!("keeping the host's tracing subscriber");
    }
    let engine = Arc::new(Engine::new(config)?);
    match RUNTIME.set(Arc::clone(&engine)) {
        Ok(()) => {
            tracing::info!(models = engine.stats().registry.models, "engine runtime initialized");
            Ok(engine)
        }
        Err(lost) => {
            lost.shutdown();
            Err(EngineError::AlreadyInitialized)
        }
    }
}

/// [`initialize`] from a TOML configuration file.
pub fn initialize_from_file(path: &Path) -> Result<Arc<Engine>, EngineError> {
    let config = ModelSqlConfig::load(path)?;
    initialize(&config)
}

pub fn get() -> Result<Arc<Engine>, EngineError> {
    RUNTIME.get().cloned().ok_or(EngineError::NotInitialized)
}

pub fn is_initialized() -> bool {
    RUNTIME.get().is_some()
}
