//! Umbrella error returned by the engine facade.

use super::{ConfigError, DefinitionError, ExecError, ParamError};
use crate::types::ParamMap;

/// Coarse response class for the HTTP layer sitting above the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// Caller-side problem: unknown model/command, invalid parameters.
    ClientError,
    /// Execution or infrastructure failure.
    ServerError,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("model '{model}' is not loaded")]
    ModelNotFound { model: String },

    #[error("command '{command}' is not defined in model '{model}'")]
    CommandNotFound { model: String, command: String },

    #[error(transparent)]
    Param(#[from] ParamError),

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error(transparent)]
    Definition(#[from] DefinitionError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An `eachtran` batch failed after some elements had already
    /// committed. `returned` holds the returnable defaults of the committed
    /// elements, in execution order.
    #[error("{committed} batch elements committed before a failure: {source}")]
    PartiallyCommitted {
        committed: usize,
        rows_affected: usize,
        returned: Vec<ParamMap>,
        source: Box<EngineError>,
    },

    #[error("definition watcher failed to start: {message}")]
    Watcher { message: String },

    #[error("engine runtime is not initialized")]
    NotInitialized,

    #[error("engine runtime is already initialized")]
    AlreadyInitialized,
}

impl EngineError {
    /// Response class: validation and lookup failures are the caller's, the rest ours.
    pub fn status_class(&self) -> StatusClass {
        match self {
            Self::PartiallyCommitted { source, .. } => source.status_class(),
            Self::ModelNotFound { .. } | Self::CommandNotFound { .. } | Self::Param(_) => {
                StatusClass::ClientError
            }
            Self::Exec(ExecError::MissingPin { .. })
            | Self::Exec(ExecError::TypeMismatch { .. }) => StatusClass::ClientError,
            _ => StatusClass::ServerError,
        }
    }

    /// Stable machine-readable code.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::PartiallyCommitted { .. } => "PARTIALLY_COMMITTED",
            Self::ModelNotFound { .. } => "MODEL_NOT_FOUND",
            Self::CommandNotFound { .. } => "COMMAND_NOT_FOUND",
            Self::Param(_) => "INVALID_PARAMETER",
            Self::Exec(ExecError::MissingPin { .. }) => "MISSING_INPUT_PIN",
            Self::Exec(ExecError::TypeMismatch { .. }) => "COMMAND_TYPE_MISMATCH",
            Self::Exec(ExecError::Panicked { .. }) => "EXECUTION_PANICKED",
            Self::Exec(_) => "EXECUTION_ERROR",
            Self::Definition(_) => "DEFINITION_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Watcher { .. } => "WATCHER_ERROR",
            Self::NotInitialized => "RUNTIME_NOT_INITIALIZED",
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
        }
    }
}
