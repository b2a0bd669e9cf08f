//! Errors raised while parsing a model definition document.

/// A definition document could not be turned into a model.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DefinitionError {
    #[error("cannot read {path}: {message}")]
    Io { path: String, message: String },

    #[error("malformed definition {path}: {message}")]
    Malformed { path: String, message: String },

    #[error("{path}: group '{group}' has unknown type '{type_name}'")]
    UnknownGroupType {
        path: String,
        group: String,
        type_name: String,
    },

    #[error("{path}: group '{group}' is defined more than once")]
    DuplicateGroup { path: String, group: String },

    #[error("{path}: group '{group}' has no commands")]
    EmptyGroup { path: String, group: String },

    #[error("{path}: paging select '{group}' needs exactly two commands (count, data), found {found}")]
    PagingCommandCount {
        path: String,
        group: String,
        found: usize,
    },

    #[error("{path}: batch multi exec '{group}' command #{index} has no input pin")]
    MissingInputPin {
        path: String,
        group: String,
        index: usize,
    },

    #[error("{path}: parameter '{parameter}' in group '{group}' is not a placeholder of its command")]
    UnboundParameter {
        path: String,
        group: String,
        parameter: String,
    },

    #[error("{path}: parameter '{parameter}' in group '{group}': {message}")]
    InvalidParameter {
        path: String,
        group: String,
        parameter: String,
        message: String,
    },

    #[error("{path}: group '{group}': {message}")]
    InvalidAttribute {
        path: String,
        group: String,
        message: String,
    },
}
