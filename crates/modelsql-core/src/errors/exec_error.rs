//! Errors raised while executing SQL or materializing results.

/// A statement, transaction or result conversion failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExecError {
    #[error("sqlite error: {message}")]
    SqliteError { message: String },

    #[error("execution aborted by panic: {message}")]
    Panicked { message: String },

    #[error("database '{database}' is not configured")]
    UnknownDatabase { database: String },

    #[error("placeholder #{index} is anonymous; only named placeholders can be bound")]
    AnonymousPlaceholder { index: usize },

    #[error("paging count query returned {rows} rows, expected exactly one")]
    PagingRowCount { rows: usize },

    #[error("paging count query returned {columns} columns, expected exactly one")]
    PagingColumnCount { columns: usize },

    #[error("paging count query returned a non-integer total")]
    PagingTotal,

    #[error("no batch supplied for input pin '{pin}'")]
    MissingPin { pin: String },

    #[error("column '{column}' (declared '{declared}') holds an unsupported {storage} value")]
    UnsupportedColumn {
        column: String,
        declared: String,
        storage: &'static str,
    },

    #[error("'{model}/{command}' is a {actual} group, not {expected}")]
    TypeMismatch {
        model: String,
        command: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("'{group_type}' groups cannot be executed")]
    Unsupported { group_type: &'static str },

    #[error("result serialization failed: {message}")]
    Serialize { message: String },
}
