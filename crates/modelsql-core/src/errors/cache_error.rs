//! Result cache errors. Never surfaced to callers: a failing cache write
//! only means the result is not cached.

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CacheError {
    #[error("unsupported cache duration code {code}")]
    UnsupportedDuration { code: i64 },
}
