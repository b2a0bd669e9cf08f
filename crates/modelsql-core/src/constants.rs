//! Engine-wide constants.

/// Default extension of model definition documents.
pub const DEFAULT_EXTENSION: &str = ".msql";

/// Bits reserved for the node (worker) id inside a generated id.
pub const WORKER_BITS: u8 = 6;

/// Bits reserved for the per-millisecond sequence inside a generated id.
pub const SEQUENCE_BITS: u8 = 12;

/// Largest node id that fits in [`WORKER_BITS`].
pub const MAX_WORKER_ID: i64 = -1 ^ (-1 << WORKER_BITS);

/// Largest sequence number that fits in [`SEQUENCE_BITS`].
pub const MAX_SEQUENCE: i64 = -1 ^ (-1 << SEQUENCE_BITS);

/// Default id generator epoch (2018-08-26T03:07:40.333Z). Changing it after ids
/// have been issued can produce duplicates.
pub const DEFAULT_EPOCH_MS: i64 = 1_535_252_860_333;

/// Prefix of the positional key used for untagged multi-select results.
pub const POSITIONAL_KEY_PREFIX: &str = "data";

/// Environment variable overriding the configured log filter.
pub const LOG_ENV_VAR: &str = "MODELSQL_LOG";
