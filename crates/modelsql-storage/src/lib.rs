//! # modelsql-storage
//!
//! SQLite access for the modelsql engine. One serialized writer plus a
//! round-robin reader pool per database, named-parameter binding from JSON
//! parameter maps, panic-safe transactions, and conversion of result rows
//! into generic records.

pub mod binding;
pub mod connection;
pub mod materialize;
pub mod statement;
pub mod transaction;

pub use connection::{DatabaseManager, DatabaseSet};
pub use statement::{execute, query};
pub use transaction::{catch_panic, transact};
