//! Database handles.
//!
//! Each configured database gets a [`DatabaseManager`]: writes are serialized
//! through one `Mutex<Connection>`, reads rotate over a pool of read-only
//! connections. In-memory databases have no pool and read through the writer.

mod manager;
mod pragmas;
mod set;

pub use manager::DatabaseManager;
pub use set::DatabaseSet;
