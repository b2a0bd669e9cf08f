//! Writer + reader pool for one database.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use modelsql_core::config::ConnectionConfig;
use modelsql_core::errors::ExecError;
use rusqlite::Connection;

use super::pragmas;

pub struct DatabaseManager {
    name: String,
    writer: Mutex<Connection>,
    readers: Vec<Mutex<Connection>>,
    next_reader: AtomicUsize,
}

impl DatabaseManager {
    /// Open `config.path`. File databases get `config.readers` pool connections,
    /// opened after the writer so the file exists.
    pub fn open(name: &str, config: &ConnectionConfig) -> Result<Self, ExecError> {
        let writer = pragmas::open_writer(config)?;
        let readers = if config.is_memory() {
            Vec::new()
        } else {
            (0..config.readers)
                .map(|_| pragmas::open_reader(config).map(Mutex::new))
                .collect::<Result<Vec<_>, _>>()?
        };
        tracing::debug!(
            database = name,
            path = %config.path.display(),
            readers = readers.len(),
            "opened database"
        );
        Ok(Self {
            name: name.to_string(),
            writer: Mutex::new(writer),
            readers,
            next_reader: AtomicUsize::new(0),
        })
    }

    pub fn open_in_memory(name: &str) -> Result<Self, ExecError> {
        Self::open(name, &ConnectionConfig::default())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reader_count(&self) -> usize {
        self.readers.len()
    }

    /// Run `f` on the writer connection.
    pub fn with_writer<T, F>(&self, f: F) -> Result<T, ExecError>
    where
        F: FnOnce(&Connection) -> Result<T, ExecError>,
    {
        let conn = lock(&self.writer);
        f(&conn)
    }

    /// Run `f` on the next pooled reader, or the writer when there is no pool.
    pub fn with_reader<T, F>(&self, f: F) -> Result<T, ExecError>
    where
        F: FnOnce(&Connection) -> Result<T, ExecError>,
    {
        if self.readers.is_empty() {
            return self.with_writer(f);
        }
        let idx = self.next_reader.fetch_add(1, Ordering::Relaxed) % self.readers.len();
        let conn = lock(&self.readers[idx]);
        f(&conn)
    }
}

/// A panic while holding a connection is recovered at the transaction
/// boundary; the connection itself stays usable.
fn lock(mutex: &Mutex<Connection>) -> MutexGuard<'_, Connection> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
