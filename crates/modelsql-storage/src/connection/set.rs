//! Named databases from configuration.

use std::sync::Arc;

use modelsql_core::config::DatabaseConfig;
use modelsql_core::errors::ExecError;
use rustc_hash::FxHashMap;

use super::DatabaseManager;

/// Every configured database, plus the name used when a model names none.
pub struct DatabaseSet {
    default: String,
    databases: FxHashMap<String, Arc<DatabaseManager>>,
}

impl DatabaseSet {
    /// Open every configured connection. With no connections configured, the
    /// default database is an in-memory one.
    pub fn open(config: &DatabaseConfig) -> Result<Self, ExecError> {
        let mut databases = FxHashMap::default();
        for (name, conn) in &config.connections {
            databases.insert(name.clone(), Arc::new(DatabaseManager::open(name, conn)?));
        }
        if databases.is_empty() {
            databases.insert(
                config.default.clone(),
                Arc::new(DatabaseManager::open_in_memory(&config.default)?),
            );
        }
        Ok(Self {
            default: config.default.clone(),
            databases,
        })
    }

    /// Set holding a single database, which is also the default.
    pub fn single(db: DatabaseManager) -> Self {
        let default = db.name().to_string();
        let mut databases = FxHashMap::default();
        databases.insert(default.clone(), Arc::new(db));
        Self { default, databases }
    }

    pub fn default_name(&self) -> &str {
        &self.default
    }

    pub fn get(&self, name: &str) -> Result<Arc<DatabaseManager>, ExecError> {
        self.databases
            .get(name)
            .cloned()
            .ok_or_else(|| ExecError::UnknownDatabase {
                database: name.to_string(),
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.databases.keys().map(String::as_str)
    }
}
