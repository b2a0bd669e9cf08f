//! Individual configuration sections.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_EPOCH_MS, DEFAULT_EXTENSION};

/// Where definition documents live and how they are watched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Root alias → directory. The alias replaces the directory prefix in model ids.
    pub roots: BTreeMap<String, PathBuf>,
    /// Definition file extension, including the leading dot.
    pub extension: String,
    /// Start the background watcher after the initial load.
    pub watch: bool,
    /// Polling interval of the watcher.
    pub watch_interval_ms: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            roots: BTreeMap::new(),
            extension: DEFAULT_EXTENSION.to_string(),
            watch: false,
            watch_interval_ms: 1000,
        }
    }
}

/// Global result cache switches, baked into cacheable groups at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Groups marked `cached="true"` are only cached when this is set.
    pub enabled: bool,
    /// Duration code used by cached groups that leave `cachetime` unset.
    /// Minutes when non-negative; -1 forever, -2 month, -3 week, -4 day.
    pub default_minutes: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            default_minutes: 30,
        }
    }
}

/// Node identity of the unique id generator. Fixed for the process lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdGenConfig {
    pub worker_id: i64,
    pub epoch_ms: i64,
}

impl Default for IdGenConfig {
    fn default() -> Self {
        Self {
            worker_id: 0,
            epoch_ms: DEFAULT_EPOCH_MS,
        }
    }
}

/// Named SQLite databases referenced by definition documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database used by documents that name none, or an unknown one.
    pub default: String,
    pub connections: BTreeMap<String, ConnectionConfig>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            default: "main".to_string(),
            connections: BTreeMap::new(),
        }
    }
}

impl DatabaseConfig {
    /// Database used for a model's `database` attribute. Empty or unknown
    /// names fall back to the default; with no connections configured every
    /// name does.
    pub fn resolve<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        match requested {
            Some(name) if !name.is_empty() && self.connections.contains_key(name) => name,
            _ => &self.default,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Database file, or `:memory:`.
    pub path: PathBuf,
    /// Size of the read connection pool. Ignored for in-memory databases.
    pub readers: usize,
    pub busy_timeout_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(":memory:"),
            readers: 4,
            busy_timeout_ms: 5000,
        }
    }
}

impl ConnectionConfig {
    pub fn is_memory(&self) -> bool {
        self.path.as_os_str() == ":memory:"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `modelsql_registry=debug,warn`.
    pub level: String,
    /// Emit JSON lines instead of the compact format.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_resolution_falls_back_to_default() {
        let mut config = DatabaseConfig {
            default: "a".into(),
            ..DatabaseConfig::default()
        };
        config.connections.insert("a".into(), ConnectionConfig::default());
        config.connections.insert("b".into(), ConnectionConfig::default());

        assert_eq!(config.resolve(Some("b")), "b");
        assert_eq!(config.resolve(Some("zzz")), "a");
        assert_eq!(config.resolve(Some("")), "a");
        assert_eq!(config.resolve(None), "a");
    }

    #[test]
    fn test_memory_path_detection() {
        assert!(ConnectionConfig::default().is_memory());
        let file = ConnectionConfig {
            path: PathBuf::from("data/main.db"),
            ..ConnectionConfig::default()
        };
        assert!(!file.is_memory());
    }
}
