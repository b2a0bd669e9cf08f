//! Top-level configuration document.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::sections::{CacheConfig, DatabaseConfig, IdGenConfig, LoggingConfig, RegistryConfig};
use crate::constants::MAX_WORKER_ID;
use crate::errors::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSqlConfig {
    pub registry: RegistryConfig,
    pub cache: CacheConfig,
    pub idgen: IdGenConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

impl ModelSqlConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0..=MAX_WORKER_ID).contains(&self.idgen.worker_id) {
            return Err(invalid(
                "idgen.worker_id",
                format!("must be within 0..={MAX_WORKER_ID}"),
            ));
        }
        if self.idgen.epoch_ms < 0 {
            return Err(invalid("idgen.epoch_ms", "must not be negative"));
        }
        if !self.registry.extension.starts_with('.') || self.registry.extension.len() < 2 {
            return Err(invalid(
                "registry.extension",
                "must start with '.' followed by at least one character",
            ));
        }
        if self.registry.watch && self.registry.roots.is_empty() {
            return Err(invalid("registry.watch", "watching requires at least one root"));
        }
        if self.registry.watch_interval_ms == 0 {
            return Err(invalid("registry.watch_interval_ms", "must be positive"));
        }
        if self.cache.default_minutes < -4 {
            return Err(invalid(
                "cache.default_minutes",
                "must be minutes or one of -1, -2, -3, -4",
            ));
        }
        if !self.database.connections.is_empty()
            && !self.database.connections.contains_key(&self.database.default)
        {
            return Err(invalid(
                "database.default",
                format!("'{}' is not a configured connection", self.database.default),
            ));
        }
        Ok(())
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = ModelSqlConfig::from_toml("").unwrap();
        assert_eq!(config.registry.extension, ".msql");
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.default_minutes, 30);
        assert_eq!(config.database.default, "main");
    }

    #[test]
    fn test_parses_full_document() {
        let config = ModelSqlConfig::from_toml(
            r#"
            [registry]
            extension = ".xml"
            watch = true
            watch_interval_ms = 250
            [registry.roots]
            biz = "models/biz"

            [cache]
            enabled = true
            default_minutes = -3

            [idgen]
            worker_id = 7

            [database]
            default = "orders"
            [database.connections.orders]
            path = "data/orders.db"
            readers = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.registry.roots["biz"].to_str(), Some("models/biz"));
        assert_eq!(config.idgen.worker_id, 7);
        assert_eq!(config.database.connections["orders"].readers, 2);
        assert_eq!(config.database.connections["orders"].busy_timeout_ms, 5000);
    }

    #[test]
    fn test_rejects_out_of_range_worker() {
        let err = ModelSqlConfig::from_toml("[idgen]\nworker_id = 64").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "idgen.worker_id"));
    }

    #[test]
    fn test_rejects_watch_without_roots() {
        let err = ModelSqlConfig::from_toml("[registry]\nwatch = true").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "registry.watch"));
    }

    #[test]
    fn test_rejects_unknown_default_database() {
        let err = ModelSqlConfig::from_toml(
            "[database]\ndefault = \"x\"\n[database.connections.main]\npath = \":memory:\"",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "database.default"));
    }

    #[test]
    fn test_load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("modelsql.toml");
        std::fs::write(&path, "[cache]\nenabled = true").unwrap();
        assert!(ModelSqlConfig::load(&path).unwrap().cache.enabled);
        assert!(matches!(
            ModelSqlConfig::load(&dir.path().join("missing.toml")),
            Err(ConfigError::Read { .. })
        ));
    }
}
