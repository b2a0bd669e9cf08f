//! The model registry.
//!
//! Readers clone an `Arc` of the current [`Snapshot`] under a read lock and
//! work on it without further locking. Writers build a modified copy and
//! swap it in; a writer mutex keeps concurrent refreshes from losing each
//! other's changes.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use modelsql_core::config::{CacheConfig, DatabaseConfig, ModelSqlConfig, RegistryConfig};
use modelsql_core::errors::{DefinitionError, EngineError};
use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::cache::ParseCache;
use crate::definition::{CommandGroup, Model};
use crate::events::RegistryEventHandler;
use crate::parser::parse_document;
use crate::scanner::{discover, normalize};

/// A command group together with the model that owns it.
#[derive(Debug, Clone)]
pub struct ResolvedGroup {
    pub model: Arc<Model>,
    pub group: Arc<CommandGroup>,
}

impl ResolvedGroup {
    pub fn model_key(&self) -> &str {
        &self.model.key
    }

    pub fn database(&self) -> &str {
        &self.model.database
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    pub models: usize,
    pub groups: usize,
    pub parse_cache_entries: u64,
}

/// One published generation of loaded models.
#[derive(Debug, Clone, Default)]
struct Snapshot {
    models: FxHashMap<String, Arc<Model>>,
    by_path: FxHashMap<PathBuf, String>,
}

impl Snapshot {
    fn insert(&mut self, model: Arc<Model>) {
        if let Some(previous) = self.models.get(&model.key) {
            if previous.path != model.path {
                tracing::warn!(
                    model = %model.key,
                    kept = %model.path.display(),
                    dropped = %previous.path.display(),
                    "two documents map to the same model id"
                );
                self.by_path.remove(&previous.path);
            }
        }
        self.by_path.insert(model.path.clone(), model.key.clone());
        self.models.insert(model.key.clone(), model);
    }
}

pub struct ModelRegistry {
    config: RegistryConfig,
    cache_defaults: CacheConfig,
    databases: DatabaseConfig,
    /// (alias, normalized directory), most specific directory first.
    roots: Vec<(String, PathBuf)>,
    snapshot: RwLock<Arc<Snapshot>>,
    writer: Mutex<()>,
    parse_cache: ParseCache,
    handlers: RwLock<Vec<Arc<dyn RegistryEventHandler>>>,
}

impl ModelRegistry {
    /// An empty registry; call [`load`](Self::load) to read the roots.
    pub fn new(config: &ModelSqlConfig) -> Self {
        let mut roots: Vec<(String, PathBuf)> = config
            .registry
            .roots
            .iter()
            .map(|(alias, dir)| (alias.clone(), normalize(dir)))
            .collect();
        roots.sort_by_key(|(_, dir)| std::cmp::Reverse(dir.components().count()));

        Self {
            config: config.registry.clone(),
            cache_defaults: config.cache.clone(),
            databases: config.database.clone(),
            roots,
            snapshot: RwLock::new(Arc::new(Snapshot::default())),
            writer: Mutex::new(()),
            parse_cache: ParseCache::default(),
            handlers: RwLock::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn add_handler(&self, handler: Arc<dyn RegistryEventHandler>) {
        self.handlers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(handler);
    }

    /// Read every document under the roots and publish them as a fresh
    /// generation. Invalid documents are logged and skipped. Returns the
    /// number of models loaded.
    pub fn load(&self) -> usize {
        let _writer = self.lock_writer();

        let files: Vec<PathBuf> = self
            .roots
            .iter()
            .flat_map(|(_, dir)| discover(dir, &self.config.extension))
            .map(|file| file.path)
            .collect();

        let parsed: Vec<(PathBuf, Result<Arc<Model>, DefinitionError>)> = files
            .into_par_iter()
            .map(|path| {
                let model = self.parse_file(&path);
                (path, model)
            })
            .collect();

        let mut snapshot = Snapshot::default();
        let mut skipped = 0usize;
        for (path, result) in parsed {
            match result {
                Ok(model) => snapshot.insert(model),
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(path = %path.display(), error = %e, "skipping definition document");
                }
            }
        }

        let loaded = snapshot.models.len();
        self.publish(snapshot);
        tracing::info!(models = loaded, skipped, "model definitions loaded");
        loaded
    }

    /// Discard everything and load again.
    pub fn reload_all(&self) -> usize {
        tracing::info!("reloading all model definitions");
        let loaded = self.load();
        self.notify(|h| h.on_reloaded());
        loaded
    }

    /// Re-parse one document and republish only its model. On failure the
    /// previous version of the model, if any, stays loaded.
    pub fn refresh(&self, path: &Path) -> Result<String, DefinitionError> {
        let path = normalize(path);
        let model = {
            let _writer = self.lock_writer();
            let model = self.parse_file(&path).inspect_err(|e| {
                tracing::warn!(path = %path.display(), error = %e, "refresh failed, keeping previous model");
            })?;
            let mut snapshot = (*self.current()).clone();
            snapshot.insert(Arc::clone(&model));
            self.publish(snapshot);
            model
        };
        tracing::info!(model = %model.key, path = %path.display(), "model refreshed");
        self.notify(|h| h.on_model_updated(&model.key));
        Ok(model.key.clone())
    }

    /// Drop the model loaded from `path`. Returns its id if one was loaded.
    pub fn remove(&self, path: &Path) -> Option<String> {
        let path = normalize(path);
        let key = {
            let _writer = self.lock_writer();
            let mut snapshot = (*self.current()).clone();
            let key = snapshot.by_path.remove(&path)?;
            snapshot.models.remove(&key);
            self.publish(snapshot);
            key
        };
        tracing::info!(model = %key, path = %path.display(), "model removed");
        self.notify(|h| h.on_model_removed(&key));
        Some(key)
    }

    /// Refresh a model given its file path without extension, e.g. `models/biz/demo`.
    pub fn reload_model(&self, id_path: &str) -> Result<String, DefinitionError> {
        let path = PathBuf::from(format!("{id_path}{}", self.config.extension));
        self.refresh(&path)
    }

    pub fn find(&self, model: &str, command: &str) -> Result<ResolvedGroup, EngineError> {
        let loaded = self.model(model).ok_or_else(|| EngineError::ModelNotFound {
            model: model.to_string(),
        })?;
        let group = loaded
            .group(command)
            .cloned()
            .ok_or_else(|| EngineError::CommandNotFound {
                model: model.to_string(),
                command: command.to_string(),
            })?;
        Ok(ResolvedGroup {
            model: loaded,
            group,
        })
    }

    pub fn model(&self, key: &str) -> Option<Arc<Model>> {
        self.current().models.get(key).cloned()
    }

    /// Loaded model ids, sorted.
    pub fn model_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.current().models.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn stats(&self) -> RegistryStats {
        let snapshot = self.current();
        RegistryStats {
            models: snapshot.models.len(),
            groups: snapshot.models.values().map(|m| m.document.groups.len()).sum(),
            parse_cache_entries: self.parse_cache.entry_count(),
        }
    }

    /// Registry id of a definition file: the root directory replaced by its
    /// alias, the extension dropped, `/` separated. `None` outside every root.
    pub fn model_key(&self, path: &Path) -> Option<String> {
        let path = normalize(path);
        let (alias, relative) = self
            .roots
            .iter()
            .find_map(|(alias, dir)| path.strip_prefix(dir).ok().map(|rel| (alias, rel)))?;
        let joined = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let stem = joined.strip_suffix(self.config.extension.as_str())?;
        if stem.is_empty() {
            return None;
        }
        Some(format!("{alias}/{stem}"))
    }

    fn parse_file(&self, path: &Path) -> Result<Arc<Model>, DefinitionError> {
        let key = self.model_key(path).ok_or_else(|| DefinitionError::Malformed {
            path: path.display().to_string(),
            message: "not a definition file under any configured root".to_string(),
        })?;
        let content = std::fs::read_to_string(path).map_err(|e| DefinitionError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let hash = ParseCache::content_hash(&content);
        let document = match self.parse_cache.get(hash) {
            Some(document) => document,
            None => {
                let document = Arc::new(parse_document(path, &content, &self.cache_defaults)?);
                self.parse_cache.insert(hash, Arc::clone(&document));
                document
            }
        };

        let database = self.databases.resolve(document.database.as_deref()).to_string();
        if let Some(requested) = document.database.as_deref() {
            if requested != database {
                tracing::warn!(
                    model = %key,
                    requested,
                    using = %database,
                    "unknown database, using default"
                );
            }
        }

        tracing::debug!(model = %key, groups = document.groups.len(), "parsed definition");
        Ok(Arc::new(Model {
            key,
            path: path.to_path_buf(),
            database,
            document,
        }))
    }

    fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot.read().unwrap_or_else(|e| e.into_inner()))
    }

    fn publish(&self, snapshot: Snapshot) {
        *self.snapshot.write().unwrap_or_else(|e| e.into_inner()) = Arc::new(snapshot);
    }

    fn lock_writer(&self) -> std::sync::MutexGuard<'_, ()> {
        self.writer.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn notify(&self, event: impl Fn(&dyn RegistryEventHandler)) {
        let handlers = self
            .handlers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        for handler in &handlers {
            event(handler.as_ref());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const DOC: &str = r#"<model id="demo"><sql id="list" type="select"><cmd>SELECT 1</cmd></sql></model>"#;

    fn registry_for(dir: &Path) -> ModelRegistry {
        let mut config = ModelSqlConfig::default();
        config.registry.roots.insert("biz".into(), dir.to_path_buf());
        ModelRegistry::new(&config)
    }

    #[test]
    fn test_model_key_replaces_root_and_extension() {
        let mut config = ModelSqlConfig::default();
        config.registry.roots.insert("biz".into(), PathBuf::from("./models/biz"));
        config.registry.roots.insert("deep".into(), PathBuf::from("models/biz/deep"));
        let registry = ModelRegistry::new(&config);

        assert_eq!(
            registry.model_key(Path::new("models/biz/sales/order.msql")).as_deref(),
            Some("biz/sales/order")
        );
        assert_eq!(
            registry.model_key(Path::new("models/biz/deep/x.msql")).as_deref(),
            Some("deep/x")
        );
        assert_eq!(registry.model_key(Path::new("other/x.msql")), None);
        assert_eq!(registry.model_key(Path::new("models/biz/x.xml")), None);
    }

    #[test]
    fn test_load_skips_invalid_documents() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("demo.msql"), DOC).unwrap();
        fs::write(dir.path().join("broken.msql"), "<model id=").unwrap();
        let registry = registry_for(dir.path());

        assert_eq!(registry.load(), 1);
        assert!(registry.find("biz/demo", "list").is_ok());
        assert!(matches!(
            registry.find("biz/broken", "list"),
            Err(EngineError::ModelNotFound { .. })
        ));
        assert!(matches!(
            registry.find("biz/demo", "nope"),
            Err(EngineError::CommandNotFound { .. })
        ));
        assert_eq!(
            registry.stats(),
            RegistryStats {
                models: 1,
                groups: 1,
                parse_cache_entries: 1
            }
        );
    }

    #[test]
    fn test_refresh_remove_and_notifications() {
        #[derive(Default)]
        struct Counter {
            updated: AtomicUsize,
            removed: AtomicUsize,
        }
        impl RegistryEventHandler for Counter {
            fn on_model_updated(&self, _model: &str) {
                self.updated.fetch_add(1, Ordering::SeqCst);
            }
            fn on_model_removed(&self, _model: &str) {
                self.removed.fetch_add(1, Ordering::SeqCst);
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let registry = registry_for(dir.path());
        let counter = Arc::new(Counter::default());
        registry.add_handler(counter.clone());
        registry.load();

        let path = dir.path().join("new.msql");
        fs::write(&path, DOC).unwrap();
        assert_eq!(registry.refresh(&path).unwrap(), "biz/new");
        assert!(registry.find("biz/new", "list").is_ok());

        fs::write(&path, "<model").unwrap();
        assert!(registry.refresh(&path).is_err());
        assert!(registry.find("biz/new", "list").is_ok(), "previous version kept");

        assert_eq!(registry.remove(&path).as_deref(), Some("biz/new"));
        assert!(registry.model("biz/new").is_none());
        assert_eq!(registry.remove(&path), None);

        assert_eq!(counter.updated.load(Ordering::SeqCst), 1);
        assert_eq!(counter.removed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reload_all_drops_deleted_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.msql");
        fs::write(&path, DOC).unwrap();
        let registry = registry_for(dir.path());
        registry.load();
        assert_eq!(registry.model_keys(), ["biz/demo"]);

        fs::remove_file(&path).unwrap();
        assert_eq!(registry.reload_all(), 0);
        assert!(registry.model_keys().is_empty());
    }

    #[test]
    fn test_reload_model_appends_extension() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_for(dir.path());
        fs::write(dir.path().join("demo.msql"), DOC).unwrap();
        let id_path = dir.path().join("demo");
        assert_eq!(
            registry.reload_model(id_path.to_str().unwrap()).unwrap(),
            "biz/demo"
        );
    }

    #[test]
    fn test_unknown_database_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("demo.msql"),
            r#"<model id="demo" database="nowhere"><sql id="q" type="select"><cmd>SELECT 1</cmd></sql></model>"#,
        )
        .unwrap();
        let registry = registry_for(dir.path());
        registry.load();
        assert_eq!(registry.find("biz/demo", "q").unwrap().database(), "main");
    }
}
