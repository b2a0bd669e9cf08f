//! The engine facade: resolves `model/command`, checks the group type
//! against the requested operation, executes, and serves cached JSON.

use std::sync::{Arc, Mutex};

use modelsql_core::errors::{EngineError, ExecError};
use modelsql_core::types::{ParamMap, Record};
use modelsql_core::ModelSqlConfig;
use modelsql_params::defaults::DefaultSources;
use modelsql_params::IdGenerator;
use modelsql_registry::{
    GroupType, ModelRegistry, RegistryEventHandler, RegistryStats, ResolvedGroup, Watcher,
};
use modelsql_storage::{catch_panic, DatabaseSet};
use serde::Serialize;

use crate::cache::ResultCache;
use crate::executor::{
    BatchMultiOutcome, BatchOutcome, ExecOutcome, Executor, MultiResult, PagingResult, PinBatches,
};

const EMPTY_LIST: &[u8] = b"[]";
const EMPTY_PAGE: &[u8] = br#"{"total":0,"data":[]}"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineStats {
    pub registry: RegistryStats,
    pub cached_results: usize,
}

/// Drops cached results of models the registry replaces or removes.
struct CacheInvalidator {
    cache: Arc<ResultCache>,
}

impl RegistryEventHandler for CacheInvalidator {
    fn on_model_updated(&self, model: &str) {
        let dropped = self.cache.remove_model(model);
        tracing::debug!(model, dropped, "cached results invalidated");
    }

    fn on_model_removed(&self, model: &str) {
        self.cache.remove_model(model);
    }

    fn on_reloaded(&self) {
        self.cache.clear();
    }
}

pub struct Engine {
    registry: Arc<ModelRegistry>,
    databases: DatabaseSet,
    cache: Arc<ResultCache>,
    watcher: Mutex<Option<Watcher>>,
}

impl Engine {
    /// Build an engine from configuration: install the process id generator,
    /// open the databases, load every model and start the watcher if enabled.
    pub fn new(config: &ModelSqlConfig) -> Result<Self, EngineError> {
        config.validate()?;

        let generator = IdGenerator::new(config.idgen.worker_id, config.idgen.epoch_ms)?;
        if IdGenerator::install_global(generator).is_err() {
            tracing::warn!(
                worker_id = IdGenerator::global().worker_id(),
                "id generator already installed, keeping it"
            );
        }

        let databases = DatabaseSet::open(&config.database)?;
        Self::with_databases(config, databases)
    }

    /// Build an engine over already opened databases. The global id
    /// generator is left as is.
    pub fn with_databases(
        config: &ModelSqlConfig,
        databases: DatabaseSet,
    ) -> Result<Self, EngineError> {
        let registry = Arc::new(ModelRegistry::new(config));
        let cache = Arc::new(ResultCache::new());
        registry.add_handler(Arc::new(CacheInvalidator {
            cache: Arc::clone(&cache),
        }));
        registry.load();

        let watcher = if config.registry.watch {
            let watcher = Watcher::start(Arc::clone(&registry)).map_err(|e| EngineError::Watcher {
                message: e.to_string(),
            })?;
            Some(watcher)
        } else {
            None
        };

        Ok(Self {
            registry,
            databases,
            cache,
            watcher: Mutex::new(watcher),
        })
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub fn databases(&self) -> &DatabaseSet {
        &self.databases
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn select(
        &self,
        model: &str,
        command: &str,
        params: &ParamMap,
    ) -> Result<Vec<Record>, EngineError> {
        self.run(model, command, "select", &[GroupType::Select], |exec| {
            exec.select(params)
        })
    }

    pub fn nested_select(
        &self,
        model: &str,
        command: &str,
        params: &ParamMap,
    ) -> Result<Vec<Record>, EngineError> {
        self.run(model, command, "nestedselect", &[GroupType::NestedSelect], |exec| {
            exec.select(params)
        })
    }

    pub fn paging_select(
        &self,
        model: &str,
        command: &str,
        params: &ParamMap,
    ) -> Result<PagingResult, EngineError> {
        self.run(model, command, "pagingselect", &[GroupType::PagingSelect], |exec| {
            exec.paging_select(params)
        })
    }

    pub fn multi_select(
        &self,
        model: &str,
        command: &str,
        params: &ParamMap,
    ) -> Result<MultiResult, EngineError> {
        self.run(model, command, "multiselect", &[GroupType::MultiSelect], |exec| {
            exec.multi_select(params)
        })
    }

    pub fn exec(
        &self,
        model: &str,
        command: &str,
        params: &ParamMap,
    ) -> Result<ExecOutcome, EngineError> {
        self.run(model, command, "exec", &[GroupType::Exec], |exec| exec.exec(params))
    }

    pub fn batch_exec(
        &self,
        model: &str,
        command: &str,
        batch: &[ParamMap],
    ) -> Result<BatchOutcome, EngineError> {
        self.run(model, command, "batchexec", &[GroupType::BatchExec], |exec| {
            exec.batch_exec(batch)
        })
    }

    pub fn batch_multi_exec(
        &self,
        model: &str,
        command: &str,
        batches: &PinBatches,
    ) -> Result<BatchMultiOutcome, EngineError> {
        self.run(model, command, "batchmultiexec", &[GroupType::BatchMultiExec], |exec| {
            exec.batch_multi_exec(batches)
        })
    }

    /// Run a read group and return its JSON, from the result cache when the
    /// group is cached and the same caller parameters produced a live entry.
    ///
    /// The fingerprint is the canonical JSON of `params` as supplied, before
    /// defaults are filled. Empty results are answered with a fixed payload
    /// and never cached.
    pub fn query_json(
        &self,
        model: &str,
        command: &str,
        params: &ParamMap,
    ) -> Result<Arc<[u8]>, EngineError> {
        // Read before resolving: a reload that lands after this point
        // invalidates, and the result of the old definition is not stored.
        let generation = self.cache.generation();
        let target = self.registry.find(model, command)?;
        let group_type = target.group.group_type;
        if group_type.is_reserved() {
            return Err(unsupported(group_type));
        }
        if !group_type.is_read() {
            return Err(mismatch(&target, "read"));
        }

        let key = format!("{}/{}", target.model_key(), target.group.id);
        let fingerprint = if target.group.cached {
            match serde_json::to_string(params) {
                Ok(fingerprint) => Some(fingerprint),
                Err(e) => {
                    tracing::debug!(key = %key, error = %e, "parameters not fingerprintable");
                    None
                }
            }
        } else {
            None
        };

        if let Some(fingerprint) = &fingerprint {
            if let Some(payload) = self.cache.get(&key, fingerprint) {
                tracing::debug!(key = %key, "served from result cache");
                return Ok(payload);
            }
        }

        let payload = {
            let _span = tracing::info_span!("query_json", model, command).entered();
            let db = self.databases.get(target.database())?;
            let executor = Executor::new(&db, &target, DefaultSources::global());
            let read = catch_panic(|| read_json(&executor, group_type, params))?;
            match read? {
                Some(payload) => payload,
                None if group_type == GroupType::PagingSelect => return Ok(Arc::from(EMPTY_PAGE)),
                None => return Ok(Arc::from(EMPTY_LIST)),
            }
        };

        let payload: Arc<[u8]> = Arc::from(payload);
        if let Some(fingerprint) = &fingerprint {
            match self.cache.set_at(
                generation,
                &key,
                fingerprint,
                Arc::clone(&payload),
                target.group.cache_minutes,
            ) {
                Ok(true) => {}
                Ok(false) => tracing::debug!(key = %key, "result not cached"),
                Err(e) => tracing::warn!(key = %key, error = %e, "result not cached"),
            }
        }
        Ok(payload)
    }

    /// Rebuild the registry from disk. Drops every cached result.
    pub fn reload_all(&self) -> usize {
        self.registry.reload_all()
    }

    /// Refresh one model from `<id_path><extension>`, e.g. `models/biz/demo`.
    pub fn reload_model(&self, id_path: &str) -> Result<String, EngineError> {
        Ok(self.registry.reload_model(id_path)?)
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            registry: self.registry.stats(),
            cached_results: self.cache.len(),
        }
    }

    /// Stop the definition watcher, if running. Dropping the engine does the same.
    pub fn shutdown(&self) {
        let watcher = self
            .watcher
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(watcher) = watcher {
            watcher.shutdown();
        }
    }

    fn run<T>(
        &self,
        model: &str,
        command: &str,
        operation: &'static str,
        accepted: &[GroupType],
        body: impl FnOnce(&Executor<'_>) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let _span = tracing::info_span!("invoke", model, command, operation).entered();

        let target = self.registry.find(model, command)?;
        let group_type = target.group.group_type;
        if group_type.is_reserved() {
            return Err(unsupported(group_type));
        }
        if !accepted.contains(&group_type) {
            return Err(mismatch(&target, operation));
        }

        let db = self.databases.get(target.database())?;
        let executor = Executor::new(&db, &target, DefaultSources::global());
        let result = match catch_panic(|| body(&executor)) {
            Ok(result) => result,
            Err(panicked) => Err(panicked.into()),
        };
        result.inspect_err(|e| {
            tracing::debug!(error = %e, code = e.error_code(), "invocation failed");
        })
    }
}

fn unsupported(group_type: GroupType) -> EngineError {
    ExecError::Unsupported {
        group_type: group_type.name(),
    }
    .into()
}

fn mismatch(target: &ResolvedGroup, expected: &'static str) -> EngineError {
    ExecError::TypeMismatch {
        model: target.model_key().to_string(),
        command: target.group.id.clone(),
        expected,
        actual: target.group.group_type.name(),
    }
    .into()
}

/// Serialized result of a read group, `None` when it is empty.
fn read_json(
    executor: &Executor<'_>,
    group_type: GroupType,
    params: &ParamMap,
) -> Result<Option<Vec<u8>>, EngineError> {
    match group_type {
        GroupType::PagingSelect => {
            let page = executor.paging_select(params)?;
            if page.is_empty() {
                return Ok(None);
            }
            to_json(&page).map(Some)
        }
        GroupType::MultiSelect => {
            let sets = executor.multi_select(params)?;
            if sets.values().all(Vec::is_empty) {
                return Ok(None);
            }
            to_json(&sets).map(Some)
        }
        _ => {
            let records = executor.select(params)?;
            if records.is_empty() {
                return Ok(None);
            }
            to_json(&records).map(Some)
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Vec<u8>, EngineError> {
    serde_json::to_vec(value).map_err(|e| {
        ExecError::Serialize {
            message: e.to_string(),
        }
        .into()
    })
}
