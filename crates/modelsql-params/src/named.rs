//! Name → constant-or-function table feeding custom parameter defaults.
//!
//! A process-wide table is available through [`NamedValues::global`] and
//! [`register_named_value`]; `nowtime` is registered on first use.

use std::fmt;
use std::sync::{Arc, LazyLock, RwLock};

use modelsql_core::errors::ParamError;
use regex::Regex;
use rustc_hash::FxHashMap;
use serde_json::Value as JsonValue;

static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_]+$").unwrap_or_else(|e| panic!("invalid name pattern: {e}"))
});

static GLOBAL: LazyLock<NamedValues> = LazyLock::new(NamedValues::with_builtins);

/// Function body of a [`NamedValue::Function`].
pub type NamedFn = Arc<dyn Fn(&[JsonValue]) -> Vec<JsonValue> + Send + Sync>;

/// A registered default source.
#[derive(Clone)]
pub enum NamedValue {
    /// Constant returned as is. Takes no arguments.
    Value(JsonValue),
    /// Callable with a fixed number of arguments; must return exactly one value.
    Function { arity: usize, func: NamedFn },
}

impl NamedValue {
    pub fn function<F>(arity: usize, func: F) -> Self
    where
        F: Fn(&[JsonValue]) -> Vec<JsonValue> + Send + Sync + 'static,
    {
        Self::Function {
            arity,
            func: Arc::new(func),
        }
    }

    fn arity(&self) -> usize {
        match self {
            Self::Value(_) => 0,
            Self::Function { arity, .. } => *arity,
        }
    }
}

impl fmt::Debug for NamedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Function { arity, .. } => f.debug_struct("Function").field("arity", arity).finish(),
        }
    }
}

/// Returns true when `name` may be registered.
pub fn is_valid_name(name: &str) -> bool {
    NAME_PATTERN.is_match(name)
}

/// Register into the process-wide table, replacing any previous entry.
pub fn register_named_value(name: &str, value: NamedValue) -> Result<(), ParamError> {
    NamedValues::global().register(name, value)
}

#[derive(Default)]
pub struct NamedValues {
    entries: RwLock<FxHashMap<String, NamedValue>>,
}

impl NamedValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the built-in entries (`nowtime`).
    pub fn with_builtins() -> Self {
        let table = Self::new();
        table.insert(
            "nowtime".to_string(),
            NamedValue::function(0, |_| {
                vec![JsonValue::String(
                    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
                )]
            }),
        );
        table
    }

    pub fn global() -> &'static NamedValues {
        &GLOBAL
    }

    pub fn register(&self, name: &str, value: NamedValue) -> Result<(), ParamError> {
        if !is_valid_name(name) {
            return Err(ParamError::InvalidName {
                name: name.to_string(),
            });
        }
        tracing::debug!(name, "registered named value");
        self.insert(name.to_string(), value);
        Ok(())
    }

    pub fn unregister(&self, name: &str) -> bool {
        self.write().remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// Produce the value of `name` for the default of `parameter`.
    ///
    /// The entry is cloned out of the table before a function is called, so
    /// functions may themselves consult or modify the table.
    pub fn resolve(
        &self,
        parameter: &str,
        name: &str,
        args: &[String],
    ) -> Result<JsonValue, ParamError> {
        let entry = self
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ParamError::UnknownNamedValue {
                parameter: parameter.to_string(),
                name: name.to_string(),
            })?;

        if entry.arity() != args.len() {
            return Err(ParamError::ArityMismatch {
                parameter: parameter.to_string(),
                name: name.to_string(),
                expected: entry.arity(),
                supplied: args.len(),
            });
        }

        match entry {
            NamedValue::Value(value) => Ok(value),
            NamedValue::Function { func, .. } => {
                let args: Vec<JsonValue> = args.iter().cloned().map(JsonValue::String).collect();
                let mut returned = func(&args);
                if returned.len() != 1 {
                    return Err(ParamError::ReturnCount {
                        parameter: parameter.to_string(),
                        name: name.to_string(),
                        returned: returned.len(),
                    });
                }
                Ok(returned.remove(0))
            }
        }
    }

    fn insert(&self, name: String, value: NamedValue) {
        self.write().insert(name, value);
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, FxHashMap<String, NamedValue>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, FxHashMap<String, NamedValue>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }
}
