//! Registry change notifications.

/// Observer of registry changes. All methods default to no-ops.
///
/// Handlers run on the thread that changed the registry (a caller, or the
/// watcher's consumer thread) after the new snapshot is published.
pub trait RegistryEventHandler: Send + Sync {
    /// A model was added or replaced.
    fn on_model_updated(&self, _model: &str) {}

    /// A model was dropped.
    fn on_model_removed(&self, _model: &str) {}

    /// The whole snapshot was rebuilt.
    fn on_reloaded(&self) {}
}
