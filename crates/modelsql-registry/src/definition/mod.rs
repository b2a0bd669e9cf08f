//! Parsed definitions. Immutable once built; a reload replaces them whole.

mod group;
mod placeholders;

use std::path::PathBuf;
use std::sync::Arc;

use rustc_hash::FxHashMap;

pub use group::{Command, CommandGroup, GroupType};
pub use placeholders::extract_placeholders;

/// Contents of one definition document, independent of where it was found.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// The document's own `id` attribute.
    pub id: String,
    /// The `database` attribute as written; `None` when absent or blank.
    pub database: Option<String>,
    pub groups: FxHashMap<String, Arc<CommandGroup>>,
}

/// A loaded model: a document bound to its registry key and database.
#[derive(Debug, Clone)]
pub struct Model {
    /// `<root alias>/<relative path without extension>`.
    pub key: String,
    pub path: PathBuf,
    /// Resolved database name.
    pub database: String,
    pub document: Arc<Document>,
}

impl Model {
    pub fn group(&self, id: &str) -> Option<&Arc<CommandGroup>> {
        self.document.groups.get(id)
    }
}
