//! Parse cache: Moka in-memory, keyed by content hash. The same document
//! text always parses to the same [`Document`].

use std::sync::Arc;

use moka::sync::Cache;
use xxhash_rust::xxh3::xxh3_64;

use crate::definition::Document;

pub struct ParseCache {
    inner: Cache<u64, Arc<Document>>,
}

impl ParseCache {
    pub fn new(capacity: u64) -> Self {
        Self {
            inner: Cache::new(capacity),
        }
    }

    pub fn content_hash(content: &str) -> u64 {
        xxh3_64(content.as_bytes())
    }

    pub fn get(&self, content_hash: u64) -> Option<Arc<Document>> {
        self.inner.get(&content_hash)
    }

    pub fn insert(&self, content_hash: u64, document: Arc<Document>) {
        self.inner.insert(content_hash, document);
    }

    pub fn entry_count(&self) -> u64 {
        self.inner.run_pending_tasks();
        self.inner.entry_count()
    }

    pub fn clear(&self) {
        self.inner.invalidate_all();
    }
}

impl Default for ParseCache {
    fn default() -> Self {
        Self::new(4_096)
    }
}
