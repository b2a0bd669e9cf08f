//! Serialized query results keyed by `"<model>/<command>"`.
//!
//! Each key holds at most one entry, tagged with the fingerprint of the
//! caller parameters that produced it. A different fingerprint never reads
//! or replaces a live entry; only the first parameter set seen for a key is
//! cached until it expires or is removed.
//!
//! Every invalidation (`remove_model`, `clear`) advances a generation
//! counter. A result computed before an invalidation is stored with
//! [`ResultCache::set_at`] against the generation read before it was
//! computed, and is discarded if that generation has moved on.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use modelsql_core::errors::CacheError;
use rustc_hash::FxHashMap;

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Expiry for a cache duration code: `-1` one year, `-2` thirty days,
/// `-3` seven days, `-4` one day, `n >= 0` minutes.
pub fn duration_of(code: i64) -> Result<Duration, CacheError> {
    match code {
        -1 => Ok(DAY * 365),
        -2 => Ok(DAY * 30),
        -3 => Ok(DAY * 7),
        -4 => Ok(DAY),
        n if n >= 0 => Ok(Duration::from_secs((n as u64).saturating_mul(60))),
        _ => Err(CacheError::UnsupportedDuration { code }),
    }
}

struct Entry {
    fingerprint: String,
    payload: Arc<[u8]>,
    expires: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires > now
    }
}

#[derive(Default)]
pub struct ResultCache {
    entries: RwLock<FxHashMap<String, Entry>>,
    generation: AtomicU64,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The payload stored under `key`, if it is live and was produced by
    /// the same `fingerprint`. An expired entry is dropped.
    pub fn get(&self, key: &str, fingerprint: &str) -> Option<Arc<[u8]>> {
        let now = Instant::now();
        {
            let entries = self.read();
            match entries.get(key) {
                None => return None,
                Some(entry) if entry.is_live(now) => {
                    return (entry.fingerprint == fingerprint).then(|| Arc::clone(&entry.payload));
                }
                Some(_) => {}
            }
        }

        let mut entries = self.write();
        if entries.get(key).is_some_and(|e| !e.is_live(now)) {
            entries.remove(key);
            tracing::debug!(key, "expired cache entry dropped");
        }
        None
    }

    /// Store `payload` under `key` for `duration_code`. Returns `false`
    /// without storing when a live entry with another fingerprint exists.
    pub fn set(
        &self,
        key: &str,
        fingerprint: &str,
        payload: impl Into<Arc<[u8]>>,
        duration_code: i64,
    ) -> Result<bool, CacheError> {
        self.insert(None, key, fingerprint, payload.into(), duration_code)
    }

    /// Current invalidation generation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Like [`ResultCache::set`], but stores nothing and returns `false` when
    /// an invalidation happened since `generation` was read.
    pub fn set_at(
        &self,
        generation: u64,
        key: &str,
        fingerprint: &str,
        payload: impl Into<Arc<[u8]>>,
        duration_code: i64,
    ) -> Result<bool, CacheError> {
        self.insert(Some(generation), key, fingerprint, payload.into(), duration_code)
    }

    fn insert(
        &self,
        generation: Option<u64>,
        key: &str,
        fingerprint: &str,
        payload: Arc<[u8]>,
        duration_code: i64,
    ) -> Result<bool, CacheError> {
        let now = Instant::now();
        let expires = now
            .checked_add(duration_of(duration_code)?)
            .ok_or(CacheError::UnsupportedDuration {
                code: duration_code,
            })?;

        let mut entries = self.write();
        // Invalidations bump the counter under this same lock.
        if generation.is_some_and(|g| g != self.generation()) {
            tracing::debug!(key, "result computed before an invalidation, not cached");
            return Ok(false);
        }
        if let Some(existing) = entries.get(key) {
            if existing.is_live(now) && existing.fingerprint != fingerprint {
                return Ok(false);
            }
        }
        entries.insert(
            key.to_string(),
            Entry {
                fingerprint: fingerprint.to_string(),
                payload,
                expires,
            },
        );
        tracing::debug!(key, duration_code, "result cached");
        Ok(true)
    }

    pub fn remove(&self, key: &str) -> bool {
        self.write().remove(key).is_some()
    }

    /// Drop every entry of `model`. Returns how many were dropped.
    ///
    /// Model ids contain `/` themselves, so only keys whose remainder after
    /// `"<model>/"` is a bare command id belong to the model.
    pub fn remove_model(&self, model: &str) -> usize {
        let prefix = format!("{model}/");
        let mut entries = self.write();
        self.generation.fetch_add(1, Ordering::AcqRel);
        let before = entries.len();
        entries.retain(|key, _| {
            !key.strip_prefix(prefix.as_str())
                .is_some_and(|command| !command.contains('/'))
        });
        before - entries.len()
    }

    pub fn clear(&self) {
        let mut entries = self.write();
        self.generation.fetch_add(1, Ordering::AcqRel);
        entries.clear();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, FxHashMap<String, Entry>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, FxHashMap<String, Entry>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }
}
