//! Root polling and snapshot diffing.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use rustc_hash::{FxHashMap, FxHashSet};

use super::WatchEvent;
use crate::cache::ParseCache;
use crate::registry::ModelRegistry;
use crate::scanner::discover;

/// Files modified this recently may still be rewritten within the same
/// mtime tick, so their content is hashed too. Two seconds covers the
/// coarsest common granularity (FAT).
const MTIME_TIE_WINDOW: Duration = Duration::from_secs(2);

/// Size, modification time and, for recently touched files, content hash
/// of a definition file.
#[derive(Debug, Clone, Copy)]
pub struct FileState {
    pub len: u64,
    pub mtime: SystemTime,
    pub hash: Option<u64>,
}

impl FileState {
    /// Same size and mtime, and the same content when both sides hashed it.
    fn same_as(&self, other: &FileState) -> bool {
        self.len == other.len
            && self.mtime == other.mtime
            && match (self.hash, other.hash) {
                (Some(a), Some(b)) => a == b,
                _ => true,
            }
    }
}

pub(super) struct Roots {
    dirs: Vec<PathBuf>,
    extension: String,
}

impl Roots {
    pub(super) fn of(registry: &ModelRegistry) -> Self {
        Self {
            dirs: registry.config().roots.values().cloned().collect(),
            extension: registry.config().extension.clone(),
        }
    }

    /// Current state of every definition file. `known` is the previous scan.
    fn scan(&self, known: &FxHashMap<PathBuf, FileState>) -> FxHashMap<PathBuf, FileState> {
        let now = SystemTime::now();
        self.dirs
            .iter()
            .flat_map(|dir| discover(dir, &self.extension))
            .map(|f| {
                let recent = now
                    .duration_since(f.mtime)
                    .map_or(true, |age| age < MTIME_TIE_WINDOW);
                let previous = known
                    .get(&f.path)
                    .filter(|s| s.len == f.len && s.mtime == f.mtime)
                    .and_then(|s| s.hash);
                let hash = if recent || previous.is_some() {
                    content_hash(&f.path)
                } else {
                    None
                };
                // Once out of the window an unchanged hash is dropped; no
                // later write can keep this mtime.
                let hash = match (recent, previous, hash) {
                    (false, Some(before), Some(after)) if before == after => None,
                    _ => hash,
                };
                let state = FileState {
                    len: f.len,
                    mtime: f.mtime,
                    hash,
                };
                (f.path, state)
            })
            .collect()
    }
}

fn content_hash(path: &Path) -> Option<u64> {
    fs::read_to_string(path)
        .ok()
        .map(|content| ParseCache::content_hash(&content))
}

pub(super) fn scan(registry: &ModelRegistry) -> FxHashMap<PathBuf, FileState> {
    Roots::of(registry).scan(&FxHashMap::default())
}

pub(super) fn poll_loop(
    roots: Roots,
    mut known: FxHashMap<PathBuf, FileState>,
    interval: Duration,
    stop: Receiver<()>,
    events: Sender<WatchEvent>,
) {
    loop {
        match stop.recv_timeout(interval) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }

        let current = roots.scan(&known);
        for event in diff(&known, &current) {
            if events.send(event).is_err() {
                tracing::error!("watch event consumer is gone, stopping poller");
                return;
            }
        }
        known = current;
    }
}

/// Events turning `old` into `new`, sorted by path.
///
/// A removed and a created file with identical size and modification time
/// (and content hash, when both were hashed) are reported as one rename.
pub fn diff(
    old: &FxHashMap<PathBuf, FileState>,
    new: &FxHashMap<PathBuf, FileState>,
) -> Vec<WatchEvent> {
    let mut removed: Vec<&PathBuf> = old.keys().filter(|p| !new.contains_key(*p)).collect();
    let mut created: Vec<&PathBuf> = new.keys().filter(|p| !old.contains_key(*p)).collect();
    let mut changed: Vec<&PathBuf> = new
        .iter()
        .filter(|(p, state)| old.get(*p).is_some_and(|before| !before.same_as(state)))
        .map(|(p, _)| p)
        .collect();
    removed.sort();
    created.sort();
    changed.sort();

    let mut events = Vec::new();
    let mut paired: FxHashSet<&PathBuf> = FxHashSet::default();
    for from in removed {
        let state = old[from];
        let twin = created
            .iter()
            .copied()
            .find(|to| !paired.contains(*to) && new[*to].same_as(&state));
        match twin {
            Some(to) => {
                paired.insert(to);
                events.push(WatchEvent::Renamed {
                    from: from.clone(),
                    to: to.clone(),
                });
            }
            None => events.push(WatchEvent::Removed(from.clone())),
        }
    }
    events.extend(
        created
            .into_iter()
            .chain(changed)
            .filter(|p| !paired.contains(*p))
            .map(|p| WatchEvent::Modified(p.clone())),
    );
    events
}
