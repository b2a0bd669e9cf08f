//! Background change detection for definition roots.
//!
//! A poller thread rescans the roots every `watch_interval_ms` and sends
//! [`WatchEvent`]s over a bounded channel; a single consumer thread applies
//! them to the registry in order. Both threads stop on
//! [`Watcher::shutdown`] or when the watcher is dropped.

mod poller;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::registry::ModelRegistry;

pub use poller::{diff, FileState};

const CHANNEL_BOUND: usize = 1024;

/// A change observed under a root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// Created or changed.
    Modified(PathBuf),
    Removed(PathBuf),
    /// A removal and a creation that look like the same file moving.
    Renamed { from: PathBuf, to: PathBuf },
}

pub struct Watcher {
    stop: Sender<()>,
    poller: Option<JoinHandle<()>>,
    consumer: Option<JoinHandle<()>>,
}

impl Watcher {
    /// Start watching the registry's roots. The current state of the roots
    /// is the baseline; only later changes produce events.
    pub fn start(registry: Arc<ModelRegistry>) -> io::Result<Self> {
        let interval = Duration::from_millis(registry.config().watch_interval_ms.max(1));
        let (events_tx, events_rx) = bounded::<WatchEvent>(CHANNEL_BOUND);
        let (stop_tx, stop_rx) = bounded::<()>(1);

        let baseline = poller::scan(&registry);
        let roots = poller::Roots::of(&registry);

        let consumer = thread::Builder::new()
            .name("modelsql-watch-apply".to_string())
            .spawn({
                let registry = Arc::clone(&registry);
                move || apply_loop(&registry, events_rx)
            })?;

        let poller = thread::Builder::new()
            .name("modelsql-watch-poll".to_string())
            .spawn(move || poller::poll_loop(roots, baseline, interval, stop_rx, events_tx))?;

        tracing::info!(interval_ms = interval.as_millis() as u64, "watching model definitions");
        Ok(Self {
            stop: stop_tx,
            poller: Some(poller),
            consumer: Some(consumer),
        })
    }

    /// Stop both threads and wait for them. Events already queued are applied first.
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        let _ = self.stop.try_send(());
        for handle in [self.poller.take(), self.consumer.take()].into_iter().flatten() {
            if handle.join().is_err() {
                tracing::error!("watcher thread panicked");
            }
        }
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

fn apply_loop(registry: &ModelRegistry, events: Receiver<WatchEvent>) {
    // Ends when the poller drops its sender.
    for event in events {
        tracing::debug!(?event, "applying watch event");
        match event {
            WatchEvent::Modified(path) => {
                if let Err(e) = registry.refresh(&path) {
                    tracing::error!(path = %path.display(), error = %e, "watcher refresh failed");
                }
            }
            WatchEvent::Removed(path) => {
                registry.remove(&path);
            }
            WatchEvent::Renamed { from, to } => {
                tracing::warn!(
                    from = %from.display(),
                    to = %to.display(),
                    "definition renamed, reloading all models"
                );
                registry.reload_all();
            }
        }
    }
}
