//! Configuration file watcher for hot reload.
//!
//! # Design Decisions
//! - Watches the parent directory so editors that save by rename are seen
//! - Events for other files in the directory are ignored
//! - Identical file content is forwarded once; invalid content never
//! - The receiver decides what a new config means for live contexts

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::parse_config;
use crate::config::schema::FactoryConfig;

/// Watches one configuration file and forwards every valid new version.
pub struct ConfigWatcher {
    path: PathBuf,
    poll_interval: Duration,
    update_tx: mpsc::UnboundedSender<FactoryConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and a receiver for validated configurations.
    pub fn new(
        path: &Path,
        poll_interval: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<FactoryConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            poll_interval,
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Start watching in the background.
    ///
    /// The returned handle must be kept alive for events to flow.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let directory = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = self.path.file_name().map(|name| name.to_os_string());

        // Seed with the current content so the first event only fires on a real change
        let last_seen = Arc::new(Mutex::new(std::fs::read_to_string(&self.path).ok()));
        let path = self.path.clone();
        let tx = self.update_tx;

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let event = match res {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::error!(error = %e, "Config watch error");
                        return;
                    }
                };
                if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                    return;
                }
                let ours = event
                    .paths
                    .iter()
                    .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                if ours {
                    forward_if_changed(&path, &last_seen, &tx);
                }
            },
            Config::default().with_poll_interval(self.poll_interval),
        )?;

        watcher.watch(&directory, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, poll_interval = ?self.poll_interval, "Config watcher started");
        Ok(watcher)
    }
}

/// Re-read `path` and send the parsed config if the content changed and is valid.
fn forward_if_changed(
    path: &Path,
    last_seen: &Mutex<Option<String>>,
    tx: &mpsc::UnboundedSender<FactoryConfig>,
) {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::debug!(path = ?path, error = %e, "Config file not readable yet");
            return;
        }
    };

    // Truncated mid-write
    if content.trim().is_empty() {
        return;
    }

    let mut last = last_seen.lock().unwrap_or_else(PoisonError::into_inner);
    if last.as_deref() == Some(content.as_str()) {
        return;
    }

    match parse_config(&content) {
        Ok(config) => {
            tracing::info!(path = ?path, "Config file change detected");
            *last = Some(content);
            if tx.send(config).is_err() {
                tracing::debug!("Config receiver dropped, ignoring change");
            }
        }
        Err(e) => {
            tracing::error!(
                "Failed to reload config: {}. Keeping current configuration.",
                e
            );
        }
    }
}
