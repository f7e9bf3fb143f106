//! Configuration file watcher for hot reload.

use std::path::PathBuf;
use std::time::Duration;

use notify::{Config as WatchConfig, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::options::Options;
use crate::config::resolve;
use crate::config::schema::Config;

/// A watcher that re-resolves the configuration when its file changes.
pub struct ConfigWatcher {
    path: PathBuf,
    options: Options,
    update_tx: mpsc::UnboundedSender<Config>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher for the file named by `options.config`.
    ///
    /// Returns `None` when no file is in use, otherwise the watcher and a
    /// receiver for validated configurations.
    pub fn new(options: &Options) -> Option<(Self, mpsc::UnboundedReceiver<Config>)> {
        let path = options.config.clone()?;
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        Some((
            Self {
                path,
                options: options.clone(),
                update_tx,
            },
            update_rx,
        ))
    }

    /// Start watching the file in a background thread.
    ///
    /// The returned handle must be kept alive for as long as updates are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx;
        let options = self.options;

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!("Config file change detected, reloading...");
                        match resolve(&options) {
                            Ok(new_config) => {
                                let _ = tx.send(new_config);
                            }
                            Err(e) => {
                                tracing::error!(
                                    "Failed to reload config: {}. Keeping current configuration.",
                                    e
                                );
                            }
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            WatchConfig::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}
