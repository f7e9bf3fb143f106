//! Frozen, shared configuration snapshot.
//!
//! Readers take an `Arc<Config>` and keep it for as long as they need; a
//! reload resolves a whole new aggregate and swaps the pointer. No snapshot
//! is ever mutated after it is published.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::loader::ConfigError;
use crate::config::options::Options;
use crate::config::resolve;
use crate::config::schema::Config;

/// Holder of the current validated configuration.
#[derive(Debug)]
pub struct ConfigStore {
    current: ArcSwap<Config>,
}

impl ConfigStore {
    /// Freeze a validated configuration.
    pub fn new(config: Config) -> Self {
        Self {
            current: ArcSwap::from_pointee(config),
        }
    }

    /// The current snapshot.
    pub fn load(&self) -> Arc<Config> {
        self.current.load_full()
    }

    /// Publish an already validated configuration.
    pub fn replace(&self, config: Config) -> Arc<Config> {
        let config = Arc::new(config);
        self.current.store(config.clone());
        config
    }

    /// Resolve the configuration again and publish it.
    ///
    /// On failure the current snapshot stays in place.
    pub fn reload(&self, options: &Options) -> Result<Arc<Config>, ConfigError> {
        let config = resolve(options)?;
        Ok(self.replace(config))
    }
}
