//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! Config::default()                (schema.rs)
//!     → config file overlay        (loader.rs, optional)
//!     → command line overlay       (options.rs)
//!     → validation                 (validation.rs)
//!     → Arc<Config> in ConfigStore (store.rs, immutable from here on)
//!
//! On reload signal or file change:
//!     the whole chain runs again from the defaults
//!     → atomic swap of the Arc<Config>
//!     → failures keep the current snapshot
//! ```
//!
//! # Design Decisions
//! - Every stage takes the config by value and hands back the next snapshot
//! - Precedence is command line > file > defaults
//! - Validation runs once, after the last overlay

pub mod keypairs;
pub mod loader;
pub mod options;
pub mod resource;
pub mod scalar;
pub mod schema;
pub mod store;
pub mod validation;
pub mod watcher;

pub use loader::ConfigError;
pub use options::Options;
pub use resource::Resource;
pub use schema::{Config, CorsConfig};
pub use store::ConfigStore;
pub use validation::ValidationError;

/// Build and validate the runtime configuration.
pub fn resolve(options: &Options) -> Result<Config, ConfigError> {
    let config = Config::default();

    let config = match &options.config {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading configuration file");
            loader::load_file(config, path)?
        }
        None => config,
    };

    let config = options.overlay(config)?;
    let config = validation::validate(config)?;

    tracing::debug!(
        resources = config.resources.len(),
        forwarding = config.enable_forwarding,
        "Configuration resolved"
    );

    Ok(config)
}
