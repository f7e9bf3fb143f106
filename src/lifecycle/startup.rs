//! Startup orchestration.
//!
//! # Responsibilities
//! - Resolve and validate configuration
//! - Initialize logging from the resolved configuration
//! - Freeze the configuration for the rest of the process
//!
//! # Design Decisions
//! - Fail fast: any resolution error is fatal, nothing starts half configured
//! - Logging is set up only once the configuration is known to be valid

use crate::config::{resolve, ConfigError, ConfigStore, Options};
use crate::observability::logging;

/// Errors that abort startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("unable to initialize logging: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),
}

/// Resolve the configuration, start logging and freeze the result.
pub fn bootstrap(options: &Options) -> Result<ConfigStore, StartupError> {
    let config = resolve(options)?;

    logging::init_logging(&config)?;
    tracing::info!("gatekeeper v{} starting", env!("CARGO_PKG_VERSION"));
    logging::log_summary(&config);

    Ok(ConfigStore::new(config))
}
