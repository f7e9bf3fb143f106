//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem from the resolved configuration
//! - Emit a startup summary of the configuration (secrets omitted)
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format when `json-logging` is on, human readable otherwise
//! - `RUST_LOG` wins over `verbose` when set

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

/// Filter used when `RUST_LOG` is not set.
pub fn default_directives(config: &Config) -> &'static str {
    if config.verbose {
        "gatekeeper=debug"
    } else {
        "gatekeeper=info"
    }
}

/// Install the global tracing subscriber.
pub fn init_logging(config: &Config) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directives(config).into());

    if config.json_logging {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
    }
}

/// Log the parts of the configuration operators usually need to see.
pub fn log_summary(config: &Config) {
    tracing::info!(
        listen = %config.listen,
        upstream = %config.upstream_url,
        tls = !config.tls_cert.is_empty(),
        forwarding = config.enable_forwarding,
        skip_token_verification = config.skip_token_verification,
        refresh_tokens = config.enable_refresh_tokens,
        resources = config.resources.len(),
        "Configuration loaded"
    );

    if config.skip_token_verification {
        tracing::warn!("Token verification is disabled, use for testing only");
    }

    for resource in &config.resources {
        tracing::debug!(%resource, "Protecting resource");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives() {
        let mut config = Config::default();
        assert_eq!(default_directives(&config), "gatekeeper=info");

        config.verbose = true;
        assert_eq!(default_directives(&config), "gatekeeper=debug");
    }
}
