//! Gatekeeper configuration library.
//!
//! Resolves, validates and freezes the runtime configuration of an
//! OAuth2-aware reverse proxy.

pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::{Config, ConfigError, ConfigStore, Options};
