//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Resolved config (json-logging, verbose)
//!     → logging.rs (subscriber setup, startup summary)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Logging starts only after the configuration is resolved, so resolution
//!   errors are reported on stderr

pub mod logging;
