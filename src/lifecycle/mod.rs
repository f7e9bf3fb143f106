//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Resolve config → Validate → Initialize logging → Freeze
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown
//!     SIGHUP → Re-resolve config and swap the snapshot
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then logging
//! - A failed reload never replaces a working configuration
//! - The log subscriber is installed once at startup, so a reload does not
//!   pick up changes to `json-logging` or `verbose`

pub mod signals;
pub mod startup;

pub use signals::{SignalEvent, Signals};
pub use startup::{bootstrap, StartupError};
