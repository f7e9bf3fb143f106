//! Gatekeeper
//!
//! Resolves the proxy configuration from defaults, an optional file and the
//! command line, validates it, and keeps the frozen snapshot current across
//! reloads.
//!
//! # Architecture Overview
//!
//! ```text
//!   defaults ──▶ config file ──▶ command line ──▶ validation ──▶ Arc<Config>
//!                    ▲                                              │
//!                    │            SIGHUP / file change              │
//!                    └──────────── re-resolve & swap ◀──────────────┘
//! ```

use clap::Parser;
use tokio::sync::mpsc::UnboundedReceiver;

use gatekeeper::config::watcher::ConfigWatcher;
use gatekeeper::config::Options;
use gatekeeper::lifecycle::{bootstrap, SignalEvent, Signals};
use gatekeeper::observability::logging::log_summary;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let options = Options::parse();

    let store = match bootstrap(&options) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("[error] {}", e);
            std::process::exit(1);
        }
    };

    // Keep the watcher handle alive for the lifetime of the loop
    let (_watcher, mut updates) = match ConfigWatcher::new(&options) {
        Some((watcher, rx)) => (Some(watcher.run()?), Some(rx)),
        None => (None, None),
    };

    let mut signals = Signals::new()?;

    loop {
        tokio::select! {
            event = signals.recv() => match event {
                SignalEvent::Reload => {
                    tracing::info!("SIGHUP received, reloading configuration");
                    match store.reload(&options) {
                        Ok(config) => log_summary(&config),
                        Err(e) => tracing::error!(
                            "Failed to reload config: {}. Keeping current configuration.",
                            e
                        ),
                    }
                }
                SignalEvent::Shutdown => break,
            },
            Some(config) = recv_update(&mut updates) => {
                let config = store.replace(config);
                log_summary(&config);
            }
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn recv_update<T>(updates: &mut Option<UnboundedReceiver<T>>) -> Option<T> {
    match updates {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
