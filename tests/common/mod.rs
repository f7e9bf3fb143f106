//! Shared utilities for integration testing.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};

use gatekeeper::config::Options;

static COUNTER: AtomicU32 = AtomicU32::new(0);

/// A config file in the temp directory, removed on drop.
pub struct TempConfig {
    pub path: PathBuf,
}

impl TempConfig {
    /// Write `contents` to a uniquely named file ending in `extension`.
    pub fn new(extension: &str, contents: &str) -> Self {
        let n = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "gatekeeper-test-{}-{}.{}",
            std::process::id(),
            n,
            extension
        ));
        fs::write(&path, contents).unwrap();
        Self { path }
    }
}

impl Drop for TempConfig {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Options pointing at a config file and nothing else.
#[allow(dead_code)]
pub fn options_for(file: &TempConfig) -> Options {
    Options {
        config: Some(file.path.clone()),
        ..Options::default()
    }
}
