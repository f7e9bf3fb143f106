//! Configuration loading from disk.
//!
//! A file is an overlay: the keys it names replace the values of the incoming
//! snapshot, nested maps are merged key by key, and keys it leaves out keep
//! their prior values. Unknown keys are ignored.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use crate::config::keypairs::KeyPairError;
use crate::config::resource::ResourceError;
use crate::config::schema::Config;
use crate::config::validation::ValidationError;

/// Error type for configuration resolution.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read the configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("unable to decode the configuration file {path}: {source}")]
    Decode {
        path: PathBuf,
        source: DecodeError,
    },

    #[error("invalid --{option} value: {source}")]
    KeyPair {
        option: &'static str,
        source: KeyPairError,
    },

    #[error("invalid resource {descriptor}, {source}")]
    Resource {
        descriptor: String,
        source: ResourceError,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// The ways a configuration document can fail to decode.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid yaml: {0}")]
    Yaml(#[source] serde_yaml::Error),

    /// Syntactically valid, but a value has the wrong shape for its field.
    #[error("{0}")]
    Schema(#[source] serde_json::Error),
}

/// Read a configuration file and overlay it onto `config`.
///
/// Every file is decoded as YAML whatever its extension; a JSON document is
/// valid YAML and decodes the same way.
pub fn load_file(config: Config, path: &Path) -> Result<Config, ConfigError> {
    let content = read_config_file(path)?;

    tracing::debug!(path = %path.display(), "Decoding configuration file");

    overlay_document(config, &content).map_err(|source| ConfigError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Read the full contents of a configuration file.
pub fn read_config_file(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Overlay an in-memory document onto `config`.
pub fn overlay_document(config: Config, content: &str) -> Result<Config, DecodeError> {
    if content.trim().is_empty() {
        return Ok(config);
    }

    let overlay: Value = serde_yaml::from_str(content).map_err(DecodeError::Yaml)?;
    if overlay.is_null() {
        return Ok(config);
    }

    let mut base = serde_json::to_value(&config).map_err(DecodeError::Schema)?;
    merge_values(&mut base, overlay);

    serde_json::from_value(base).map_err(DecodeError::Schema)
}

fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
