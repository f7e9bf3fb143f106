//! `key=value` decoding and map merging.
//!
//! Used by the CLI overlay for tag data, claim matchers and upstream headers.

use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while decoding key pairs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyPairError {
    /// The entry has no `=` separator.
    #[error("invalid key-pair '{0}', should be key=value")]
    Invalid(String),
}

/// Decode a list of `key=value` strings into a map.
///
/// The entry is split at the first `=`, so values may themselves contain `=`.
/// A later entry for the same key replaces an earlier one.
pub fn decode_key_pairs<S: AsRef<str>>(
    pairs: &[S],
) -> Result<HashMap<String, String>, KeyPairError> {
    let mut decoded = HashMap::with_capacity(pairs.len());

    for pair in pairs {
        let pair = pair.as_ref();
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| KeyPairError::Invalid(pair.to_string()))?;
        decoded.insert(key.to_string(), value.to_string());
    }

    Ok(decoded)
}

/// Write every entry of `src` into `dest`, overriding on key collision.
pub fn merge_maps(
    dest: &mut HashMap<String, String>,
    src: HashMap<String, String>,
) -> &mut HashMap<String, String> {
    dest.extend(src);
    dest
}
