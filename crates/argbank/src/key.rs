//! Key normalization.
//!
//! `--name` is canonicalized to `name`. Single-dash keys such as `-v` or
//! namespaced `-ll:gpus` are kept verbatim, dash included.

use crate::error::{Error, Result};

/// Canonicalize a raw key token into a registry lookup key.
pub fn normalize_key(raw: &str) -> Result<String> {
    if let Some(rest) = raw.strip_prefix("--") {
        Ok(rest.to_string())
    } else if raw.starts_with('-') {
        Ok(raw.to_string())
    } else {
        Err(Error::MalformedKey(raw.to_string()))
    }
}

/// Whether a normalized key asks for usage text.
///
/// Matches `--help`, `--h`, `-help` and `-h`.
pub fn is_help_key(key: &str) -> bool {
    matches!(key, "help" | "h" | "-help" | "-h")
}

/// Turn a normalized key back into the form a user would type.
pub fn display_key(key: &str) -> String {
    if key.starts_with('-') {
        key.to_string()
    } else {
        format!("--{key}")
    }
}

/// Whether a token looks like a key rather than a value.
///
/// This is a heuristic: `-3` is treated as a key too.
pub(crate) fn looks_like_key(token: &str) -> bool {
    token.starts_with('-')
}
