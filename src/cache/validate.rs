//! Cache key and path validation
//!
//! Runs before any I/O; failures are hard errors.

use crate::error::{ActkitError, ActkitResult};

/// Longest accepted key
pub const MAX_KEY_LENGTH: usize = 512;

/// Most keys accepted by one restore (primary + restore keys)
pub const MAX_KEYS: usize = 10;

/// At least one path must be given
pub fn check_paths(paths: &[String]) -> ActkitResult<()> {
    if paths.is_empty() {
        return Err(ActkitError::validation(
            "Path Validation Error: At least one directory or file path is required",
        ));
    }
    Ok(())
}

/// Keys are at most 512 characters and contain no commas
pub fn check_key(key: &str) -> ActkitResult<()> {
    if key.chars().count() > MAX_KEY_LENGTH {
        return Err(ActkitError::validation(format!(
            "Key Validation Error: {} cannot be larger than {} characters.",
            key, MAX_KEY_LENGTH
        )));
    }
    if key.contains(',') {
        return Err(ActkitError::validation(format!(
            "Key Validation Error: {} cannot contain commas.",
            key
        )));
    }
    Ok(())
}

/// Validate the primary key plus restore keys, returning them in priority order
pub fn check_keys(primary_key: &str, restore_keys: &[String]) -> ActkitResult<Vec<String>> {
    let keys: Vec<String> = std::iter::once(primary_key.to_string())
        .chain(restore_keys.iter().cloned())
        .collect();

    if keys.len() > MAX_KEYS {
        return Err(ActkitError::validation(format!(
            "Key Validation Error: Keys are limited to a maximum of {}.",
            MAX_KEYS
        )));
    }
    for key in &keys {
        check_key(key)?;
    }
    Ok(keys)
}
