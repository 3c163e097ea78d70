//! Keyed directory caches
//!
//! A cache is a compressed tar archive stored in the cache directory as
//! `<key>-<version>.cache`. Restores match keys by prefix, in priority order.
//! Saves never overwrite an existing file.
//!
//! # Outcomes
//!
//! | Situation | Restore | Save |
//! |-----------|---------|------|
//! | Bad input or missing config | `Err` | `Err` |
//! | No matching cache | `Miss` | n/a |
//! | Archive/IO failure | `Failed` (warning) | `Failed`, id -1 (warning) |

pub mod engine;
pub mod paths;
pub mod validate;
pub mod version;

pub use engine::{CacheEngine, RestoreOptions, RestoreOutcome, SaveOptions, SaveOutcome};
pub use paths::resolve_paths;
pub use validate::{check_key, check_keys, check_paths, MAX_KEYS, MAX_KEY_LENGTH};
pub use version::{cache_file_name, cache_version, VERSION_SALT};

/// Format bytes as human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
