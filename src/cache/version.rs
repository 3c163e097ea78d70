//! Cache version fingerprint
//!
//! The version is a sha256 over the cached paths, the compression method, an
//! OS marker and a fixed salt. Same inputs always give the same version.

use crate::archive::{CompressionMethod, HostOs};
use crate::session::registry::CACHE_FILE_SUFFIX;
use sha2::{Digest, Sha256};

/// Bumped when the archive layout changes incompatibly
pub const VERSION_SALT: &str = "1.0";

/// Marker that keeps Windows-built caches from restoring elsewhere
const WINDOWS_ONLY: &str = "windows-only";

/// Compute the hex version for a set of paths
pub fn cache_version(
    paths: &[String],
    method: Option<CompressionMethod>,
    cross_os_archive: bool,
    os: HostOs,
) -> String {
    let mut components: Vec<&str> = paths.iter().map(String::as_str).collect();
    if let Some(method) = method {
        components.push(method.as_str());
    }
    if os.is_windows() && !cross_os_archive {
        components.push(WINDOWS_ONLY);
    }
    components.push(VERSION_SALT);

    let mut hasher = Sha256::new();
    hasher.update(components.join("|").as_bytes());
    hex::encode(hasher.finalize())
}

/// On-disk file name for a key and version
pub fn cache_file_name(key: &str, version: &str) -> String {
    format!("{}-{}{}", key, version, CACHE_FILE_SUFFIX)
}
