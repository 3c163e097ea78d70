//! Configuration schema for actkit
//!
//! Configuration is stored at `~/.config/actkit/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Service locations
    pub paths: PathsConfig,

    /// Cache settings
    pub cache: CacheConfig,

    /// Artifact settings
    pub artifact: ArtifactConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Default locations, overridden by the matching environment variables
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Workspace root (GITHUB_WORKSPACE)
    pub workspace: Option<PathBuf>,

    /// Directory holding `<key>-<version>.cache` files (ACTKIT_CACHE_DIR)
    pub cache_dir: Option<PathBuf>,

    /// Directory holding `<name>.zip` artifacts (ACTKIT_ARTIFACT_DIR)
    pub artifact_dir: Option<PathBuf>,

    /// Server URL used for the GHES check (GITHUB_SERVER_URL)
    pub server_url: Option<String>,
}

/// Cache settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Produce versions that restore on any OS
    pub cross_os_archive: bool,
}

/// Artifact settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    /// Deflate level for uploaded zips (0 = store)
    pub compression_level: u32,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            compression_level: 6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[artifact]"));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.general.log_format, "text");
        assert_eq!(config.artifact.compression_level, 6);
        assert!(config.paths.cache_dir.is_none());
    }

    #[test]
    fn config_deserializes_partial() {
        let toml = r#"
            [paths]
            cache_dir = "/tmp/caches"

            [cache]
            cross_os_archive = true
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.paths.cache_dir, Some(PathBuf::from("/tmp/caches")));
        assert!(config.cache.cross_os_archive);
        assert_eq!(config.artifact.compression_level, 6); // default preserved
    }
}
