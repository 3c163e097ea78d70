//! Configuration management for actkit
//!
//! Values from the file are checked on load, and `[paths]` entries are made
//! absolute: `~/` expands to the home directory and relative entries are
//! anchored at the directory holding the config file. Environment variables
//! still win over these values (see `session::RunEnv`).

pub mod schema;

pub use schema::{Config, PathsConfig};

use crate::artifact::MAX_COMPRESSION_LEVEL;
use crate::error::{ActkitError, ActkitResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("actkit")
            .join("config.toml")
    }

    /// Load, check and resolve configuration; defaults if the file is missing
    pub async fn load(&self) -> ActkitResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        let mut config = self.load_from_file(&self.config_path).await?;
        self.check(&config)?;
        self.resolve_paths(&mut config.paths);
        Ok(config)
    }

    fn check(&self, config: &Config) -> ActkitResult<()> {
        let invalid = |reason: String| ActkitError::ConfigInvalid {
            path: self.config_path.clone(),
            reason,
        };

        if config.artifact.compression_level > MAX_COMPRESSION_LEVEL {
            return Err(invalid(format!(
                "artifact.compression_level must be between 0 and {}, got {}",
                MAX_COMPRESSION_LEVEL, config.artifact.compression_level
            )));
        }
        if !matches!(config.general.log_format.as_str(), "text" | "json") {
            return Err(invalid(format!(
                "general.log_format must be \"text\" or \"json\", got \"{}\"",
                config.general.log_format
            )));
        }
        Ok(())
    }

    /// Make every `[paths]` location absolute
    fn resolve_paths(&self, paths: &mut PathsConfig) {
        let base = self.config_path.parent().unwrap_or_else(|| Path::new("."));
        for slot in [
            &mut paths.workspace,
            &mut paths.cache_dir,
            &mut paths.artifact_dir,
        ] {
            if let Some(location) = slot.take() {
                let resolved = resolve_location(&location, base);
                debug!("Config location {} -> {}", location.display(), resolved.display());
                *slot = Some(resolved);
            }
        }
    }

    /// Parse a config file as written, without checks or path resolution
    pub async fn load_from_file(&self, path: &Path) -> ActkitResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| ActkitError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| ActkitError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> ActkitResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            ActkitError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> ActkitResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ActkitError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

fn resolve_location(location: &Path, base: &Path) -> PathBuf {
    if let Ok(rest) = location.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if location.is_relative() {
        base.join(location)
    } else {
        location.to_path_buf()
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
