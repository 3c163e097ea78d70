//! Run environment: the locations each operation needs

use crate::config::schema::PathsConfig;
use crate::error::{ActkitError, ActkitResult};
use std::path::{Path, PathBuf};

/// Workspace root, also the working directory for tar
pub const WORKSPACE_VAR: &str = "GITHUB_WORKSPACE";
/// Directory holding cache files
pub const CACHE_DIR_VAR: &str = "ACTKIT_CACHE_DIR";
/// Directory holding artifact zips
pub const ARTIFACT_DIR_VAR: &str = "ACTKIT_ARTIFACT_DIR";
/// Server URL, used to detect enterprise-server hosts
pub const SERVER_URL_VAR: &str = "GITHUB_SERVER_URL";

/// Locations for one run
///
/// Fields stay optional; each operation asks for what it needs at entry and
/// fails with `MissingEnv` when it is absent.
#[derive(Debug, Clone, Default)]
pub struct RunEnv {
    pub workspace: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
    pub artifact_dir: Option<PathBuf>,
    pub server_url: Option<String>,
}

impl RunEnv {
    /// Read locations from the process environment only
    pub fn from_env() -> Self {
        Self::from_env_with(&PathsConfig::default())
    }

    /// Read locations from the process environment, falling back to config values
    pub fn from_env_with(defaults: &PathsConfig) -> Self {
        Self {
            workspace: env_path(WORKSPACE_VAR).or_else(|| defaults.workspace.clone()),
            cache_dir: env_path(CACHE_DIR_VAR).or_else(|| defaults.cache_dir.clone()),
            artifact_dir: env_path(ARTIFACT_DIR_VAR).or_else(|| defaults.artifact_dir.clone()),
            server_url: env_string(SERVER_URL_VAR).or_else(|| defaults.server_url.clone()),
        }
    }

    /// Workspace root
    pub fn workspace(&self) -> ActkitResult<&Path> {
        self.workspace
            .as_deref()
            .ok_or(ActkitError::MissingEnv(WORKSPACE_VAR))
    }

    /// Cache directory
    pub fn cache_dir(&self) -> ActkitResult<&Path> {
        self.cache_dir
            .as_deref()
            .ok_or(ActkitError::MissingEnv(CACHE_DIR_VAR))
    }

    /// Artifact directory
    pub fn artifact_dir(&self) -> ActkitResult<&Path> {
        self.artifact_dir
            .as_deref()
            .ok_or(ActkitError::MissingEnv(ARTIFACT_DIR_VAR))
    }

    /// Whether the configured server is an enterprise-server host
    pub fn is_ghes(&self) -> bool {
        is_ghes_url(self.server_url.as_deref().unwrap_or("https://github.com"))
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_path(name: &str) -> Option<PathBuf> {
    env_string(name).map(PathBuf::from)
}

/// github.com, `*.ghe.com` and `*.localhost` are hosted; anything else is GHES
pub fn is_ghes_url(url: &str) -> bool {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let authority = without_scheme.split('/').next().unwrap_or_default();
    let host_port = authority.rsplit('@').next().unwrap_or(authority);
    let host = host_port.split(':').next().unwrap_or(host_port);
    let host = host.trim_end().to_ascii_uppercase();

    let is_github_host = host == "GITHUB.COM";
    let is_ghe_host = host.ends_with(".GHE.COM");
    let is_local_host = host.ends_with(".LOCALHOST");

    !is_github_host && !is_ghe_host && !is_local_host
}
