//! Error types for actkit
//!
//! All modules use `ActkitResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for actkit operations
pub type ActkitResult<T> = Result<T, ActkitError>;

/// All errors that can occur in actkit
#[derive(Error, Debug)]
pub enum ActkitError {
    // Environment errors
    #[error("Environment variable {0} is not set")]
    MissingEnv(&'static str),

    #[error("@actions/artifact v2.0.0+, upload-artifact@v4+ and download-artifact@v4+ are not currently supported on GHES.")]
    GhesNotSupported,

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Input validation errors (always raised before any I/O)
    #[error("{0}")]
    Validation(String),

    // Cache errors
    #[error("{0}")]
    ReserveCache(String),

    // Artifact errors
    #[error("{0}")]
    ArtifactNotFound(String),

    #[error("No files were found to upload{}", files_suffix(.0))]
    FilesNotFound(Vec<String>),

    #[error("An artifact with the name {0} already exists in this run")]
    ArtifactExists(String),

    #[error("Artifact limit reached: a run may hold at most {0} artifacts")]
    ArtifactLimit(usize),

    // Archive errors
    #[error("Unable to locate {0}")]
    ArchiveToolNotFound(String),

    #[error("{program} failed with error: {message}")]
    ArchiveCommand { program: String, message: String },

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

fn files_suffix(files: &[String]) -> String {
    if files.is_empty() {
        String::new()
    } else {
        format!(": {}", files.join(", "))
    }
}

impl ActkitError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether the error comes from malformed caller input
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::MissingEnv("GITHUB_WORKSPACE") => {
                Some("Export GITHUB_WORKSPACE or set paths.workspace in config.toml")
            }
            Self::MissingEnv("ACTKIT_CACHE_DIR") => {
                Some("Export ACTKIT_CACHE_DIR or set paths.cache_dir in config.toml")
            }
            Self::MissingEnv("ACTKIT_ARTIFACT_DIR") => {
                Some("Export ACTKIT_ARTIFACT_DIR or set paths.artifact_dir in config.toml")
            }
            Self::ArchiveToolNotFound(_) => Some("Install GNU tar (gtar on macOS) and make sure it is on PATH"),
            Self::ArtifactNotFound(_) => Some("Run: actkit artifact list"),
            _ => None,
        }
    }
}
