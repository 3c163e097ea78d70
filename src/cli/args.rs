//! CLI argument definitions using clap derive

use crate::archive::CompressionMethod;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// actkit - local CI cache and artifact services
///
/// Restores and saves keyed caches and stores run artifacts on the local
/// filesystem, mirroring the hosted services' behavior.
#[derive(Parser, Debug)]
#[command(name = "actkit")]
#[command(author, version, about = "actkit - local CI cache and artifact services", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "ACTKIT_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Restore and save keyed caches
    Cache(CacheArgs),

    /// Upload, download and manage run artifacts
    Artifact(ArtifactArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    /// Subcommand for cache
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Restore the first cache matching the key or a restore key
    Restore {
        /// Cached path or glob (repeatable)
        #[arg(short, long = "path")]
        paths: Vec<String>,

        /// Primary key
        #[arg(short, long)]
        key: String,

        /// Fallback key prefix, tried in order (repeatable)
        #[arg(short, long = "restore-key")]
        restore_keys: Vec<String>,

        /// Only check whether a cache exists
        #[arg(long)]
        lookup_only: bool,

        /// Allow the cache to be restored on any OS
        #[arg(long)]
        cross_os: bool,
    },

    /// Archive paths into a new cache
    Save {
        /// Path or glob to cache (repeatable)
        #[arg(short, long = "path")]
        paths: Vec<String>,

        /// Cache key
        #[arg(short, long)]
        key: String,

        /// Allow the cache to be restored on any OS
        #[arg(long)]
        cross_os: bool,
    },

    /// Print the version fingerprint for a set of paths
    Version {
        /// Cached path or glob (repeatable)
        #[arg(short, long = "path")]
        paths: Vec<String>,

        /// Compression method (detected if omitted)
        #[arg(long)]
        compression: Option<CompressionMethod>,

        /// Omit the OS marker
        #[arg(long)]
        cross_os: bool,
    },
}

/// Arguments for the artifact command
#[derive(Parser, Debug)]
pub struct ArtifactArgs {
    /// Subcommand for artifact
    #[command(subcommand)]
    pub action: ArtifactAction,
}

/// Artifact subcommands
#[derive(Subcommand, Debug)]
pub enum ArtifactAction {
    /// Zip files into a new artifact
    Upload {
        /// Artifact name
        name: String,

        /// Files to include (defaults to every file under the root directory)
        files: Vec<PathBuf>,

        /// Root directory entries are made relative to (defaults to current directory)
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Deflate level, 0 stores without compression
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..=9))]
        compression_level: Option<u32>,
    },

    /// Extract an artifact by id
    Download {
        /// Artifact ID
        id: u64,

        /// Destination directory (defaults to the workspace)
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Expected sha256 of the artifact zip
        #[arg(long)]
        expected_hash: Option<String>,
    },

    /// List artifacts in this run
    List {
        /// Only the newest artifact per name
        #[arg(long)]
        latest: bool,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show the newest artifact with a name
    Get {
        /// Artifact name
        name: String,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Delete the newest artifact with a name
    Delete {
        /// Artifact name
        name: String,
    },
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for listing commands
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_cache_restore() {
        let cli = Cli::parse_from([
            "actkit",
            "cache",
            "restore",
            "-p",
            "node_modules",
            "--path",
            "~/.npm",
            "-k",
            "npm-linux-abc",
            "-r",
            "npm-linux-",
            "--lookup-only",
        ]);
        match cli.command {
            Commands::Cache(CacheArgs {
                action:
                    CacheAction::Restore {
                        paths,
                        key,
                        restore_keys,
                        lookup_only,
                        cross_os,
                    },
            }) => {
                assert_eq!(paths, vec!["node_modules", "~/.npm"]);
                assert_eq!(key, "npm-linux-abc");
                assert_eq!(restore_keys, vec!["npm-linux-"]);
                assert!(lookup_only);
                assert!(!cross_os);
            }
            _ => panic!("expected cache restore"),
        }
    }

    #[test]
    fn cli_parses_compression() {
        let cli = Cli::parse_from(["actkit", "cache", "version", "-p", "src", "--compression", "zstd"]);
        match cli.command {
            Commands::Cache(CacheArgs {
                action: CacheAction::Version { compression, .. },
            }) => assert_eq!(compression, Some(CompressionMethod::Zstd)),
            _ => panic!("expected cache version"),
        }
    }

    #[test]
    fn cli_parses_artifact_upload() {
        let cli = Cli::parse_from([
            "actkit",
            "artifact",
            "upload",
            "build",
            "dist/a.js",
            "dist/b.js",
            "--root",
            "dist",
            "--compression-level",
            "0",
        ]);
        match cli.command {
            Commands::Artifact(ArtifactArgs {
                action:
                    ArtifactAction::Upload {
                        name,
                        files,
                        root,
                        compression_level,
                    },
            }) => {
                assert_eq!(name, "build");
                assert_eq!(files.len(), 2);
                assert_eq!(root, Some(PathBuf::from("dist")));
                assert_eq!(compression_level, Some(0));
            }
            _ => panic!("expected artifact upload"),
        }
    }

    #[test]
    fn compression_level_range_enforced() {
        let result = Cli::try_parse_from([
            "actkit",
            "artifact",
            "upload",
            "build",
            "--compression-level",
            "12",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_parses_verbose_count() {
        let cli = Cli::parse_from(["actkit", "-vv", "artifact", "list", "--latest"]);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn cli_parses_config_init() {
        let cli = Cli::parse_from(["actkit", "config", "init", "--force"]);
        match cli.command {
            Commands::Config(ConfigArgs {
                action: Some(ConfigAction::Init { force }),
            }) => assert!(force),
            _ => panic!("expected config init"),
        }
    }
}
