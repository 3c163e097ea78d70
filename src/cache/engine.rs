//! Cache restore and save against the local cache directory
//!
//! Input and configuration problems come back as `Err`. Once the inputs are
//! accepted, operational failures are logged as warnings and reported through
//! `RestoreOutcome::Failed` / `SaveOutcome::Failed` instead.

use crate::archive::{ArchiveTransport, CompressionMethod};
use crate::cache::format_bytes;
use crate::cache::paths::resolve_paths;
use crate::cache::validate::{check_key, check_keys, check_paths};
use crate::cache::version::{cache_file_name, cache_version};
use crate::error::{ActkitError, ActkitResult};
use crate::logger::Logger;
use crate::session::registry::CACHE_FILE_SUFFIX;
use crate::session::RunContext;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use uuid::Uuid;

/// Options for `restore_cache`
#[derive(Debug, Clone, Default)]
pub struct RestoreOptions {
    /// Report the match without extracting it
    pub lookup_only: bool,
    /// Omit the OS marker from the version
    pub cross_os_archive: bool,
}

/// Options for `save_cache`
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    /// Omit the OS marker from the version
    pub cross_os_archive: bool,
}

/// Result of a restore whose inputs were valid
#[derive(Debug)]
pub enum RestoreOutcome {
    /// Archive extracted into the workspace
    Restored { key: String, cache_file: String },
    /// Match found; extraction skipped (`lookup_only`)
    Found { key: String, cache_file: String },
    /// No cache file matched any key
    Miss,
    /// A match was found (or the lookup itself failed) but restoring failed
    Failed { error: ActkitError },
}

impl RestoreOutcome {
    /// The caller's key that matched, if the restore succeeded
    pub fn matched_key(&self) -> Option<&str> {
        match self {
            Self::Restored { key, .. } | Self::Found { key, .. } => Some(key),
            Self::Miss | Self::Failed { .. } => None,
        }
    }
}

/// Result of a save whose inputs were valid
#[derive(Debug)]
pub enum SaveOutcome {
    Saved {
        cache_id: u64,
        key: String,
        cache_file: String,
    },
    Failed {
        error: ActkitError,
    },
}

impl SaveOutcome {
    /// Numeric id of the saved cache, or -1 on failure
    pub fn cache_id(&self) -> i64 {
        match self {
            Self::Saved { cache_id, .. } => i64::try_from(*cache_id).unwrap_or(i64::MAX),
            Self::Failed { .. } => -1,
        }
    }
}

/// Scratch space for archives, manifests and intermediates
pub fn temp_root(workspace: &Path) -> PathBuf {
    workspace.join("actions").join("temp")
}

/// Restores and saves caches through the archive transport
pub struct CacheEngine {
    transport: ArchiveTransport,
    logger: Arc<dyn Logger>,
}

impl CacheEngine {
    pub fn new(transport: ArchiveTransport, logger: Arc<dyn Logger>) -> Self {
        Self { transport, logger }
    }

    /// Restore the first cache matching `primary_key` or a restore key
    ///
    /// Keys are tried in order; a key matches a cache file whose name starts
    /// with it. Returns the caller's key that matched, not the file name.
    pub async fn restore_cache(
        &self,
        ctx: &RunContext,
        paths: &[String],
        primary_key: &str,
        restore_keys: &[String],
        options: &RestoreOptions,
    ) -> ActkitResult<RestoreOutcome> {
        let workspace = ctx.env().workspace()?;
        let cache_dir = ctx.env().cache_dir()?;
        check_paths(paths)?;
        let keys = check_keys(primary_key, restore_keys)?;

        let method = self.transport.compression_method().await;
        let version = cache_version(paths, Some(method), options.cross_os_archive, self.transport.os());
        self.logger.debug(&format!("Resolved Keys: {:?}", keys));
        self.logger.debug(&format!("Cache version: {}", version));

        let outcome = match self
            .restore_matching(workspace, cache_dir, &keys, method, options)
            .await
        {
            Ok(outcome) => outcome,
            Err(error) => {
                self.logger.warning(&format!("Failed to restore: {}", error));
                return Ok(RestoreOutcome::Failed { error });
            }
        };

        if let RestoreOutcome::Restored { key, .. } = &outcome {
            if key == primary_key {
                self.logger.info(&format!("Cache hit for: {}", key));
            } else {
                self.logger.info(&format!("Cache hit for restore-key: {}", key));
            }
            self.logger.info(&format!("Cache restored from key: {}", key));
        }
        Ok(outcome)
    }

    async fn restore_matching(
        &self,
        workspace: &Path,
        cache_dir: &Path,
        keys: &[String],
        method: CompressionMethod,
        options: &RestoreOptions,
    ) -> ActkitResult<RestoreOutcome> {
        let candidates = list_cache_keys(cache_dir).await?;

        let Some((key, candidate)) = find_match(keys, &candidates) else {
            self.logger.info(&format!(
                "Cache not found for input keys: {}",
                keys.join(", ")
            ));
            return Ok(RestoreOutcome::Miss);
        };
        let cache_file = format!("{}{}", candidate, CACHE_FILE_SUFFIX);

        if options.lookup_only {
            self.logger
                .info(&format!("Cache found and can be restored from key: {}", key));
            return Ok(RestoreOutcome::Found {
                key: key.to_string(),
                cache_file,
            });
        }

        let archive = cache_dir.join(&cache_file);
        let size = fs::metadata(&archive)
            .await
            .map_err(|e| ActkitError::io(format!("reading {}", archive.display()), e))?
            .len();
        self.logger
            .info(&format!("Cache Size: ~{} ({} B)", format_bytes(size), size));

        let method = CompressionMethod::for_archive(&archive, method).await;
        let scratch = temp_root(workspace).join(Uuid::new_v4().to_string());

        let result = self.extract(&archive, workspace, &scratch, method).await;
        if let Err(e) = fs::remove_dir_all(&scratch).await {
            self.logger
                .debug(&format!("Failed to delete {}: {}", scratch.display(), e));
        }
        result?;

        Ok(RestoreOutcome::Restored {
            key: key.to_string(),
            cache_file,
        })
    }

    async fn extract(
        &self,
        archive: &Path,
        workspace: &Path,
        scratch: &Path,
        method: CompressionMethod,
    ) -> ActkitResult<()> {
        if self.logger.debug_enabled() {
            let listing = self.transport.list(archive, scratch, method).await?;
            self.logger.debug(listing.trim_end());
        }
        self.transport
            .extract(archive, workspace, scratch, method)
            .await
    }

    /// Archive `paths` and store them as `<key>-<version>.cache`
    ///
    /// Fails (soft) if that file already exists; caches are never overwritten.
    pub async fn save_cache(
        &self,
        ctx: &RunContext,
        paths: &[String],
        key: &str,
        options: &SaveOptions,
    ) -> ActkitResult<SaveOutcome> {
        let workspace = ctx.env().workspace()?;
        ctx.env().cache_dir()?;
        check_paths(paths)?;
        check_key(key)?;

        let method = self.transport.compression_method().await;
        let cache_paths = resolve_paths(paths, workspace)?;
        self.logger.debug(&format!("Cache Paths: {:?}", cache_paths));
        if cache_paths.is_empty() {
            return Err(ActkitError::validation(
                "Path Validation Error: Path(s) specified in the action for caching do(es) not exist, hence no cache is being saved.",
            ));
        }

        let archive_folder = temp_root(workspace).join(Uuid::new_v4().to_string());
        let result = self
            .archive_and_store(
                ctx,
                &archive_folder,
                &cache_paths,
                paths,
                key,
                method,
                options,
            )
            .await;

        if let Err(e) = fs::remove_dir_all(&archive_folder).await {
            self.logger
                .debug(&format!("Failed to delete archive: {}", e));
        }

        match result {
            Ok(outcome) => Ok(outcome),
            Err(error) => {
                self.logger.warning(&format!("Failed to save: {}", error));
                Ok(SaveOutcome::Failed { error })
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn archive_and_store(
        &self,
        ctx: &RunContext,
        archive_folder: &Path,
        cache_paths: &[String],
        paths: &[String],
        key: &str,
        method: CompressionMethod,
        options: &SaveOptions,
    ) -> ActkitResult<SaveOutcome> {
        let workspace = ctx.env().workspace()?;
        let cache_dir = ctx.env().cache_dir()?;

        let archive = self
            .transport
            .create(archive_folder, cache_paths, workspace, method)
            .await?;
        let size = fs::metadata(&archive)
            .await
            .map_err(|e| ActkitError::io(format!("reading {}", archive.display()), e))?
            .len();
        self.logger
            .debug(&format!("File Size: {} ({} B)", format_bytes(size), size));

        let version = cache_version(paths, Some(method), options.cross_os_archive, self.transport.os());
        let cache_file = cache_file_name(key, &version);
        let target = cache_dir.join(&cache_file);

        // Existence probe, not an atomic reservation
        let reserved = fs::try_exists(&target)
            .await
            .map_err(|e| ActkitError::io(format!("checking {}", target.display()), e))?;
        if reserved {
            return Err(ActkitError::ReserveCache(format!(
                "Unable to reserve cache with key {}, another job may be creating this cache.",
                key
            )));
        }

        fs::create_dir_all(cache_dir)
            .await
            .map_err(|e| ActkitError::io(format!("creating {}", cache_dir.display()), e))?;
        fs::copy(&archive, &target)
            .await
            .map_err(|e| ActkitError::io(format!("copying archive to {}", target.display()), e))?;

        let cache_id = ctx.registry().register_cache(cache_file.clone());
        self.logger.info(&format!("Cache saved with key: {}", key));

        Ok(SaveOutcome::Saved {
            cache_id,
            key: key.to_string(),
            cache_file,
        })
    }
}

/// Cache file names in `cache_dir` with the suffix stripped, sorted
async fn list_cache_keys(cache_dir: &Path) -> ActkitResult<Vec<String>> {
    if !cache_dir.exists() {
        return Ok(vec![]);
    }

    let mut keys = vec![];
    let mut entries = fs::read_dir(cache_dir)
        .await
        .map_err(|e| ActkitError::io(format!("reading {}", cache_dir.display()), e))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ActkitError::io("reading cache entry", e))?
    {
        if let Some(name) = entry.file_name().to_str() {
            if let Some(stem) = name.strip_suffix(CACHE_FILE_SUFFIX) {
                keys.push(stem.to_string());
            }
        }
    }

    keys.sort();
    Ok(keys)
}

/// First key (in priority order) that prefixes any candidate
fn find_match<'a>(keys: &'a [String], candidates: &'a [String]) -> Option<(&'a str, &'a str)> {
    keys.iter().find_map(|key| {
        candidates
            .iter()
            .find(|candidate| candidate.starts_with(key.as_str()))
            .map(|candidate| (key.as_str(), candidate.as_str()))
    })
}
