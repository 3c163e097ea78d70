//! Per-run registry of known artifacts and caches
//!
//! Artifact names are not unique; lookups by name resolve to the record with
//! the highest id ("latest wins"). Artifact ids are never reused: the CLI
//! keeps records and the last issued id in `artifacts.json` next to the zips.

use crate::error::{ActkitError, ActkitResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::time::SystemTime;
use tokio::fs;
use tracing::debug;

/// Maximum number of artifacts a run may hold at once
pub const MAX_ARTIFACTS: usize = 10;

/// Suffix of cache files in the cache directory
pub const CACHE_FILE_SUFFIX: &str = ".cache";

/// Artifact index kept in the artifact directory
pub const ARTIFACT_INDEX_FILE: &str = "artifacts.json";

/// On-disk form of the artifact side of the registry
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArtifactIndex {
    last_artifact_id: u64,
    artifacts: Vec<ArtifactRecord>,
}

/// A finalized artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRecord {
    pub name: String,
    pub id: u64,
    pub size: u64,
    pub created_at: Option<DateTime<Utc>>,
    /// Hex sha256 of the zip, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Known artifacts and caches for the current run
#[derive(Debug, Default, Clone)]
pub struct Registry {
    artifacts: Vec<ArtifactRecord>,
    caches: BTreeMap<u64, String>,
    last_artifact_id: u64,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Artifacts in insertion order
    pub fn artifacts(&self) -> &[ArtifactRecord] {
        &self.artifacts
    }

    /// Cache id to cache file name
    pub fn caches(&self) -> &BTreeMap<u64, String> {
        &self.caches
    }

    /// Whether any record carries this name
    pub fn has_artifact_named(&self, name: &str) -> bool {
        self.artifacts.iter().any(|a| a.name == name)
    }

    /// Whether the run already holds the maximum number of artifacts
    pub fn is_full(&self) -> bool {
        self.artifacts.len() >= MAX_ARTIFACTS
    }

    /// Register a new artifact, assigning the next id
    pub fn register_artifact(
        &mut self,
        name: &str,
        size: u64,
        digest: Option<String>,
    ) -> ArtifactRecord {
        self.last_artifact_id += 1;
        let record = ArtifactRecord {
            name: name.to_string(),
            id: self.last_artifact_id,
            size,
            created_at: Some(Utc::now()),
            digest,
        };
        self.artifacts.push(record.clone());
        record
    }

    /// Insert an existing record as-is; ids assigned later stay above it
    pub fn insert_artifact(&mut self, record: ArtifactRecord) {
        self.last_artifact_id = self.last_artifact_id.max(record.id);
        self.artifacts.push(record);
    }

    /// Remove the record with this id
    pub fn remove_artifact(&mut self, id: u64) -> Option<ArtifactRecord> {
        let index = self.artifacts.iter().position(|a| a.id == id)?;
        Some(self.artifacts.remove(index))
    }

    /// Look up a record by id
    pub fn find_artifact(&self, id: u64) -> Option<&ArtifactRecord> {
        self.artifacts.iter().find(|a| a.id == id)
    }

    /// Highest-id record with this name
    pub fn latest_named(&self, name: &str) -> Option<&ArtifactRecord> {
        self.artifacts
            .iter()
            .filter(|a| a.name == name)
            .max_by_key(|a| a.id)
    }

    /// One record per name (the highest id), sorted by id descending
    pub fn latest_artifacts(&self) -> Vec<ArtifactRecord> {
        let mut sorted = self.artifacts.clone();
        sorted.sort_by(|a, b| b.id.cmp(&a.id));

        let mut seen = HashSet::new();
        sorted
            .into_iter()
            .filter(|a| seen.insert(a.name.clone()))
            .collect()
    }

    /// One greater than the highest cache id; 1 when no cache is known
    pub fn next_cache_id(&self) -> u64 {
        self.caches.keys().next_back().map_or(1, |max| max + 1)
    }

    /// Record a saved cache file and return its id
    pub fn register_cache(&mut self, file_name: impl Into<String>) -> u64 {
        let id = self.next_cache_id();
        self.caches.insert(id, file_name.into());
        id
    }

    /// Rebuild a registry from files left on disk by earlier invocations
    ///
    /// Artifacts come from the index, dropping records whose zip is gone.
    /// Zips the index does not know get fresh ids in modification order.
    /// Caches are numbered in name order. Missing directories contribute
    /// nothing.
    pub async fn hydrate(
        artifact_dir: Option<&Path>,
        cache_dir: Option<&Path>,
    ) -> ActkitResult<Self> {
        let mut registry = Self::new();

        if let Some(dir) = artifact_dir {
            let index = load_index(dir).await?;
            registry.last_artifact_id = index.last_artifact_id;

            let mut zips = Vec::new();
            for (path, meta) in list_files(dir).await? {
                let Some(name) = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .and_then(|n| n.strip_suffix(".zip"))
                else {
                    continue;
                };
                let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
                zips.push((modified, name.to_string(), meta.len()));
            }
            zips.sort();

            let on_disk: HashSet<&str> = zips.iter().map(|(_, name, _)| name.as_str()).collect();
            for record in index.artifacts {
                if on_disk.contains(record.name.as_str()) {
                    registry.insert_artifact(record);
                } else {
                    debug!("Dropping artifact {} (ID: {}): zip is missing", record.name, record.id);
                }
            }

            for (modified, name, size) in zips {
                if registry.has_artifact_named(&name) {
                    continue;
                }
                registry.last_artifact_id += 1;
                registry.artifacts.push(ArtifactRecord {
                    name,
                    id: registry.last_artifact_id,
                    size,
                    created_at: Some(DateTime::<Utc>::from(modified)),
                    digest: None,
                });
            }
        }

        if let Some(dir) = cache_dir {
            let mut names: Vec<String> = list_files(dir)
                .await?
                .into_iter()
                .filter_map(|(path, _)| path.file_name()?.to_str().map(str::to_string))
                .filter(|n| n.ends_with(CACHE_FILE_SUFFIX))
                .collect();
            names.sort();
            for name in names {
                registry.register_cache(name);
            }
        }

        debug!(
            "Hydrated registry: {} artifacts, {} caches",
            registry.artifacts.len(),
            registry.caches.len()
        );
        Ok(registry)
    }

    /// Write the artifact records and last issued id to the index
    pub async fn save_artifacts(&self, artifact_dir: &Path) -> ActkitResult<()> {
        fs::create_dir_all(artifact_dir)
            .await
            .map_err(|e| ActkitError::io(format!("creating {}", artifact_dir.display()), e))?;

        let index = ArtifactIndex {
            last_artifact_id: self.last_artifact_id,
            artifacts: self.artifacts.clone(),
        };
        let content = serde_json::to_string_pretty(&index)?;

        let path = artifact_dir.join(ARTIFACT_INDEX_FILE);
        let staged = path.with_extension("json.tmp");
        fs::write(&staged, content)
            .await
            .map_err(|e| ActkitError::io(format!("writing {}", staged.display()), e))?;
        fs::rename(&staged, &path)
            .await
            .map_err(|e| ActkitError::io(format!("replacing {}", path.display()), e))?;

        debug!("Saved {} artifact record(s) to {}", index.artifacts.len(), path.display());
        Ok(())
    }
}

async fn load_index(dir: &Path) -> ActkitResult<ArtifactIndex> {
    let path = dir.join(ARTIFACT_INDEX_FILE);
    if !path.exists() {
        return Ok(ArtifactIndex::default());
    }

    let content = fs::read_to_string(&path)
        .await
        .map_err(|e| ActkitError::io(format!("reading {}", path.display()), e))?;
    Ok(serde_json::from_str(&content)?)
}

async fn list_files(dir: &Path) -> ActkitResult<Vec<(std::path::PathBuf, std::fs::Metadata)>> {
    if !dir.exists() {
        return Ok(vec![]);
    }

    let mut files = vec![];
    let mut entries = fs::read_dir(dir)
        .await
        .map_err(|e| ActkitError::io(format!("reading directory {}", dir.display()), e))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ActkitError::io(format!("reading entry in {}", dir.display()), e))?
    {
        let meta = entry
            .metadata()
            .await
            .map_err(|e| ActkitError::io(format!("reading metadata of {}", entry.path().display()), e))?;
        if meta.is_file() {
            files.push((entry.path(), meta));
        }
    }

    Ok(files)
}
