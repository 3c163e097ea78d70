//! Artifact store: upload, download, list, get and delete
//!
//! Artifacts live in the artifact directory as `<name>.zip`; the run's
//! `Registry` holds their records. Every operation first requires the
//! artifact directory and refuses to run against an enterprise server.
//! Failures are logged with retry guidance and then returned.

use crate::artifact::spec::upload_zip_specification;
use crate::artifact::validate::{validate_artifact_name, validate_root_directory};
use crate::artifact::zip_stream::{digest_file, extract_zip, write_zip, DEFAULT_COMPRESSION_LEVEL};
use crate::cache::format_bytes;
use crate::error::{ActkitError, ActkitResult};
use crate::logger::Logger;
use crate::session::{ArtifactRecord, RunContext, MAX_ARTIFACTS};
use serde::Serialize;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

/// Options for `upload`
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    /// Deflate level 0-9; 0 stores entries uncompressed
    pub compression_level: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub size: u64,
    pub id: u64,
    pub digest: String,
}

/// Options for `download`
#[derive(Debug, Clone, Default)]
pub struct DownloadOptions {
    /// Destination directory; defaults to the workspace
    pub path: Option<PathBuf>,
    /// Hex sha256 the zip is expected to have
    pub expected_hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResponse {
    pub download_path: PathBuf,
    pub digest_mismatch: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListArtifactsResponse {
    pub artifacts: Vec<ArtifactRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetArtifactResponse {
    pub artifact: ArtifactRecord,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteArtifactResponse {
    pub id: u64,
}

/// Zip file backing an artifact name
pub fn artifact_file(artifact_dir: &Path, name: &str) -> PathBuf {
    artifact_dir.join(format!("{}.zip", name))
}

fn guidance(operation: &str, error: &ActkitError) -> String {
    format!(
        "{} failed with error: {}.\n\n\
         Errors can be temporary, so please try again and optionally run the action with debug mode enabled for more information.\n\n\
         If the error persists, please check whether Actions is operating normally at [https://githubstatus.com](https://www.githubstatus.com).",
        operation, error
    )
}

fn name_not_found(name: &str) -> ActkitError {
    ActkitError::ArtifactNotFound(format!(
        "Artifact not found for name: {}\n\
         Please ensure that your artifact is not expired and the artifact was uploaded using a compatible version of upload-artifact.",
        name
    ))
}

/// Local artifact storage for one run
pub struct ArtifactStore {
    logger: Arc<dyn Logger>,
}

impl ArtifactStore {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }

    /// Artifact directory, after the enterprise-server check
    fn artifact_dir<'a>(&self, ctx: &'a RunContext) -> ActkitResult<&'a Path> {
        let dir = ctx.env().artifact_dir()?;
        if ctx.env().is_ghes() {
            return Err(ActkitError::GhesNotSupported);
        }
        Ok(dir)
    }

    async fn guarded<T>(
        &self,
        operation: &str,
        work: impl Future<Output = ActkitResult<T>>,
    ) -> ActkitResult<T> {
        work.await.map_err(|e| {
            self.logger.warning(&guidance(operation, &e));
            e
        })
    }

    /// Zip `files` (relative to `root_directory`) into a new artifact
    pub async fn upload(
        &self,
        ctx: &RunContext,
        name: &str,
        files: &[PathBuf],
        root_directory: &Path,
        options: &UploadOptions,
    ) -> ActkitResult<UploadResponse> {
        self.guarded(
            "Artifact upload",
            self.upload_inner(ctx, name, files, root_directory, options),
        )
        .await
    }

    async fn upload_inner(
        &self,
        ctx: &RunContext,
        name: &str,
        files: &[PathBuf],
        root_directory: &Path,
        options: &UploadOptions,
    ) -> ActkitResult<UploadResponse> {
        let artifact_dir = self.artifact_dir(ctx)?;

        validate_artifact_name(name)?;
        self.logger.info("Artifact name is valid!");
        validate_root_directory(root_directory)?;
        self.logger.info("Root directory input is valid!");

        let specification = upload_zip_specification(files, root_directory)?;
        if specification.is_empty() {
            return Err(ActkitError::FilesNotFound(vec![]));
        }

        {
            let registry = ctx.registry();
            if registry.has_artifact_named(name) {
                return Err(ActkitError::ArtifactExists(name.to_string()));
            }
            if registry.is_full() {
                return Err(ActkitError::ArtifactLimit(MAX_ARTIFACTS));
            }
        }

        fs::create_dir_all(artifact_dir)
            .await
            .map_err(|e| ActkitError::io(format!("creating {}", artifact_dir.display()), e))?;

        let target = artifact_file(artifact_dir, name);
        let level = options
            .compression_level
            .unwrap_or(DEFAULT_COMPRESSION_LEVEL);
        self.logger
            .debug(&format!("Writing {} entries to {}", specification.len(), target.display()));
        let summary = write_zip(specification, target, level).await?;

        self.logger.info(&format!(
            "Finished uploading artifact content. Total of {} bytes uploaded ({})",
            summary.size,
            format_bytes(summary.size)
        ));
        self.logger
            .info(&format!("SHA256 digest of uploaded artifact zip is {}", summary.digest));

        let record = ctx
            .registry()
            .register_artifact(name, summary.size, Some(summary.digest.clone()));
        self.logger.info(&format!(
            "Artifact {}.zip successfully finalized. Artifact ID {}",
            name, record.id
        ));

        Ok(UploadResponse {
            size: summary.size,
            id: record.id,
            digest: summary.digest,
        })
    }

    /// Unpack the artifact with this id into the destination directory
    pub async fn download(
        &self,
        ctx: &RunContext,
        artifact_id: u64,
        options: &DownloadOptions,
    ) -> ActkitResult<DownloadResponse> {
        self.guarded(
            "Download Artifact",
            self.download_inner(ctx, artifact_id, options),
        )
        .await
    }

    async fn download_inner(
        &self,
        ctx: &RunContext,
        artifact_id: u64,
        options: &DownloadOptions,
    ) -> ActkitResult<DownloadResponse> {
        let artifact_dir = self.artifact_dir(ctx)?;

        let download_path = match &options.path {
            Some(path) => path.clone(),
            None => ctx.env().workspace()?.to_path_buf(),
        };
        fs::create_dir_all(&download_path)
            .await
            .map_err(|e| ActkitError::io(format!("creating {}", download_path.display()), e))?;

        let record = ctx.registry().find_artifact(artifact_id).cloned();
        let Some(record) = record else {
            return Err(ActkitError::ArtifactNotFound(format!(
                "No artifacts found for ID: {}\n\
                 Are you trying to download from a different run? Try specifying a github-token with `actions: read` scope.",
                artifact_id
            )));
        };

        let archive = artifact_file(artifact_dir, &record.name);
        self.logger.info(&format!(
            "Downloading artifact '{}' (ID: {}) to {}",
            record.name,
            record.id,
            download_path.display()
        ));

        let mut digest_mismatch = false;
        if let Some(expected) = &options.expected_hash {
            let actual = digest_file(archive.clone()).await?;
            if !actual.eq_ignore_ascii_case(expected) {
                digest_mismatch = true;
                self.logger.warning(&format!(
                    "The downloaded artifact's digest ({}) did not match the expected hash ({})",
                    actual, expected
                ));
            }
        }

        let summary = extract_zip(archive, download_path.clone()).await?;
        for skipped in &summary.skipped {
            self.logger
                .warning(&format!("Skipping unsafe entry outside destination: {}", skipped));
        }
        self.logger.info("Artifact download completed successfully.");

        Ok(DownloadResponse {
            download_path,
            digest_mismatch,
        })
    }

    /// All artifacts, or only the newest record per name when `latest`
    pub async fn list(&self, ctx: &RunContext, latest: bool) -> ActkitResult<ListArtifactsResponse> {
        self.guarded("Listing Artifacts", self.list_inner(ctx, latest))
            .await
    }

    async fn list_inner(&self, ctx: &RunContext, latest: bool) -> ActkitResult<ListArtifactsResponse> {
        self.artifact_dir(ctx)?;

        let artifacts = {
            let registry = ctx.registry();
            if latest {
                registry.latest_artifacts()
            } else {
                registry.artifacts().to_vec()
            }
        };
        self.logger
            .info(&format!("Found {} artifact(s)", artifacts.len()));
        Ok(ListArtifactsResponse { artifacts })
    }

    /// Newest artifact with this name
    pub async fn get(&self, ctx: &RunContext, name: &str) -> ActkitResult<GetArtifactResponse> {
        self.guarded("Get Artifact", self.get_inner(ctx, name)).await
    }

    async fn get_inner(&self, ctx: &RunContext, name: &str) -> ActkitResult<GetArtifactResponse> {
        self.artifact_dir(ctx)?;

        let artifact = ctx
            .registry()
            .latest_named(name)
            .cloned()
            .ok_or_else(|| name_not_found(name))?;
        Ok(GetArtifactResponse { artifact })
    }

    /// Delete the newest artifact with this name and its zip file
    pub async fn delete(&self, ctx: &RunContext, name: &str) -> ActkitResult<DeleteArtifactResponse> {
        self.guarded("Delete Artifact", self.delete_inner(ctx, name))
            .await
    }

    async fn delete_inner(&self, ctx: &RunContext, name: &str) -> ActkitResult<DeleteArtifactResponse> {
        let artifact_dir = self.artifact_dir(ctx)?;

        let record = ctx
            .registry()
            .latest_named(name)
            .cloned()
            .ok_or_else(|| name_not_found(name))?;

        let file = artifact_file(artifact_dir, &record.name);
        match fs::remove_file(&file).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.logger
                    .debug(&format!("{} was already removed", file.display()));
            }
            Err(e) => return Err(ActkitError::io(format!("removing {}", file.display()), e)),
        }

        ctx.registry().remove_artifact(record.id);
        self.logger.info(&format!(
            "Artifact '{}' (ID: {}) deleted",
            record.name, record.id
        ));
        Ok(DeleteArtifactResponse { id: record.id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::{LogLevel, MemoryLogger};
    use crate::session::{Registry, RunEnv};
    use std::fs as stdfs;
    use tempfile::TempDir;

    struct Fixture {
        temp: TempDir,
        logger: Arc<MemoryLogger>,
        store: ArtifactStore,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let dist = temp.path().join("ws/dist");
            stdfs::create_dir_all(dist.join("sub")).unwrap();
            stdfs::write(dist.join("app.bin"), vec![7u8; 4096]).unwrap();
            stdfs::write(dist.join("sub/readme.txt"), "hello").unwrap();

            let logger = Arc::new(MemoryLogger::new());
            let store = ArtifactStore::new(logger.clone());
            Self {
                temp,
                logger,
                store,
            }
        }

        fn env(&self) -> RunEnv {
            RunEnv {
                workspace: Some(self.workspace()),
                artifact_dir: Some(self.artifact_dir()),
                ..RunEnv::default()
            }
        }

        fn ctx(&self) -> RunContext {
            RunContext::new(self.env())
        }

        fn workspace(&self) -> PathBuf {
            self.temp.path().join("ws")
        }

        fn artifact_dir(&self) -> PathBuf {
            self.temp.path().join("artifacts")
        }

        fn root(&self) -> PathBuf {
            self.workspace().join("dist")
        }

        fn files(&self) -> Vec<PathBuf> {
            vec![self.root().join("app.bin"), self.root().join("sub/readme.txt")]
        }

        async fn upload(&self, ctx: &RunContext, name: &str) -> ActkitResult<UploadResponse> {
            self.store
                .upload(ctx, name, &self.files(), &self.root(), &UploadOptions::default())
                .await
        }
    }

    fn record(name: &str, id: u64) -> ArtifactRecord {
        ArtifactRecord {
            name: name.to_string(),
            id,
            size: 10,
            created_at: None,
            digest: None,
        }
    }

    fn seeded(fx: &Fixture) -> RunContext {
        let mut registry = Registry::new();
        registry.insert_artifact(record("a", 1));
        registry.insert_artifact(record("a", 2));
        registry.insert_artifact(record("b", 3));
        stdfs::create_dir_all(fx.artifact_dir()).unwrap();
        stdfs::write(fx.artifact_dir().join("a.zip"), "zip").unwrap();
        stdfs::write(fx.artifact_dir().join("b.zip"), "zip").unwrap();
        RunContext::with_registry(fx.env(), registry)
    }

    #[tokio::test]
    async fn upload_registers_artifact() {
        let fx = Fixture::new();
        let ctx = fx.ctx();

        let response = fx.upload(&ctx, "build").await.unwrap();

        let zip = fx.artifact_dir().join("build.zip");
        assert_eq!(response.id, 1);
        assert_eq!(response.size, stdfs::metadata(&zip).unwrap().len());
        assert_eq!(response.digest, digest_file(zip).await.unwrap());

        let registry = ctx.snapshot();
        assert_eq!(registry.artifacts().len(), 1);
        assert_eq!(registry.artifacts()[0].name, "build");
        assert_eq!(registry.artifacts()[0].digest.as_deref(), Some(response.digest.as_str()));
        assert!(fx.logger.contains(LogLevel::Info, "successfully finalized"));
    }

    #[tokio::test]
    async fn upload_duplicate_name_rejected() {
        let fx = Fixture::new();
        let ctx = fx.ctx();
        fx.upload(&ctx, "x").await.unwrap();

        let err = fx.upload(&ctx, "x").await.unwrap_err();
        assert!(matches!(err, ActkitError::ArtifactExists(ref n) if n == "x"));
        assert_eq!(ctx.snapshot().artifacts().len(), 1);
        assert!(fx
            .logger
            .contains(LogLevel::Warning, "Artifact upload failed with error"));
    }

    #[tokio::test]
    async fn failed_zip_stream_leaves_registry_untouched() {
        let fx = Fixture::new();
        let ctx = fx.ctx();
        fx.upload(&ctx, "first").await.unwrap();
        // The zip cannot be created where a directory already sits
        stdfs::create_dir_all(fx.artifact_dir().join("build.zip")).unwrap();

        let err = fx.upload(&ctx, "build").await.unwrap_err();

        assert!(matches!(err, ActkitError::Io { .. }));
        let mut registry = ctx.snapshot();
        assert_eq!(registry.artifacts().len(), 1);
        assert!(!registry.has_artifact_named("build"));
        // No id was consumed by the failed upload
        assert_eq!(registry.register_artifact("next", 1, None).id, 2);
        assert!(fx
            .logger
            .contains(LogLevel::Warning, "Artifact upload failed with error"));
    }

    #[tokio::test]
    async fn eleventh_artifact_rejected() {
        let fx = Fixture::new();
        let mut registry = Registry::new();
        for id in 1..=10 {
            registry.insert_artifact(record(&format!("art-{id}"), id));
        }
        let ctx = RunContext::with_registry(fx.env(), registry);

        let err = fx.upload(&ctx, "one-more").await.unwrap_err();
        assert!(matches!(err, ActkitError::ArtifactLimit(10)));
        assert!(!fx.artifact_dir().join("one-more.zip").exists());
    }

    #[tokio::test]
    async fn upload_validates_name_first() {
        let fx = Fixture::new();
        let err = fx.upload(&fx.ctx(), "bad<name").await.unwrap_err();
        assert!(err.is_validation());
        assert!(!fx.artifact_dir().exists());
    }

    #[tokio::test]
    async fn upload_with_no_files() {
        let fx = Fixture::new();
        let err = fx
            .store
            .upload(&fx.ctx(), "empty", &[], &fx.root(), &UploadOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ActkitError::FilesNotFound(_)));
    }

    #[tokio::test]
    async fn upload_requires_artifact_dir() {
        let fx = Fixture::new();
        let ctx = RunContext::new(RunEnv {
            workspace: Some(fx.workspace()),
            ..RunEnv::default()
        });
        let err = fx.upload(&ctx, "build").await.unwrap_err();
        assert!(matches!(err, ActkitError::MissingEnv("ACTKIT_ARTIFACT_DIR")));
    }

    #[tokio::test]
    async fn enterprise_server_rejected() {
        let fx = Fixture::new();
        let ctx = RunContext::new(RunEnv {
            server_url: Some("https://github.example.com".to_string()),
            ..fx.env()
        });

        let err = fx.store.list(&ctx, false).await.unwrap_err();
        assert!(matches!(err, ActkitError::GhesNotSupported));
        let err = fx.upload(&ctx, "build").await.unwrap_err();
        assert!(matches!(err, ActkitError::GhesNotSupported));
    }

    #[tokio::test]
    async fn list_latest_keeps_highest_id_per_name() {
        let fx = Fixture::new();
        let ctx = seeded(&fx);

        let all = fx.store.list(&ctx, false).await.unwrap();
        assert_eq!(all.artifacts.len(), 3);

        let latest = fx.store.list(&ctx, true).await.unwrap();
        let pairs: Vec<_> = latest
            .artifacts
            .iter()
            .map(|a| (a.name.as_str(), a.id))
            .collect();
        assert_eq!(pairs, vec![("b", 3), ("a", 2)]);
    }

    #[tokio::test]
    async fn get_returns_latest() {
        let fx = Fixture::new();
        let ctx = seeded(&fx);

        let response = fx.store.get(&ctx, "a").await.unwrap();
        assert_eq!(response.artifact.id, 2);

        let err = fx.store.get(&ctx, "missing").await.unwrap_err();
        assert!(matches!(err, ActkitError::ArtifactNotFound(_)));
        assert!(err.to_string().starts_with("Artifact not found for name: missing"));
    }

    #[tokio::test]
    async fn delete_removes_latest_only() {
        let fx = Fixture::new();
        let ctx = seeded(&fx);

        let response = fx.store.delete(&ctx, "a").await.unwrap();
        assert_eq!(response.id, 2);
        assert!(!fx.artifact_dir().join("a.zip").exists());
        assert!(fx.artifact_dir().join("b.zip").exists());

        let ids: Vec<u64> = ctx.snapshot().artifacts().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 3]);

        let err = fx.store.delete(&ctx, "zzz").await.unwrap_err();
        assert!(matches!(err, ActkitError::ArtifactNotFound(_)));
    }

    #[tokio::test]
    async fn download_extracts_into_path() {
        let fx = Fixture::new();
        let ctx = fx.ctx();
        let uploaded = fx.upload(&ctx, "build").await.unwrap();

        let dest = fx.temp.path().join("out");
        let options = DownloadOptions {
            path: Some(dest.clone()),
            expected_hash: Some(uploaded.digest.clone()),
        };
        let response = fx.store.download(&ctx, uploaded.id, &options).await.unwrap();

        assert_eq!(response.download_path, dest);
        assert!(!response.digest_mismatch);
        assert_eq!(stdfs::read(dest.join("app.bin")).unwrap(), vec![7u8; 4096]);
        assert_eq!(
            stdfs::read_to_string(dest.join("sub/readme.txt")).unwrap(),
            "hello"
        );
    }

    #[tokio::test]
    async fn download_defaults_to_workspace_and_flags_mismatch() {
        let fx = Fixture::new();
        let ctx = fx.ctx();
        let uploaded = fx.upload(&ctx, "build").await.unwrap();

        let options = DownloadOptions {
            expected_hash: Some("0".repeat(64)),
            ..DownloadOptions::default()
        };
        let response = fx.store.download(&ctx, uploaded.id, &options).await.unwrap();

        assert_eq!(response.download_path, fx.workspace());
        assert!(response.digest_mismatch);
        assert!(fx.workspace().join("sub/readme.txt").exists());
        assert!(fx.logger.contains(LogLevel::Warning, "did not match"));
    }

    #[tokio::test]
    async fn download_unknown_id() {
        let fx = Fixture::new();
        let err = fx
            .store
            .download(&fx.ctx(), 42, &DownloadOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("No artifacts found for ID: 42"));
        assert!(fx
            .logger
            .contains(LogLevel::Warning, "Download Artifact failed with error"));
    }
}
