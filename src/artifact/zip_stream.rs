//! Zip creation and extraction for artifacts
//!
//! The writer needs `Seek` to patch local headers, so the archive is written
//! to its final path first and then streamed once more through sha256 to get
//! the digest. Work runs on the blocking pool; file contents are copied in
//! chunks. A zip that fails half way is removed.

use crate::artifact::spec::{EntryKind, UploadZipEntry};
use crate::error::{ActkitError, ActkitResult};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Default deflate level for uploads
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Highest accepted deflate level
pub const MAX_COMPRESSION_LEVEL: u32 = 9;

const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

/// Size and sha256 of a finished zip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipSummary {
    pub size: u64,
    pub digest: String,
}

/// Result of unpacking an artifact
#[derive(Debug, Clone, Default)]
pub struct ExtractSummary {
    pub files: usize,
    pub links: usize,
    /// Entries whose names would land outside the destination
    pub skipped: Vec<String>,
}

fn file_options(compression_level: u32) -> SimpleFileOptions {
    if compression_level == 0 {
        SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
    } else {
        SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(i64::from(compression_level.min(MAX_COMPRESSION_LEVEL))))
    }
}

/// Write `entries` as a zip to `target`, returning its size and digest
pub async fn write_zip(
    entries: Vec<UploadZipEntry>,
    target: PathBuf,
    compression_level: u32,
) -> ActkitResult<ZipSummary> {
    tokio::task::spawn_blocking(move || write_zip_blocking(&entries, &target, compression_level))
        .await
        .map_err(|e| ActkitError::Internal(format!("zip task failed: {}", e)))?
}

fn write_zip_blocking(
    entries: &[UploadZipEntry],
    target: &Path,
    compression_level: u32,
) -> ActkitResult<ZipSummary> {
    let file = File::create(target)
        .map_err(|e| ActkitError::io(format!("creating {}", target.display()), e))?;

    if let Err(e) = write_entries(BufWriter::new(file), entries, target, compression_level) {
        if let Err(remove) = std::fs::remove_file(target) {
            debug!("Failed to remove partial zip {}: {}", target.display(), remove);
        }
        return Err(e);
    }

    let size = std::fs::metadata(target)
        .map_err(|e| ActkitError::io(format!("reading {}", target.display()), e))?
        .len();
    let digest = digest_path(target)?;
    Ok(ZipSummary { size, digest })
}

fn write_entries(
    sink: BufWriter<File>,
    entries: &[UploadZipEntry],
    target: &Path,
    compression_level: u32,
) -> ActkitResult<()> {
    let mut zip = ZipWriter::new(sink);
    for entry in entries {
        let mut options = file_options(compression_level);
        if let Some(mode) = entry.mode {
            options = options.unix_permissions(mode);
        }

        match &entry.kind {
            EntryKind::Directory => {
                debug!("Adding directory {}", entry.destination);
                zip.add_directory(entry.destination.as_str(), options)?;
            }
            EntryKind::Symlink(link_target) => {
                let link_target = link_target.to_string_lossy().into_owned();
                debug!("Adding symlink {} -> {}", entry.destination, link_target);
                zip.add_symlink(entry.destination.as_str(), link_target.as_str(), options)?;
            }
            EntryKind::File(source) => {
                debug!("Adding {} as {}", source.display(), entry.destination);
                zip.start_file(entry.destination.as_str(), options)?;
                let mut reader = File::open(source)
                    .map_err(|e| ActkitError::io(format!("opening {}", source.display()), e))?;
                io::copy(&mut reader, &mut zip)
                    .map_err(|e| ActkitError::io(format!("reading {}", source.display()), e))?;
            }
        }
    }

    let mut sink = zip.finish()?;
    sink.flush()
        .map_err(|e| ActkitError::io(format!("writing {}", target.display()), e))
}

/// Unpack `archive` into `destination`, awaiting completion
pub async fn extract_zip(archive: PathBuf, destination: PathBuf) -> ActkitResult<ExtractSummary> {
    tokio::task::spawn_blocking(move || extract_zip_blocking(&archive, &destination))
        .await
        .map_err(|e| ActkitError::Internal(format!("unzip task failed: {}", e)))?
}

fn extract_zip_blocking(archive: &Path, destination: &Path) -> ActkitResult<ExtractSummary> {
    let file = File::open(archive)
        .map_err(|e| ActkitError::io(format!("opening {}", archive.display()), e))?;
    let mut zip = ZipArchive::new(BufReader::new(file))?;
    let mut summary = ExtractSummary::default();
    let mut links: HashSet<PathBuf> = HashSet::new();

    for index in 0..zip.len() {
        let mut entry = zip.by_index(index)?;
        let Some(relative) = entry.enclosed_name() else {
            summary.skipped.push(entry.name().to_string());
            continue;
        };
        // Never write through a link created earlier in this archive
        if relative.ancestors().skip(1).any(|a| links.contains(a)) {
            summary.skipped.push(entry.name().to_string());
            continue;
        }
        let out_path = destination.join(&relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path)
                .map_err(|e| ActkitError::io(format!("creating {}", out_path.display()), e))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ActkitError::io(format!("creating {}", parent.display()), e))?;
        }

        let mode = entry.unix_mode();
        if mode.is_some_and(|m| m & S_IFMT == S_IFLNK) {
            let mut link_target = String::new();
            entry
                .read_to_string(&mut link_target)
                .map_err(|e| ActkitError::io(format!("reading link {}", entry.name()), e))?;
            create_link(&link_target, &out_path)?;
            links.insert(relative);
            summary.links += 1;
            continue;
        }

        let mut out = File::create(&out_path)
            .map_err(|e| ActkitError::io(format!("creating {}", out_path.display()), e))?;
        io::copy(&mut entry, &mut out)
            .map_err(|e| ActkitError::io(format!("writing {}", out_path.display()), e))?;

        #[cfg(unix)]
        if let Some(mode) = mode {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&out_path, std::fs::Permissions::from_mode(mode & 0o7777))
                .map_err(|e| ActkitError::io(format!("chmod {}", out_path.display()), e))?;
        }

        summary.files += 1;
    }

    Ok(summary)
}

#[cfg(unix)]
fn create_link(link_target: &str, out_path: &Path) -> ActkitResult<()> {
    if std::fs::symlink_metadata(out_path).is_ok() {
        std::fs::remove_file(out_path)
            .map_err(|e| ActkitError::io(format!("replacing {}", out_path.display()), e))?;
    }
    std::os::unix::fs::symlink(link_target, out_path)
        .map_err(|e| ActkitError::io(format!("linking {}", out_path.display()), e))
}

// Windows needs privileges for symlinks; keep the target path as the content
#[cfg(not(unix))]
fn create_link(link_target: &str, out_path: &Path) -> ActkitResult<()> {
    std::fs::write(out_path, link_target)
        .map_err(|e| ActkitError::io(format!("writing {}", out_path.display()), e))
}

fn digest_path(path: &Path) -> ActkitResult<String> {
    let mut file =
        File::open(path).map_err(|e| ActkitError::io(format!("opening {}", path.display()), e))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)
        .map_err(|e| ActkitError::io(format!("reading {}", path.display()), e))?;
    Ok(hex::encode(hasher.finalize()))
}

/// Streaming sha256 of a file on disk, hex encoded
pub async fn digest_file(path: PathBuf) -> ActkitResult<String> {
    tokio::task::spawn_blocking(move || digest_path(&path))
        .await
        .map_err(|e| ActkitError::Internal(format!("digest task failed: {}", e)))?
}
