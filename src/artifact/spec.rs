//! Zip specification: which files go into an artifact, and under what name
//!
//! Built once per upload from the caller's file list and root directory.
//! Every entry's destination is its path relative to the root directory.

use crate::artifact::validate::validate_file_path;
use crate::error::{ActkitError, ActkitResult};
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

/// What a zip entry is built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file, read at write time
    File(PathBuf),
    /// Empty directory entry
    Directory,
    /// Link entry pointing at the resolved target
    Symlink(PathBuf),
}

/// One planned zip entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadZipEntry {
    pub kind: EntryKind,
    /// Archive-relative path with `/` separators
    pub destination: String,
    /// Unix permission bits, when the platform has them
    pub mode: Option<u32>,
}

impl UploadZipEntry {
    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_symlink(&self) -> bool {
        matches!(self.kind, EntryKind::Symlink(_))
    }
}

/// Make `path` absolute and fold `.`/`..` without touching the filesystem
pub fn normalize_path(path: &Path) -> ActkitResult<PathBuf> {
    let absolute = std::path::absolute(path)
        .map_err(|e| ActkitError::io(format!("resolving {}", path.display()), e))?;

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    Ok(normalized)
}

#[cfg(unix)]
fn mode_of(metadata: &std::fs::Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(metadata.permissions().mode())
}

#[cfg(not(unix))]
fn mode_of(_metadata: &std::fs::Metadata) -> Option<u32> {
    None
}

/// Real path of a link; a dangling link keeps its stored target
fn link_target(link: &Path) -> ActkitResult<PathBuf> {
    match std::fs::canonicalize(link) {
        Ok(target) => Ok(target),
        Err(_) => std::fs::read_link(link)
            .map_err(|e| ActkitError::io(format!("reading link {}", link.display()), e)),
    }
}

/// Plan the zip entries for `files` under `root_directory`
///
/// Files become file entries; directories become empty directory entries
/// (their contents are only included if listed too). Symlinks are kept as
/// links to their resolved target. The root directory itself is skipped, and
/// a path listed twice is planned once.
pub fn upload_zip_specification(
    files: &[PathBuf],
    root_directory: &Path,
) -> ActkitResult<Vec<UploadZipEntry>> {
    let root = normalize_path(root_directory)?;
    let mut specification = Vec::with_capacity(files.len());
    let mut seen = HashSet::new();

    for file in files {
        let metadata = std::fs::symlink_metadata(file).map_err(|_| {
            ActkitError::validation(format!("File {} does not exist", file.display()))
        })?;

        let path = normalize_path(file)?;
        let relative = path.strip_prefix(&root).map_err(|_| {
            ActkitError::validation(format!(
                "The rootDirectory: {} is not a parent directory of the file: {}",
                root.display(),
                path.display()
            ))
        })?;

        let destination = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if destination.is_empty() || seen.contains(&destination) {
            continue;
        }
        validate_file_path(&destination)?;

        let file_type = metadata.file_type();
        let kind = if file_type.is_symlink() {
            EntryKind::Symlink(link_target(file)?)
        } else if file_type.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File(path.clone())
        };
        seen.insert(destination.clone());
        specification.push(UploadZipEntry {
            kind,
            destination,
            mode: mode_of(&metadata),
        });
    }

    Ok(specification)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("dist/assets")).unwrap();
        fs::write(dir.path().join("dist/index.html"), "<html/>").unwrap();
        fs::write(dir.path().join("dist/assets/app.js"), "run()").unwrap();
        dir
    }

    #[test]
    fn files_and_directories() {
        let dir = tree();
        let root = dir.path().join("dist");
        let files = vec![
            root.join("index.html"),
            root.join("assets"),
            root.join("assets/app.js"),
        ];

        let spec = upload_zip_specification(&files, &root).unwrap();
        let destinations: Vec<_> = spec.iter().map(|e| e.destination.as_str()).collect();
        assert_eq!(destinations, vec!["index.html", "assets", "assets/app.js"]);

        assert!(!spec[0].is_directory());
        assert!(spec[1].is_directory());
        assert_eq!(
            spec[2].kind,
            EntryKind::File(normalize_path(&root.join("assets/app.js")).unwrap())
        );
    }

    #[test]
    fn dot_segments_are_folded() {
        let dir = tree();
        let root = dir.path().join("dist/./assets/..");
        let files = vec![dir.path().join("dist/assets/../index.html")];

        let spec = upload_zip_specification(&files, &root).unwrap();
        assert_eq!(spec[0].destination, "index.html");
    }

    #[test]
    fn file_outside_root_rejected() {
        let dir = tree();
        let root = dir.path().join("dist/assets");
        let err = upload_zip_specification(&[dir.path().join("dist/index.html")], &root).unwrap_err();
        assert!(err
            .to_string()
            .contains("is not a parent directory of the file"));
    }

    #[test]
    fn missing_file_rejected() {
        let dir = tree();
        let missing = dir.path().join("dist/missing.txt");
        let err = upload_zip_specification(&[missing.clone()], dir.path()).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("File {} does not exist", missing.display())
        );
    }

    #[test]
    fn root_itself_is_skipped() {
        let dir = tree();
        let root = dir.path().join("dist");
        let spec = upload_zip_specification(&[root.clone()], &root).unwrap();
        assert!(spec.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn invalid_characters_in_path_rejected() {
        let dir = tree();
        let root = dir.path().join("dist");
        let odd = root.join("what?.txt");
        fs::write(&odd, "").unwrap();

        let err = upload_zip_specification(&[odd], &root).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("Question mark ?"));
    }

    #[cfg(unix)]
    #[test]
    fn permissions_recorded() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tree();
        let root = dir.path().join("dist");
        let script = root.join("run.sh");
        fs::write(&script, "#!/bin/sh").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let spec = upload_zip_specification(&[script], &root).unwrap();
        assert_eq!(spec[0].mode.map(|m| m & 0o777), Some(0o755));
    }

    #[test]
    fn repeated_paths_planned_once() {
        let dir = tree();
        let root = dir.path().join("dist");
        let files = vec![
            root.join("index.html"),
            root.join("assets/../index.html"),
            root.join("index.html"),
        ];

        let spec = upload_zip_specification(&files, &root).unwrap();
        assert_eq!(spec.len(), 1);
        assert_eq!(spec[0].destination, "index.html");
    }

    #[cfg(unix)]
    #[test]
    fn symlink_to_directory_is_a_link_entry() {
        let dir = tree();
        let root = dir.path().join("dist");
        let link = root.join("current");
        std::os::unix::fs::symlink(root.join("assets"), &link).unwrap();

        let spec = upload_zip_specification(&[link], &root).unwrap();
        assert_eq!(spec.len(), 1);
        assert!(spec[0].is_symlink());
        assert!(!spec[0].is_directory());
        assert_eq!(
            spec[0].kind,
            EntryKind::Symlink(fs::canonicalize(root.join("assets")).unwrap())
        );
    }

    #[cfg(unix)]
    #[test]
    fn symlink_to_file_is_a_link_entry() {
        let dir = tree();
        let root = dir.path().join("dist");
        let link = root.join("latest.html");
        std::os::unix::fs::symlink(root.join("index.html"), &link).unwrap();

        let spec = upload_zip_specification(&[link], &root).unwrap();
        assert_eq!(spec[0].destination, "latest.html");
        assert_eq!(
            spec[0].kind,
            EntryKind::Symlink(fs::canonicalize(root.join("index.html")).unwrap())
        );
    }
}
