//! Artifact name, file path and root directory validation

use crate::error::{ActkitError, ActkitResult};
use std::path::Path;

/// Characters rejected in file paths, with their descriptions
const INVALID_PATH_CHARACTERS: &[(char, &str)] = &[
    ('"', " Double quote \""),
    (':', " Colon :"),
    ('<', " Less than <"),
    ('>', " Greater than >"),
    ('|', " Vertical bar |"),
    ('*', " Asterisk *"),
    ('?', " Question mark ?"),
    ('\r', " Carriage return \\r"),
    ('\n', " Line feed \\n"),
];

/// Names additionally reject path separators
const INVALID_NAME_CHARACTERS: &[(char, &str)] = &[
    ('\\', " Backslash \\"),
    ('/', " Forward slash /"),
];

fn name_characters() -> impl Iterator<Item = &'static (char, &'static str)> {
    INVALID_PATH_CHARACTERS
        .iter()
        .chain(INVALID_NAME_CHARACTERS.iter())
}

fn describe<'a>(table: impl Iterator<Item = &'a (char, &'a str)>) -> String {
    table.map(|(_, d)| *d).collect::<Vec<_>>().join(",")
}

/// Reject empty names and names with characters that break NTFS and friends
pub fn validate_artifact_name(name: &str) -> ActkitResult<()> {
    if name.is_empty() {
        return Err(ActkitError::validation(
            "Provided artifact name input during validation is empty",
        ));
    }

    if let Some((_, description)) = name_characters().find(|(c, _)| name.contains(*c)) {
        return Err(ActkitError::validation(format!(
            "The artifact name is not valid: {}. Contains the following character: {}\n\n\
             Invalid characters include: {}\n\n\
             These characters are not allowed in the artifact name due to limitations with certain \
             file systems such as NTFS. To maintain file system agnostic behavior, these characters \
             are intentionally not allowed to prevent potential problems with downloads on different \
             file systems.",
            name,
            description,
            describe(name_characters())
        )));
    }
    Ok(())
}

/// Reject empty upload paths and paths with forbidden characters
pub fn validate_file_path(path: &str) -> ActkitResult<()> {
    if path.is_empty() {
        return Err(ActkitError::validation(
            "Provided file path input during validation is empty",
        ));
    }

    if let Some((_, description)) = INVALID_PATH_CHARACTERS
        .iter()
        .find(|(c, _)| path.contains(*c))
    {
        return Err(ActkitError::validation(format!(
            "The path for one of the files in artifact is not valid: {}. Contains the following character: {}\n\n\
             Invalid characters include: {}\n\n\
             The following characters are not allowed in files that are uploaded due to limitations \
             with certain file systems such as NTFS. To maintain file system agnostic behavior, these \
             characters are intentionally not allowed to prevent potential problems with downloads on \
             different file systems.",
            path,
            description,
            describe(INVALID_PATH_CHARACTERS.iter())
        )));
    }
    Ok(())
}

/// The root directory must exist and be a directory
pub fn validate_root_directory(root: &Path) -> ActkitResult<()> {
    let metadata = std::fs::metadata(root).map_err(|_| {
        ActkitError::validation(format!(
            "The provided rootDirectory {} does not exist",
            root.display()
        ))
    })?;
    if !metadata.is_dir() {
        return Err(ActkitError::validation(format!(
            "The provided rootDirectory {} is not a valid directory",
            root.display()
        )));
    }
    Ok(())
}
