//! Glob resolution for cached paths
//!
//! Patterns are resolved against the workspace and returned relative to it,
//! which is what tar receives through the manifest.

use crate::error::{ActkitError, ActkitResult};
use glob::{MatchOptions, Pattern};
use std::collections::HashSet;
use std::path::{Path, MAIN_SEPARATOR};
use tracing::debug;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Resolve glob patterns to existing paths, relative to `workspace`
///
/// Supports `**`, `~/` expansion, `#` comments and `!` exclusions. Each
/// input may hold several newline-separated patterns. Paths outside the
/// workspace stay absolute.
pub fn resolve_paths(patterns: &[String], workspace: &Path) -> ActkitResult<Vec<String>> {
    let mut includes = Vec::new();
    let mut excludes = Vec::new();

    for line in patterns.iter().flat_map(|p| p.lines()) {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match line.strip_prefix('!') {
            Some(negated) => {
                let pattern = absolute_pattern(negated.trim(), workspace);
                excludes.push(Pattern::new(&pattern).map_err(|e| invalid_pattern(negated, e))?);
            }
            None => includes.push((line, absolute_pattern(line, workspace))),
        }
    }

    let mut seen = HashSet::new();
    let mut resolved = Vec::new();

    for (original, pattern) in includes {
        let entries =
            glob::glob_with(&pattern, MATCH_OPTIONS).map_err(|e| invalid_pattern(original, e))?;

        for entry in entries {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    debug!("Skipping unreadable path: {}", e);
                    continue;
                }
            };
            if excludes
                .iter()
                .any(|p| p.matches_path_with(&path, MATCH_OPTIONS))
            {
                continue;
            }

            let relative = relative_to(&path, workspace);
            if seen.insert(relative.clone()) {
                debug!("Matched {}", relative);
                resolved.push(relative);
            }
        }
    }

    Ok(resolved)
}

fn invalid_pattern(pattern: &str, err: glob::PatternError) -> ActkitError {
    ActkitError::validation(format!(
        "Path Validation Error: {} is not a valid pattern: {}",
        pattern, err.msg
    ))
}

/// Anchor a pattern at the workspace (or home for `~`), escaping the anchor
fn absolute_pattern(pattern: &str, workspace: &Path) -> String {
    let trimmed = pattern.trim_end_matches(['/', '\\']);
    let trimmed = if trimmed.is_empty() { pattern } else { trimmed };

    if trimmed == "." {
        return Pattern::escape(&workspace.to_string_lossy());
    }

    if trimmed == "~" || trimmed.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            let rest = trimmed.trim_start_matches('~').trim_start_matches('/');
            return join_escaped(&home, rest);
        }
    }

    if Path::new(trimmed).is_absolute() {
        trimmed.to_string()
    } else {
        join_escaped(workspace, trimmed)
    }
}

fn join_escaped(anchor: &Path, rest: &str) -> String {
    let anchor = Pattern::escape(&anchor.to_string_lossy());
    if rest.is_empty() {
        anchor
    } else {
        format!("{}{}{}", anchor.trim_end_matches(MAIN_SEPARATOR), MAIN_SEPARATOR, rest)
    }
}

fn relative_to(path: &Path, workspace: &Path) -> String {
    match path.strip_prefix(workspace) {
        Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
        Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
        Err(_) => path.to_string_lossy().replace('\\', "/"),
    }
}
