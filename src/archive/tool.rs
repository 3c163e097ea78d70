//! Tar binary resolution
//!
//! GNU tar is preferred everywhere because it behaves the same across hosts;
//! each OS has its own fallback.

use crate::archive::platform::HostOs;
use crate::archive::process::{ProcessRunner, ToolCommand};
use crate::error::{ActkitError, ActkitResult};
use std::path::PathBuf;
use tracing::debug;

/// Flavor of the tar binary, which changes the arguments it accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveToolType {
    Gnu,
    Bsd,
}

/// A located tar binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveTool {
    pub path: PathBuf,
    pub flavor: ArchiveToolType,
}

impl ArchiveTool {
    pub fn new(path: impl Into<PathBuf>, flavor: ArchiveToolType) -> Self {
        Self {
            path: path.into(),
            flavor,
        }
    }

    pub fn is_gnu(&self) -> bool {
        self.flavor == ArchiveToolType::Gnu
    }

    /// Locate tar for `os`
    pub async fn resolve(os: HostOs, runner: &dyn ProcessRunner) -> ActkitResult<Self> {
        let tool = match os {
            HostOs::Windows => resolve_windows(runner).await?,
            HostOs::MacOs => resolve_macos(runner)?,
            HostOs::Linux => resolve_default(runner)?,
        };
        debug!("Using {:?} tar at {}", tool.flavor, tool.path.display());
        Ok(tool)
    }
}

fn resolve_default(runner: &dyn ProcessRunner) -> ActkitResult<ArchiveTool> {
    runner
        .which("tar")
        .map(|path| ArchiveTool::new(path, ArchiveToolType::Gnu))
        .ok_or_else(|| ActkitError::ArchiveToolNotFound("tar".to_string()))
}

fn resolve_macos(runner: &dyn ProcessRunner) -> ActkitResult<ArchiveTool> {
    if let Some(gtar) = runner.which("gtar") {
        return Ok(ArchiveTool::new(gtar, ArchiveToolType::Gnu));
    }
    runner
        .which("tar")
        .map(|path| ArchiveTool::new(path, ArchiveToolType::Bsd))
        .ok_or_else(|| ActkitError::ArchiveToolNotFound("tar".to_string()))
}

async fn resolve_windows(runner: &dyn ProcessRunner) -> ActkitResult<ArchiveTool> {
    if let Some(gnu) = gnu_tar_on_windows(runner).await {
        return Ok(ArchiveTool::new(gnu, ArchiveToolType::Gnu));
    }

    let system_drive = runner
        .env_var("SYSTEMDRIVE")
        .unwrap_or_else(|| "C:".to_string());
    let system_tar = PathBuf::from(format!("{}\\Windows\\System32\\tar.exe", system_drive));
    if runner.is_file(&system_tar) {
        return Ok(ArchiveTool::new(system_tar, ArchiveToolType::Bsd));
    }

    Err(ActkitError::ArchiveToolNotFound(
        "tar (checked Git for Windows and System32)".to_string(),
    ))
}

/// Git for Windows ships GNU tar; a `tar` on PATH counts if it reports GNU
async fn gnu_tar_on_windows(runner: &dyn ProcessRunner) -> Option<PathBuf> {
    if let Some(program_files) = runner.env_var("PROGRAMFILES") {
        let git_tar = PathBuf::from(format!("{}\\Git\\usr\\bin\\tar.exe", program_files));
        if runner.is_file(&git_tar) {
            return Some(git_tar);
        }
    }

    let tar = runner.which("tar")?;
    let version = ToolCommand::new(tar.to_string_lossy()).arg("--version");
    match runner.output(&version, None).await {
        Ok(out) if out.success && out.stdout.to_ascii_lowercase().contains("gnu tar") => Some(tar),
        _ => None,
    }
}
