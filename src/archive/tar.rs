//! Tar command construction and execution
//!
//! Commands are built as argument vectors by pure functions, then executed
//! one after another. Compression is either tar's `-z`, an external program
//! via `--use-compress-program`, or (BSD tar + zstd on Windows) a separate
//! zstd step working on an uncompressed `cache.tar`.

use crate::archive::compression::CompressionMethod;
use crate::archive::platform::HostOs;
use crate::archive::process::{ProcessRunner, SystemRunner, ToolCommand};
use crate::archive::tool::{ArchiveTool, ArchiveToolType};
use crate::error::{ActkitError, ActkitResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::debug;

/// Source list read by `tar --files-from`
pub const MANIFEST_FILE: &str = "manifest.txt";

/// Uncompressed intermediate for the two-step zstd path
pub const TAR_FILE: &str = "cache.tar";

/// What tar should do
#[derive(Debug, Clone, Copy)]
pub enum TarOperation<'a> {
    /// Archive the manifest's sources, relative to `working_dir`
    Create { working_dir: &'a Path },
    /// Unpack `archive` into `working_dir`
    Extract {
        archive: &'a Path,
        working_dir: &'a Path,
    },
    /// Print the members of `archive`
    List { archive: &'a Path },
}

impl TarOperation<'_> {
    fn is_create(&self) -> bool {
        matches!(self, Self::Create { .. })
    }
}

fn slash_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Two-step path: BSD tar cannot drive zstd itself on Windows
fn needs_separate_zstd(tool: &ArchiveTool, method: CompressionMethod, os: HostOs) -> bool {
    tool.flavor == ArchiveToolType::Bsd && method.is_zstd() && os.is_windows()
}

fn tar_args(
    tool: &ArchiveTool,
    method: CompressionMethod,
    op: &TarOperation<'_>,
    os: HostOs,
) -> Vec<String> {
    let two_step = needs_separate_zstd(tool, method, os);
    let mut args: Vec<String> = Vec::new();

    match op {
        TarOperation::Create { working_dir } => {
            let target = if two_step {
                TAR_FILE
            } else {
                method.archive_file_name()
            };
            args.extend(
                [
                    "--posix",
                    "-cf",
                    target,
                    "--exclude",
                    target,
                    "-P",
                    "-C",
                ]
                .map(String::from),
            );
            args.push(slash_path(working_dir));
            args.push("--files-from".to_string());
            args.push(MANIFEST_FILE.to_string());
        }
        TarOperation::Extract {
            archive,
            working_dir,
        } => {
            args.push("-xf".to_string());
            args.push(if two_step {
                TAR_FILE.to_string()
            } else {
                slash_path(archive)
            });
            args.push("-P".to_string());
            args.push("-C".to_string());
            args.push(slash_path(working_dir));
        }
        TarOperation::List { archive } => {
            args.push("-tf".to_string());
            args.push(if two_step {
                TAR_FILE.to_string()
            } else {
                slash_path(archive)
            });
            args.push("-P".to_string());
        }
    }

    if tool.is_gnu() {
        match os {
            HostOs::Windows => args.push("--force-local".to_string()),
            HostOs::MacOs => args.push("--delay-directory-restore".to_string()),
            HostOs::Linux => {}
        }
    }

    args
}

/// Flags that make tar itself (de)compress
fn tar_compression_args(method: CompressionMethod, create: bool, os: HostOs) -> Vec<String> {
    let program = match (method, create, os.is_windows()) {
        (CompressionMethod::Gzip, _, _) => return vec!["-z".to_string()],
        (CompressionMethod::Zstd, true, true) => "zstd -T0 --long=30",
        (CompressionMethod::Zstd, true, false) => "zstdmt --long=30",
        (CompressionMethod::Zstd, false, true) => "zstd -d --long=30",
        (CompressionMethod::Zstd, false, false) => "unzstd --long=30",
        (CompressionMethod::ZstdWithoutLong, true, true) => "zstd -T0",
        (CompressionMethod::ZstdWithoutLong, true, false) => "zstdmt",
        (CompressionMethod::ZstdWithoutLong, false, true) => "zstd -d",
        (CompressionMethod::ZstdWithoutLong, false, false) => "unzstd",
    };
    vec!["--use-compress-program".to_string(), program.to_string()]
}

/// Standalone zstd step for the two-step path
fn zstd_command(method: CompressionMethod, op: &TarOperation<'_>) -> ToolCommand {
    let long = method == CompressionMethod::Zstd;
    match op {
        TarOperation::Create { .. } => {
            let mut cmd = ToolCommand::new("zstd").arg("-T0");
            if long {
                cmd = cmd.arg("--long=30");
            }
            cmd.args(["--force", "-o", method.archive_file_name(), TAR_FILE])
        }
        TarOperation::Extract { archive, .. } | TarOperation::List { archive } => {
            let mut cmd = ToolCommand::new("zstd").arg("-d");
            if long {
                cmd = cmd.arg("--long=30");
            }
            cmd.args(["--force", "-o", TAR_FILE])
                .arg(slash_path(archive))
        }
    }
}

/// Build the ordered command sequence for one tar operation
pub fn tar_commands(
    tool: &ArchiveTool,
    method: CompressionMethod,
    op: &TarOperation<'_>,
    os: HostOs,
) -> Vec<ToolCommand> {
    let tar = ToolCommand::new(tool.path.to_string_lossy()).args(tar_args(tool, method, op, os));

    if needs_separate_zstd(tool, method, os) {
        let zstd = zstd_command(method, op);
        return if op.is_create() {
            vec![tar, zstd]
        } else {
            vec![zstd, tar]
        };
    }

    vec![tar.args(tar_compression_args(method, op.is_create(), os))]
}

/// Creates, extracts and lists cache archives with external tools
#[derive(Clone)]
pub struct ArchiveTransport {
    runner: Arc<dyn ProcessRunner>,
    os: HostOs,
}

impl ArchiveTransport {
    pub fn new(runner: Arc<dyn ProcessRunner>, os: HostOs) -> Self {
        Self { runner, os }
    }

    /// Transport using real processes on the current host
    pub fn system() -> Self {
        Self::new(Arc::new(SystemRunner), HostOs::detect())
    }

    pub fn os(&self) -> HostOs {
        self.os
    }

    /// Preferred compression method on this host
    pub async fn compression_method(&self) -> CompressionMethod {
        CompressionMethod::detect(self.runner.as_ref()).await
    }

    /// Locate tar (and zstd, when the two-step path needs it)
    async fn commands(
        &self,
        method: CompressionMethod,
        op: &TarOperation<'_>,
    ) -> ActkitResult<Vec<ToolCommand>> {
        let tool = ArchiveTool::resolve(self.os, self.runner.as_ref()).await?;
        if needs_separate_zstd(&tool, method, self.os) && self.runner.which("zstd").is_none() {
            return Err(ActkitError::ArchiveToolNotFound("zstd".to_string()));
        }
        Ok(tar_commands(&tool, method, op, self.os))
    }

    /// Run commands in order; the first failure stops the sequence
    async fn exec(&self, commands: &[ToolCommand], cwd: &Path) -> ActkitResult<String> {
        let mut last_stdout = String::new();
        for command in commands {
            debug!("Running in {}: {}", cwd.display(), command);
            let output = self
                .runner
                .output(command, Some(cwd))
                .await
                .map_err(|e| ActkitError::ArchiveCommand {
                    program: command.program.clone(),
                    message: e.to_string(),
                })?;

            if !output.success {
                return Err(ActkitError::ArchiveCommand {
                    program: command.program.clone(),
                    message: output.failure_message(),
                });
            }
            last_stdout = output.stdout;
        }
        Ok(last_stdout)
    }

    /// Write the manifest into `archive_folder` and archive `sources`
    ///
    /// Returns the path of the compressed archive inside `archive_folder`.
    pub async fn create(
        &self,
        archive_folder: &Path,
        sources: &[String],
        working_dir: &Path,
        method: CompressionMethod,
    ) -> ActkitResult<PathBuf> {
        fs::create_dir_all(archive_folder).await.map_err(|e| {
            ActkitError::io(format!("creating {}", archive_folder.display()), e)
        })?;

        let manifest = archive_folder.join(MANIFEST_FILE);
        fs::write(&manifest, sources.join("\n"))
            .await
            .map_err(|e| ActkitError::io(format!("writing {}", manifest.display()), e))?;

        let commands = self
            .commands(method, &TarOperation::Create { working_dir })
            .await?;
        self.exec(&commands, archive_folder).await?;

        Ok(archive_folder.join(method.archive_file_name()))
    }

    /// Unpack `archive` into `working_dir`; intermediates go to `scratch_dir`
    pub async fn extract(
        &self,
        archive: &Path,
        working_dir: &Path,
        scratch_dir: &Path,
        method: CompressionMethod,
    ) -> ActkitResult<()> {
        for dir in [working_dir, scratch_dir] {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| ActkitError::io(format!("creating {}", dir.display()), e))?;
        }

        let commands = self
            .commands(
                method,
                &TarOperation::Extract {
                    archive,
                    working_dir,
                },
            )
            .await?;
        self.exec(&commands, scratch_dir).await?;
        Ok(())
    }

    /// List the members of `archive`, returning tar's raw output
    pub async fn list(
        &self,
        archive: &Path,
        scratch_dir: &Path,
        method: CompressionMethod,
    ) -> ActkitResult<String> {
        fs::create_dir_all(scratch_dir)
            .await
            .map_err(|e| ActkitError::io(format!("creating {}", scratch_dir.display()), e))?;

        let commands = self
            .commands(method, &TarOperation::List { archive })
            .await?;
        self.exec(&commands, scratch_dir).await
    }
}
