//! Archive transport for cache payloads
//!
//! Locates a tar-compatible binary, picks a compression method and runs the
//! command sequence to create, extract or list an archive:
//! - Linux: system tar (GNU)
//! - macOS: gtar if installed, else BSD tar
//! - Windows: Git's GNU tar, else System32 bsdtar (+ standalone zstd)

pub mod compression;
pub mod platform;
pub mod process;
pub mod tar;
pub mod tool;

pub use compression::CompressionMethod;
pub use platform::HostOs;
pub use process::{CommandOutput, ProcessRunner, SystemRunner, ToolCommand};
pub use tar::{tar_commands, ArchiveTransport, TarOperation, MANIFEST_FILE};
pub use tool::{ArchiveTool, ArchiveToolType};
