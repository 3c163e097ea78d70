//! Compression method selection

use crate::archive::process::{ProcessRunner, ToolCommand};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tokio::io::AsyncReadExt;
use tracing::debug;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const ZSTD_MAGIC: [u8; 4] = [0x28, 0xb5, 0x2f, 0xfd];

/// How a cache archive is compressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionMethod {
    /// tar's own `-z`; available everywhere
    Gzip,
    /// zstd with the default window
    ZstdWithoutLong,
    /// zstd with `--long=30`
    Zstd,
}

impl CompressionMethod {
    /// Identifier mixed into the cache version
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::ZstdWithoutLong => "zstd-without-long",
            Self::Zstd => "zstd",
        }
    }

    /// File name of the archive produced in the temp folder
    pub fn archive_file_name(&self) -> &'static str {
        match self {
            Self::Gzip => "cache.tgz",
            Self::ZstdWithoutLong | Self::Zstd => "cache.tzst",
        }
    }

    pub fn is_zstd(&self) -> bool {
        !matches!(self, Self::Gzip)
    }

    /// Prefer zstd when the host has it, else gzip
    pub async fn detect(runner: &dyn ProcessRunner) -> Self {
        let command = ToolCommand::new("zstd").args(["--quiet", "--version"]);
        let output = match runner.output(&command, None).await {
            Ok(out) if out.success => out.stdout,
            Ok(_) | Err(_) => String::new(),
        };

        if output.trim().is_empty() {
            debug!("zstd not available, using gzip");
            return Self::Gzip;
        }

        match parse_zstd_version(&output) {
            Some(version) => debug!("zstd version: {}", version),
            None => debug!("zstd version: {}", output.trim()),
        }
        Self::ZstdWithoutLong
    }

    /// Method matching the archive's magic bytes, falling back to `detected`
    ///
    /// A zstd archive keeps the detected zstd variant so long-window archives
    /// still decompress.
    pub async fn for_archive(path: &Path, detected: Self) -> Self {
        let mut magic = [0u8; 4];
        let read = match tokio::fs::File::open(path).await {
            Ok(mut file) => file.read_exact(&mut magic).await.is_ok(),
            Err(_) => false,
        };
        if !read {
            return detected;
        }

        if magic[..2] == GZIP_MAGIC {
            Self::Gzip
        } else if magic == ZSTD_MAGIC {
            if detected.is_zstd() {
                detected
            } else {
                Self::ZstdWithoutLong
            }
        } else {
            detected
        }
    }
}

impl fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompressionMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gzip" => Ok(Self::Gzip),
            "zstd-without-long" => Ok(Self::ZstdWithoutLong),
            "zstd" => Ok(Self::Zstd),
            other => Err(format!(
                "unknown compression method '{}' (expected gzip, zstd-without-long or zstd)",
                other
            )),
        }
    }
}

/// Pull a semantic version out of `zstd --version` output such as `v1.5.5`
/// or `*** Zstandard CLI (64-bit) v1.5.5, by Yann Collet ***`
fn parse_zstd_version(output: &str) -> Option<semver::Version> {
    output
        .split(|c: char| c.is_whitespace() || c == ',')
        .map(|token| token.trim_start_matches('v'))
        .find_map(|token| semver::Version::parse(token).ok())
}
