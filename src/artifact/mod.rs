//! Run-scoped artifact storage
//!
//! Artifacts are zip files in the artifact directory. Names resolve to the
//! record with the highest id ("latest wins"), and a run holds at most
//! `MAX_ARTIFACTS` records.

pub mod spec;
pub mod store;
pub mod validate;
pub mod zip_stream;

pub use spec::{upload_zip_specification, EntryKind, UploadZipEntry};
pub use store::{
    artifact_file, ArtifactStore, DeleteArtifactResponse, DownloadOptions, DownloadResponse,
    GetArtifactResponse, ListArtifactsResponse, UploadOptions, UploadResponse,
};
pub use validate::{validate_artifact_name, validate_file_path, validate_root_directory};
pub use zip_stream::{DEFAULT_COMPRESSION_LEVEL, MAX_COMPRESSION_LEVEL};
