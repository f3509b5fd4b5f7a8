//! Repository layout, artifact discovery, hashing, and manifest storage for fwsync.
//!
//! This crate provides the filesystem layer: `RepoLayout` for the
//! `firmware/`, `spiffs/`, `config/` tree structure, device and version
//! directory discovery (`discover_devices`, `latest_version_dir`), streamed
//! SHA-256 digests (`digest_file`), and `ManifestStore` for loading and
//! atomically rewriting per-device manifests.

pub mod hashing;
pub mod layout;
pub mod manifests;
pub mod scan;

pub use hashing::{digest_file, digest_reader, FileDigest, HASH_CHUNK_SIZE};
pub use layout::{RepoLayout, CONFIG_DIR, FIRMWARE_DIR, SPIFFS_DIR};
pub use manifests::{LoadedManifest, ManifestStore};
pub use scan::{discover_devices, latest_version_dir, VersionDir};

use fwsync_schema::SchemaError;
use std::path::Path;
use thiserror::Error;

/// Fsync a directory to ensure that a preceding `rename()` is durable.
///
/// POSIX does not guarantee a rename survives a crash until the parent
/// directory itself has been synced.
pub(crate) fn fsync_dir(dir: &Path) -> Result<(), std::io::Error> {
    let f = std::fs::File::open(dir)?;
    f.sync_all()
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("manifest error: {path}: {source}")]
    InvalidManifest {
        path: String,
        #[source]
        source: SchemaError,
    },
    #[error("path is outside the repository root: {0}")]
    OutsideRoot(String),
    #[error("path is not valid UTF-8: {0}")]
    NonUtf8Path(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_display_outside_root() {
        let e = StoreError::OutsideRoot("/etc/passwd".to_owned());
        assert!(e.to_string().contains("/etc/passwd"));
    }

    #[test]
    fn store_error_display_invalid_manifest() {
        let e = StoreError::InvalidManifest {
            path: "firmware/lamp.manifest.json".to_owned(),
            source: SchemaError::NotAnObject("array"),
        };
        let msg = e.to_string();
        assert!(msg.starts_with("manifest error:"));
        assert!(msg.contains("lamp.manifest.json"));
        assert!(msg.contains("array"));
    }

    #[test]
    fn store_error_display_non_utf8() {
        let e = StoreError::NonUtf8Path("bad".to_owned());
        assert!(e.to_string().contains("bad"));
    }

    #[test]
    fn fsync_dir_on_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        fsync_dir(dir.path()).unwrap();
    }
}
