//! Manifest document model, artifact records, and version directories for fwsync.
//!
//! This crate defines the schema layer: the per-device JSON manifest
//! (`ManifestDocument`) with its read-merge-write semantics, artifact records
//! (`ArtifactRecord`, `ArtifactSlot`), semantic version directory names
//! (`VersionTag`), and string newtypes for device names and digests.

pub mod manifest;
pub mod types;
pub mod version;

pub use manifest::{
    ArtifactRecord, ArtifactSlot, ManifestDocument, KEY_CHIP, KEY_NAME, KEY_SCHEMA, KEY_VERSION,
};
pub use types::{DeviceName, Sha256Hex};
pub use version::VersionTag;

use thiserror::Error;

/// Raw-content host serving the repository's artifacts to devices.
pub const DEFAULT_URL_BASE: &str =
    "https://raw.githubusercontent.com/kubkpower/halloween_dmx_pub/main";
/// Schema document name, resolved against the URL base.
pub const SCHEMA_FILE_NAME: &str = "manifest.schema.json";
pub const DEFAULT_CHIP: &str = "esp32";
/// Appended to the device name to form the manifest file name.
pub const MANIFEST_SUFFIX: &str = ".manifest.json";

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to parse manifest JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("manifest is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("manifest must be a JSON object, found {0}")]
    NotAnObject(&'static str),
    #[error("invalid '{key}' artifact record: {reason}")]
    InvalidArtifact { key: String, reason: String },
}
