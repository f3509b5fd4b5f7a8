//! Manifest synchronization engine for fwsync.
//!
//! This crate ties together the schema and store layers into the
//! `Synchronizer`: it discovers devices, picks the freshest firmware, SPIFFS,
//! and config artifacts for each, and merges their digests into the device's
//! manifest. Configuration is injected through `SyncConfig`.

pub mod config;
pub mod sync;

pub use config::{ConfigFile, SyncConfig};
pub use sync::{DeviceOutcome, SyncOptions, SyncReport, Synchronizer};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Store(#[from] fwsync_store::StoreError),
    #[error("manifest error: {0}")]
    Schema(#[from] fwsync_schema::SchemaError),
    #[error("config error: {0}")]
    Config(String),
    #[error("config error: failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("config error: failed to read {path}: {source}")]
    ConfigIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
