use crate::layout::RepoLayout;
use crate::{fsync_dir, StoreError};
use fwsync_schema::{DeviceName, ManifestDocument, SchemaError};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// A device manifest as read from disk, with the exact bytes it was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedManifest {
    pub path: PathBuf,
    pub document: ManifestDocument,
    /// `None` when the manifest did not exist yet.
    pub on_disk: Option<String>,
}

/// Reads and atomically rewrites `firmware/<device>.manifest.json` files.
pub struct ManifestStore {
    layout: RepoLayout,
}

impl ManifestStore {
    pub fn new(layout: RepoLayout) -> Self {
        Self { layout }
    }

    /// Load the device's manifest, or start from an empty document if absent.
    pub fn load(&self, device: &DeviceName) -> Result<LoadedManifest, StoreError> {
        let path = self.layout.manifest_path(device);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no manifest at {}, starting empty", path.display());
                return Ok(LoadedManifest {
                    path,
                    document: ManifestDocument::new(),
                    on_disk: None,
                });
            }
            Err(e) => return Err(e.into()),
        };
        let invalid = |source| StoreError::InvalidManifest {
            path: path.display().to_string(),
            source,
        };
        let content =
            String::from_utf8(bytes).map_err(|e| invalid(SchemaError::from(e.utf8_error())))?;
        let document = ManifestDocument::from_json_str(&content).map_err(invalid)?;
        Ok(LoadedManifest {
            path,
            document,
            on_disk: Some(content),
        })
    }

    /// Serialize and atomically replace the manifest at `path`, returning the text written.
    ///
    /// The parent directory is created if needed. Existing file permissions
    /// are carried over to the replacement.
    pub fn save(&self, path: &Path, document: &ManifestDocument) -> Result<String, StoreError> {
        let content = document.to_json_string()?;
        write_atomic(path, content.as_bytes())?;
        info!("wrote {}", path.display());
        Ok(content)
    }
}

fn write_atomic(dest: &Path, data: &[u8]) -> Result<(), StoreError> {
    let dir = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    let existing = match fs::metadata(dest) {
        Ok(meta) => Some(meta.permissions()),
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(e) => return Err(e.into()),
    };
    let mut tmp = temp_file_in(&dir, existing.is_none())?;
    tmp.write_all(data)?;
    if let Some(perms) = existing {
        tmp.as_file().set_permissions(perms)?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|e| StoreError::Io(e.error))?;
    fsync_dir(&dir)?;
    Ok(())
}

/// Temp file for the replacement. A brand-new manifest is created with the
/// mode `fs::write` would give it (0o666 less the umask) rather than 0o600.
#[cfg(unix)]
fn temp_file_in(dir: &Path, new_file: bool) -> std::io::Result<NamedTempFile> {
    use std::os::unix::fs::PermissionsExt;
    let mut builder = tempfile::Builder::new();
    if new_file {
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(dir)
}

#[cfg(not(unix))]
fn temp_file_in(dir: &Path, _new_file: bool) -> std::io::Result<NamedTempFile> {
    NamedTempFile::new_in(dir)
}
