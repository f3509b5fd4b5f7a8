use crate::StoreError;
use fwsync_schema::{ArtifactSlot, DeviceName};
use std::path::{Component, Path, PathBuf};

pub const FIRMWARE_DIR: &str = "firmware";
pub const SPIFFS_DIR: &str = "spiffs";
pub const CONFIG_DIR: &str = "config";

/// Directory layout of a firmware distribution repository.
///
/// Three sibling trees hold one subdirectory per device; manifests are
/// written next to the device directories in the firmware tree.
#[derive(Debug, Clone)]
pub struct RepoLayout {
    root: PathBuf,
}

impl RepoLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[inline]
    pub fn firmware_root(&self) -> PathBuf {
        self.root.join(FIRMWARE_DIR)
    }

    #[inline]
    pub fn spiffs_root(&self) -> PathBuf {
        self.root.join(SPIFFS_DIR)
    }

    #[inline]
    pub fn config_root(&self) -> PathBuf {
        self.root.join(CONFIG_DIR)
    }

    /// Tree holding artifacts of the given kind.
    pub fn artifact_root(&self, slot: ArtifactSlot) -> PathBuf {
        match slot {
            ArtifactSlot::Firmware => self.firmware_root(),
            ArtifactSlot::Spiffs => self.spiffs_root(),
            ArtifactSlot::Config => self.config_root(),
        }
    }

    /// All artifact trees, in discovery order.
    pub fn artifact_roots(&self) -> [PathBuf; 3] {
        ArtifactSlot::ALL.map(|slot| self.artifact_root(slot))
    }

    #[inline]
    pub fn device_dir(&self, slot: ArtifactSlot, device: &DeviceName) -> PathBuf {
        self.artifact_root(slot).join(device.as_str())
    }

    /// `firmware/<device>.manifest.json`
    #[inline]
    pub fn manifest_path(&self, device: &DeviceName) -> PathBuf {
        self.firmware_root().join(device.manifest_file_name())
    }

    /// Path of `path` relative to the repository root, joined with `/`.
    ///
    /// Used for artifact URLs, so the result is the same on every host.
    pub fn relative_url_path(&self, path: &Path) -> Result<String, StoreError> {
        let rel = path
            .strip_prefix(&self.root)
            .map_err(|_| StoreError::OutsideRoot(path.display().to_string()))?;

        let mut parts = Vec::new();
        for component in rel.components() {
            match component {
                Component::Normal(part) => {
                    let part = part
                        .to_str()
                        .ok_or_else(|| StoreError::NonUtf8Path(path.display().to_string()))?;
                    parts.push(part);
                }
                Component::CurDir => {}
                _ => return Err(StoreError::OutsideRoot(path.display().to_string())),
            }
        }
        Ok(parts.join("/"))
    }
}
