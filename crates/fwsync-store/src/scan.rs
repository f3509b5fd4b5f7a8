use crate::layout::RepoLayout;
use crate::StoreError;
use fwsync_schema::{DeviceName, VersionTag};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// The newest `v<major>.<minor>.<patch>` directory of a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDir {
    pub tag: VersionTag,
    pub path: PathBuf,
}

/// Union of device directory names across the firmware, spiffs, and config trees.
///
/// Trees that do not exist contribute nothing. The result is sorted.
pub fn discover_devices(layout: &RepoLayout) -> Result<Vec<DeviceName>, StoreError> {
    let mut devices = BTreeSet::new();
    for root in layout.artifact_roots() {
        if !root.is_dir() {
            debug!("artifact tree {} absent", root.display());
            continue;
        }
        for (name, _) in subdirectories(&root)? {
            devices.insert(DeviceName::new(name));
        }
    }
    Ok(devices.into_iter().collect())
}

/// Pick the subdirectory of `device_dir` with the highest numeric version.
///
/// Names that do not match `v<int>.<int>.<int>` are ignored. Entries are
/// visited in name order and only a strictly greater version replaces the
/// current best, so numerically equal names resolve to the lexically first.
pub fn latest_version_dir(device_dir: &Path) -> Result<Option<VersionDir>, StoreError> {
    let mut best: Option<VersionDir> = None;
    for (name, path) in subdirectories(device_dir)? {
        let Some(tag) = VersionTag::parse_dir_name(&name) else {
            debug!("ignoring non-version directory {}", path.display());
            continue;
        };
        let newer = match &best {
            None => true,
            Some(b) => tag.cmp_numeric(&b.tag) == Ordering::Greater,
        };
        if newer {
            best = Some(VersionDir { tag, path });
        }
    }
    Ok(best)
}

/// Immediate subdirectories of `dir` (symlinks followed), sorted by name.
fn subdirectories(dir: &Path) -> Result<Vec<(String, PathBuf)>, StoreError> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => out.push((name, path)),
            Err(raw) => warn!("skipping non-UTF-8 directory name {raw:?} in {}", dir.display()),
        }
    }
    out.sort();
    Ok(out)
}
