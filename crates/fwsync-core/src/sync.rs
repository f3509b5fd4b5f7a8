use crate::config::SyncConfig;
use crate::CoreError;
use fwsync_schema::{ArtifactRecord, ArtifactSlot, DeviceName, ManifestDocument, VersionTag};
use fwsync_store::{digest_file, discover_devices, latest_version_dir, ManifestStore, RepoLayout};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Compute everything but write nothing.
    pub dry_run: bool,
}

/// What happened to one device's manifest.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceOutcome {
    pub device: DeviceName,
    pub manifest_path: PathBuf,
    /// Version written this run, if a firmware binary was found.
    pub version: Option<String>,
    /// Sections overwritten with fresh artifact data.
    pub refreshed: Vec<ArtifactSlot>,
    pub notes: Vec<String>,
    /// Whether the serialized manifest differs from what was on disk.
    pub changed: bool,
    pub written: bool,
}

impl DeviceOutcome {
    pub fn manifest_file_name(&self) -> String {
        self.device.manifest_file_name()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub dry_run: bool,
    pub devices: Vec<DeviceOutcome>,
}

impl SyncReport {
    pub fn manifests_written(&self) -> usize {
        self.devices.iter().filter(|d| d.written).count()
    }

    pub fn manifests_changed(&self) -> usize {
        self.devices.iter().filter(|d| d.changed).count()
    }
}

/// Merges the freshest artifact metadata of every device into its manifest.
///
/// Each device is handled independently in a single pass: load (or start
/// empty), default the identity keys, refresh whatever artifacts exist, and
/// persist. Any I/O or parse failure aborts the run; manifests already
/// written stay written.
pub struct Synchronizer {
    config: SyncConfig,
    layout: RepoLayout,
    manifests: ManifestStore,
}

impl Synchronizer {
    pub fn new(config: SyncConfig) -> Self {
        let layout = RepoLayout::new(&config.repo_root);
        let manifests = ManifestStore::new(layout.clone());
        Self {
            config,
            layout,
            manifests,
        }
    }

    #[inline]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    #[inline]
    pub fn layout(&self) -> &RepoLayout {
        &self.layout
    }

    pub fn discover_devices(&self) -> Result<Vec<DeviceName>, CoreError> {
        Ok(discover_devices(&self.layout)?)
    }

    /// Synchronize every discovered device. An empty report means nothing was found.
    pub fn run(&self, options: SyncOptions) -> Result<SyncReport, CoreError> {
        self.run_with(options, |_| {})
    }

    /// Like [`Synchronizer::run`], calling `on_device` after each device so
    /// progress is visible before a later device fails.
    pub fn run_with(
        &self,
        options: SyncOptions,
        mut on_device: impl FnMut(&DeviceOutcome),
    ) -> Result<SyncReport, CoreError> {
        let devices = self.discover_devices()?;
        let mut report = SyncReport {
            dry_run: options.dry_run,
            devices: Vec::with_capacity(devices.len()),
        };
        for device in &devices {
            let outcome = self.sync_device(device, options)?;
            on_device(&outcome);
            report.devices.push(outcome);
        }
        Ok(report)
    }

    pub fn sync_device(
        &self,
        device: &DeviceName,
        options: SyncOptions,
    ) -> Result<DeviceOutcome, CoreError> {
        info!("syncing {device}");
        let loaded = self.manifests.load(device)?;
        let mut doc = loaded.document;
        doc.apply_defaults(&self.config.schema_url(), device.as_str(), &self.config.chip);

        let mut outcome = DeviceOutcome {
            device: device.clone(),
            manifest_path: loaded.path,
            version: None,
            refreshed: Vec::new(),
            notes: Vec::new(),
            changed: false,
            written: false,
        };

        let fw_dir = self.layout.device_dir(ArtifactSlot::Firmware, device);
        if fw_dir.is_dir() {
            match self.process_firmware(&mut doc, &fw_dir)? {
                Some(version) => {
                    outcome.version = Some(version.as_str().to_owned());
                    outcome.refreshed.push(ArtifactSlot::Firmware);
                }
                None => outcome.notes.push(format!(
                    "no firmware binary found for {device}; firmware section not updated."
                )),
            }
        }

        let sp_dir = self.layout.device_dir(ArtifactSlot::Spiffs, device);
        if sp_dir.is_dir() && self.process_spiffs(&mut doc, &sp_dir)? {
            outcome.refreshed.push(ArtifactSlot::Spiffs);
        }

        let cfg_dir = self.layout.device_dir(ArtifactSlot::Config, device);
        if cfg_dir.is_dir() && self.process_config(&mut doc, &cfg_dir)? {
            outcome.refreshed.push(ArtifactSlot::Config);
        }

        let content = if options.dry_run {
            doc.to_json_string()?
        } else {
            let written = self.manifests.save(&outcome.manifest_path, &doc)?;
            outcome.written = true;
            written
        };
        outcome.changed = loaded.on_disk.as_deref() != Some(content.as_str());
        debug!(
            "{}: refreshed {:?}, changed={}",
            outcome.manifest_file_name(),
            outcome.refreshed,
            outcome.changed
        );
        Ok(outcome)
    }

    /// Refresh `version` and `firmware` from the newest `firmware.bin`.
    ///
    /// Returns the version used, or `None` (manifest untouched) when there is
    /// no version directory or it holds no binary.
    pub fn process_firmware(
        &self,
        doc: &mut ManifestDocument,
        device_dir: &Path,
    ) -> Result<Option<VersionTag>, CoreError> {
        let Some((version, bin_path)) = latest_binary(device_dir, ArtifactSlot::Firmware)? else {
            return Ok(None);
        };
        let record = self.artifact_record(&bin_path, ArtifactSlot::Firmware)?;
        doc.set_version(&version);
        doc.set_artifact(ArtifactSlot::Firmware, &record)?;
        Ok(Some(version))
    }

    /// Refresh `spiffs` from the newest `spiffs.bin`. Returns whether it was found.
    pub fn process_spiffs(
        &self,
        doc: &mut ManifestDocument,
        device_dir: &Path,
    ) -> Result<bool, CoreError> {
        let Some((_, bin_path)) = latest_binary(device_dir, ArtifactSlot::Spiffs)? else {
            return Ok(false);
        };
        let record = self.artifact_record(&bin_path, ArtifactSlot::Spiffs)?;
        doc.set_artifact(ArtifactSlot::Spiffs, &record)?;
        Ok(true)
    }

    /// Refresh `config` from the unversioned `config.yaml`. Returns whether it was found.
    pub fn process_config(
        &self,
        doc: &mut ManifestDocument,
        device_dir: &Path,
    ) -> Result<bool, CoreError> {
        let path = device_dir.join(ArtifactSlot::Config.file_name());
        if !path.is_file() {
            debug!("no {} in {}", ArtifactSlot::Config.file_name(), device_dir.display());
            return Ok(false);
        }
        let record = self.artifact_record(&path, ArtifactSlot::Config)?;
        doc.set_artifact(ArtifactSlot::Config, &record)?;
        Ok(true)
    }

    fn artifact_record(&self, path: &Path, slot: ArtifactSlot) -> Result<ArtifactRecord, CoreError> {
        let rel = self.layout.relative_url_path(path)?;
        let digest = digest_file(path)?;
        debug!("{rel}: sha256={} size={}", digest.sha256, digest.size);
        Ok(ArtifactRecord {
            url: self.config.artifact_url(&rel),
            sha256: digest.sha256,
            size: slot.records_size().then_some(digest.size),
        })
    }
}

/// Newest version directory of `device_dir`, if it contains the slot's binary.
fn latest_binary(
    device_dir: &Path,
    slot: ArtifactSlot,
) -> Result<Option<(VersionTag, PathBuf)>, CoreError> {
    let Some(latest) = latest_version_dir(device_dir)? else {
        debug!("no version directory in {}", device_dir.display());
        return Ok(None);
    };
    let bin_path = latest.path.join(slot.file_name());
    if !bin_path.is_file() {
        debug!("{} missing", bin_path.display());
        return Ok(None);
    }
    Ok(Some((latest.tag, bin_path)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, rel: &str, data: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, data).unwrap();
    }

    fn sync_for(root: &Path) -> Synchronizer {
        Synchronizer::new(SyncConfig::new(root).with_url_base("https://example.com/repo"))
    }

    #[test]
    fn process_firmware_sets_version_and_record() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "firmware/lamp/v1.2.3/firmware.bin", b"abc");
        let sync = sync_for(dir.path());
        let mut doc = ManifestDocument::new();

        let version = sync
            .process_firmware(&mut doc, &dir.path().join("firmware/lamp"))
            .unwrap()
            .unwrap();
        assert_eq!(version.as_str(), "1.2.3");
        assert_eq!(doc.version(), Some("1.2.3"));

        let fw = doc.artifact(ArtifactSlot::Firmware).unwrap().unwrap();
        assert_eq!(
            fw.url,
            "https://example.com/repo/firmware/lamp/v1.2.3/firmware.bin"
        );
        assert_eq!(
            fw.sha256.as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(fw.size, Some(3));
    }

    #[test]
    fn process_firmware_missing_binary_leaves_doc_untouched() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("firmware/lamp/v2.0.0")).unwrap();
        let sync = sync_for(dir.path());
        let mut doc = ManifestDocument::from_json_str(
            r#"{"version": "1.0.0", "firmware": {"url": "u", "sha256": "s", "size": 1}}"#,
        )
        .unwrap();
        let before = doc.clone();

        let found = sync
            .process_firmware(&mut doc, &dir.path().join("firmware/lamp"))
            .unwrap();
        assert!(found.is_none());
        assert_eq!(doc, before);
    }

    #[test]
    fn process_firmware_ignores_older_binary_when_latest_lacks_one() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "firmware/lamp/v1.0.0/firmware.bin", b"old");
        fs::create_dir_all(dir.path().join("firmware/lamp/v1.1.0")).unwrap();
        let sync = sync_for(dir.path());
        let mut doc = ManifestDocument::new();
        let found = sync
            .process_firmware(&mut doc, &dir.path().join("firmware/lamp"))
            .unwrap();
        assert!(found.is_none());
        assert!(doc.is_empty());
    }

    #[test]
    fn process_spiffs_records_size() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "spiffs/lamp/v0.1.0/spiffs.bin", &[7u8; 1000]);
        let sync = sync_for(dir.path());
        let mut doc = ManifestDocument::new();
        assert!(sync
            .process_spiffs(&mut doc, &dir.path().join("spiffs/lamp"))
            .unwrap());
        let sp = doc.artifact(ArtifactSlot::Spiffs).unwrap().unwrap();
        assert_eq!(sp.size, Some(1000));
        assert!(sp.url.ends_with("/spiffs/lamp/v0.1.0/spiffs.bin"));
        assert!(doc.version().is_none());
    }

    #[test]
    fn process_spiffs_absent_is_silent_false() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("spiffs/lamp")).unwrap();
        let sync = sync_for(dir.path());
        let mut doc = ManifestDocument::new();
        assert!(!sync
            .process_spiffs(&mut doc, &dir.path().join("spiffs/lamp"))
            .unwrap());
        assert!(doc.is_empty());
    }

    #[test]
    fn process_config_has_no_size() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "config/lamp/config.yaml", b"brightness: 3\n");
        let sync = sync_for(dir.path());
        let mut doc = ManifestDocument::new();
        assert!(sync
            .process_config(&mut doc, &dir.path().join("config/lamp"))
            .unwrap());
        let cfg = doc.artifact(ArtifactSlot::Config).unwrap().unwrap();
        assert_eq!(cfg.size, None);
        assert_eq!(cfg.url, "https://example.com/repo/config/lamp/config.yaml");
        assert!(cfg.sha256.is_well_formed());
    }

    #[test]
    fn sync_device_notes_missing_firmware_only_when_root_exists() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("firmware/lamp")).unwrap();
        write(dir.path(), "config/skull/config.yaml", b"a: 1\n");
        let sync = sync_for(dir.path());

        let lamp = sync
            .sync_device(&DeviceName::new("lamp"), SyncOptions::default())
            .unwrap();
        assert_eq!(lamp.notes.len(), 1);
        assert!(lamp.notes[0].contains("lamp"));

        let skull = sync
            .sync_device(&DeviceName::new("skull"), SyncOptions::default())
            .unwrap();
        assert!(skull.notes.is_empty());
        assert_eq!(skull.refreshed, vec![ArtifactSlot::Config]);
    }

    #[test]
    fn sync_device_reports_change_then_stability() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "firmware/lamp/v1.0.0/firmware.bin", b"fw");
        let sync = sync_for(dir.path());
        let device = DeviceName::new("lamp");

        let first = sync.sync_device(&device, SyncOptions::default()).unwrap();
        assert!(first.changed);
        assert!(first.written);
        assert_eq!(first.version.as_deref(), Some("1.0.0"));

        let second = sync.sync_device(&device, SyncOptions::default()).unwrap();
        assert!(!second.changed);
        assert!(second.written);
    }

    #[test]
    fn dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "config/lamp/config.yaml", b"a: 1\n");
        let sync = sync_for(dir.path());
        let report = sync.run(SyncOptions { dry_run: true }).unwrap();
        assert_eq!(report.devices.len(), 1);
        assert_eq!(report.manifests_written(), 0);
        assert_eq!(report.manifests_changed(), 1);
        assert!(!dir.path().join("firmware").exists());
    }

    #[test]
    fn run_on_empty_repo_is_empty_report() {
        let dir = tempfile::tempdir().unwrap();
        let report = sync_for(dir.path()).run(SyncOptions::default()).unwrap();
        assert!(report.devices.is_empty());
        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn run_with_reports_each_device_before_a_later_failure() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "config/fog/config.yaml", b"a: 1\n");
        write(dir.path(), "config/skull/config.yaml", b"b: 2\n");
        write(dir.path(), "firmware/skull.manifest.json", b"{broken");
        let sync = sync_for(dir.path());

        let mut seen = Vec::new();
        let err = sync
            .run_with(SyncOptions::default(), |outcome| {
                seen.push(outcome.device.as_str().to_owned());
            })
            .unwrap_err();
        assert!(err.to_string().starts_with("manifest error:"));
        assert_eq!(seen, ["fog"]);
        assert!(dir.path().join("firmware/fog.manifest.json").is_file());
    }
}
