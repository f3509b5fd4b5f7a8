pub mod sync;

use console::Style;
use fwsync_core::{ConfigFile, SyncConfig};
use std::path::Path;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_MANIFEST_ERROR: u8 = 2;
pub const EXIT_CONFIG_ERROR: u8 = 3;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

/// Defaults, then the optional config file, then the `--url-base` flag.
pub fn resolve_config(
    root: &Path,
    config_file: Option<&Path>,
    url_base: Option<&str>,
) -> Result<SyncConfig, String> {
    let mut config = SyncConfig::new(root);
    if let Some(path) = config_file {
        let file = ConfigFile::load(path).map_err(|e| e.to_string())?;
        config = config.merge_file(&file);
    }
    if let Some(url) = url_base {
        config = config.with_url_base(url);
    }
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

/// Map an error message to the process exit code.
pub fn exit_code_for(msg: &str) -> u8 {
    if msg.starts_with("manifest error:") {
        EXIT_MANIFEST_ERROR
    } else if msg.starts_with("config error:") {
        EXIT_CONFIG_ERROR
    } else {
        EXIT_FAILURE
    }
}

pub fn style_note(msg: &str) -> String {
    Style::new().yellow().apply_to(msg).to_string()
}

pub fn style_updated(msg: &str) -> String {
    Style::new().green().apply_to(msg).to_string()
}
