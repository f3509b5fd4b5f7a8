use crate::CoreError;
use fwsync_schema::{DEFAULT_CHIP, DEFAULT_URL_BASE, SCHEMA_FILE_NAME};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Everything the synchronizer needs to know about its environment.
///
/// Built from defaults, then an optional [`ConfigFile`], then command-line
/// overrides. When no explicit schema URL is set it is derived from the URL
/// base, so overriding the base also moves the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub repo_root: PathBuf,
    url_base: String,
    schema_url: Option<String>,
    pub chip: String,
}

impl SyncConfig {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
            url_base: DEFAULT_URL_BASE.to_owned(),
            schema_url: None,
            chip: DEFAULT_CHIP.to_owned(),
        }
    }

    #[must_use]
    pub fn with_url_base(mut self, url_base: &str) -> Self {
        self.url_base = url_base.trim_end_matches('/').to_owned();
        self
    }

    #[must_use]
    pub fn with_schema_url(mut self, schema_url: &str) -> Self {
        self.schema_url = Some(schema_url.to_owned());
        self
    }

    #[must_use]
    pub fn with_chip(mut self, chip: &str) -> Self {
        chip.clone_into(&mut self.chip);
        self
    }

    /// Layer the values present in `file` over this config.
    #[must_use]
    pub fn merge_file(mut self, file: &ConfigFile) -> Self {
        if let Some(url) = &file.url_base {
            self = self.with_url_base(url);
        }
        if let Some(url) = &file.schema_url {
            self = self.with_schema_url(url);
        }
        if let Some(chip) = &file.chip {
            self = self.with_chip(chip);
        }
        self
    }

    #[inline]
    pub fn url_base(&self) -> &str {
        &self.url_base
    }

    pub fn schema_url(&self) -> String {
        match &self.schema_url {
            Some(url) => url.clone(),
            None => format!("{}/{SCHEMA_FILE_NAME}", self.url_base),
        }
    }

    /// URL under which a repository-relative path is served.
    pub fn artifact_url(&self, rel_path: &str) -> String {
        format!("{}/{rel_path}", self.url_base)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if !(self.url_base.starts_with("https://") || self.url_base.starts_with("http://")) {
            return Err(CoreError::Config(format!(
                "url_base must be an http(s) URL, got '{}'",
                self.url_base
            )));
        }
        if self.chip.trim().is_empty() {
            return Err(CoreError::Config("chip must not be empty".to_owned()));
        }
        Ok(())
    }
}

/// Optional TOML configuration file.
///
/// ```toml
/// url_base = "https://raw.githubusercontent.com/acme/firmware/main"
/// chip = "esp32s3"
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub url_base: Option<String>,
    #[serde(default)]
    pub schema_url: Option<String>,
    #[serde(default)]
    pub chip: Option<String>,
}

impl ConfigFile {
    pub fn parse_str(input: &str) -> Result<Self, CoreError> {
        Ok(toml::from_str(input)?)
    }

    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path).map_err(|source| CoreError::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse_str(&content)
    }
}
