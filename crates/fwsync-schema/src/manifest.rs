use crate::types::Sha256Hex;
use crate::version::VersionTag;
use crate::SchemaError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const KEY_SCHEMA: &str = "$schema";
pub const KEY_NAME: &str = "name";
pub const KEY_CHIP: &str = "chip";
pub const KEY_VERSION: &str = "version";

/// The three artifact kinds a device manifest can advertise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactSlot {
    Firmware,
    Spiffs,
    Config,
}

impl ArtifactSlot {
    pub const ALL: [ArtifactSlot; 3] = [Self::Firmware, Self::Spiffs, Self::Config];

    /// Top-level manifest key holding this artifact's record.
    pub fn key(self) -> &'static str {
        match self {
            Self::Firmware => "firmware",
            Self::Spiffs => "spiffs",
            Self::Config => "config",
        }
    }

    /// File name looked up inside the device (or version) directory.
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Firmware => "firmware.bin",
            Self::Spiffs => "spiffs.bin",
            Self::Config => "config.yaml",
        }
    }

    /// Whether artifacts live under `v<major>.<minor>.<patch>` subdirectories.
    pub fn is_versioned(self) -> bool {
        !matches!(self, Self::Config)
    }

    /// Binary artifacts carry a `size`; the config artifact does not.
    pub fn records_size(self) -> bool {
        self.is_versioned()
    }
}

impl std::fmt::Display for ArtifactSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// One artifact entry: `{url, sha256, size?}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArtifactRecord {
    pub url: String,
    pub sha256: Sha256Hex,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// A device manifest as a JSON object.
///
/// Backed by an insertion-ordered map so unrelated keys and the key order of
/// an existing file survive a load/modify/save cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManifestDocument {
    fields: Map<String, Value>,
}

impl ManifestDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(input: &str) -> Result<Self, SchemaError> {
        match serde_json::from_str::<Value>(input)? {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(SchemaError::NotAnObject(json_type_name(&other))),
        }
    }

    /// Serialize with 2-space indentation and a trailing newline.
    pub fn to_json_string(&self) -> Result<String, SchemaError> {
        let mut out = serde_json::to_string_pretty(&self.fields)?;
        out.push('\n');
        Ok(out)
    }

    /// Insert `value` under `key` only if the key is absent. Returns true if inserted.
    pub fn set_default(&mut self, key: &str, value: impl Into<Value>) -> bool {
        if self.fields.contains_key(key) {
            return false;
        }
        self.fields.insert(key.to_owned(), value.into());
        true
    }

    /// Fill in `$schema`, `name`, and `chip` without overwriting existing values.
    pub fn apply_defaults(&mut self, schema_url: &str, name: &str, chip: &str) {
        self.set_default(KEY_SCHEMA, schema_url);
        self.set_default(KEY_NAME, name);
        self.set_default(KEY_CHIP, chip);
    }

    pub fn set_version(&mut self, version: &VersionTag) {
        self.fields
            .insert(KEY_VERSION.to_owned(), Value::String(version.as_str().to_owned()));
    }

    pub fn set_artifact(
        &mut self,
        slot: ArtifactSlot,
        record: &ArtifactRecord,
    ) -> Result<(), SchemaError> {
        let value = serde_json::to_value(record)?;
        self.fields.insert(slot.key().to_owned(), value);
        Ok(())
    }

    /// The record stored under `slot`, if any.
    pub fn artifact(&self, slot: ArtifactSlot) -> Result<Option<ArtifactRecord>, SchemaError> {
        match self.fields.get(slot.key()) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| SchemaError::InvalidArtifact {
                    key: slot.key().to_owned(),
                    reason: e.to_string(),
                }),
        }
    }

    pub fn version(&self) -> Option<&str> {
        self.fields.get(KEY_VERSION).and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
