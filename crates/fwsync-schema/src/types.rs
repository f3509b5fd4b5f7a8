//! Newtype wrappers for device names and digests.
//!
//! All newtypes serialize/deserialize as plain strings so manifests stay plain JSON.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A `String` wrapper that (de)serializes transparently and compares against `str`.
macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }
    };
}

string_newtype!(
    /// Device name, taken from the basename of a directory under one of the artifact roots.
    DeviceName
);

string_newtype!(
    /// Lowercase hex SHA-256 digest (64 characters).
    Sha256Hex
);

impl DeviceName {
    /// File name of this device's manifest, e.g. `porch-light.manifest.json`.
    pub fn manifest_file_name(&self) -> String {
        format!("{}{}", self.0, crate::MANIFEST_SUFFIX)
    }
}

impl Sha256Hex {
    /// True when the digest is exactly 64 lowercase hex characters.
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == 64
            && self
                .0
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_name_display_and_compare() {
        let name = DeviceName::new("porch-light");
        assert_eq!(name.to_string(), "porch-light");
        assert_eq!(name.as_str(), "porch-light");
        assert!(name == *"porch-light");
        assert!(name != *"porch");
    }

    #[test]
    fn device_name_manifest_file_name() {
        let name = DeviceName::new("fog-machine");
        assert_eq!(name.manifest_file_name(), "fog-machine.manifest.json");
    }

    #[test]
    fn device_names_order_lexically() {
        let mut names = vec![DeviceName::new("b"), DeviceName::new("a")];
        names.sort();
        assert_eq!(names[0].as_str(), "a");
    }

    #[test]
    fn sha256_hex_serializes_as_plain_string() {
        let h = Sha256Hex::new("ab".repeat(32));
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, format!("\"{}\"", "ab".repeat(32)));
        let back: Sha256Hex = serde_json::from_str(&json).unwrap();
        assert_eq!(back, h);
    }

    #[test]
    fn sha256_hex_well_formed() {
        assert!(Sha256Hex::new("0".repeat(64)).is_well_formed());
        assert!(!Sha256Hex::new("0".repeat(63)).is_well_formed());
        assert!(!Sha256Hex::new("A".repeat(64)).is_well_formed());
        assert!(!Sha256Hex::new("g".repeat(64)).is_well_formed());
    }
}
