use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// A parsed `v<major>.<minor>.<patch>` build directory name.
///
/// Only plain ASCII digit components are accepted; anything else (pre-release
/// suffixes, missing components, a missing `v`) makes the name non-matching.
/// The textual form is kept verbatim so `v01.2.3` reports as `01.2.3`.
///
/// Ordering is numeric on `(major, minor, patch)`. Two tags can compare as
/// [`Ordering::Equal`] without being `==` (`v1.0.0` vs `v01.0.0`), so this type
/// exposes [`VersionTag::cmp_numeric`] instead of implementing `Ord`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionTag {
    major: u64,
    minor: u64,
    patch: u64,
    text: String,
}

impl VersionTag {
    /// Parse a directory name such as `v1.4.2`. Returns `None` for non-matching names.
    pub fn parse_dir_name(name: &str) -> Option<Self> {
        let text = name.strip_prefix('v')?;
        let mut parts = text.split('.');
        let major = parse_component(parts.next()?)?;
        let minor = parse_component(parts.next()?)?;
        let patch = parse_component(parts.next()?)?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self {
            major,
            minor,
            patch,
            text: text.to_owned(),
        })
    }

    #[inline]
    pub fn triple(&self) -> (u64, u64, u64) {
        (self.major, self.minor, self.patch)
    }

    /// The version without the leading `v`, as written in the directory name.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn cmp_numeric(&self, other: &Self) -> Ordering {
        self.triple().cmp(&other.triple())
    }
}

fn parse_component(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for VersionTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}
