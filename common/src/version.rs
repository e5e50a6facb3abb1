//! Release versions for upstream releases and mirrored tags.
//!
//! A version is the triple `MAJOR.MINOR.PATCH`, optionally prefixed with `v`
//! as in git tag names. Components compare as integers, so `0.1.9` sorts
//! before `0.1.10`.

use crate::error::{ModelError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A parsed `MAJOR.MINOR.PATCH` release version.
///
/// Field order matters: the derived [`Ord`] compares major, then minor,
/// then patch.
///
/// # Examples
///
/// ```
/// use circleci_mirror_common::Version;
///
/// let older = Version::parse("v0.1.9").expect("valid version");
/// let newer: Version = "0.1.10".parse().expect("valid version");
/// assert!(older < newer);
/// assert_eq!(newer.to_string(), "0.1.10");
/// assert_eq!(newer.tag(), "v0.1.10");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    major: u64,
    minor: u64,
    patch: u64,
}

impl Version {
    /// Create a version from its components.
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a version string matching `^v?\d+\.\d+\.\d+$`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidVersionFormat`] for anything else,
    /// including partial versions such as `1.2` and pre-release suffixes.
    pub fn parse(value: &str) -> Result<Self> {
        let invalid = || ModelError::InvalidVersionFormat {
            value: value.to_owned(),
        };
        let digits = value.strip_prefix('v').unwrap_or(value);
        let mut parts = digits.split('.').map(parse_component);

        let (Some(Some(major)), Some(Some(minor)), Some(Some(patch)), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        Ok(Self::new(major, minor, patch))
    }




    /// Return the git tag name for this version (`v<version>`).
    #[must_use]
    pub fn tag(&self) -> String {
        format!("v{self}")
    }
}

/// Parse one dot-separated component; only ASCII digits are accepted.
fn parse_component(part: &str) -> Option<u64> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

impl FromStr for Version {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}

impl TryFrom<String> for Version {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
