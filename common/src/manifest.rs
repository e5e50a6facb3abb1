//! Checksum entries and the persisted manifest document.
//!
//! [`ManifestState`] is the only long-lived record in the system: the
//! synchroniser writes it once per mirrored version and the installer reads
//! it to decide what to download. It always covers every [`ArchiveKey`] in
//! the supported matrix, so an installer never meets a missing platform
//! entry for a published version.
//!
//! The document form is pretty-printed JSON with keys in enumeration order:
//!
//! ```json
//! {
//!   "version": "0.1.30888",
//!   "base_url": "https://github.com/CircleCI-Public/circleci-cli/releases/download",
//!   "archives": {
//!     "darwin_amd64": {
//!       "filename": "circleci-cli_0.1.30888_darwin_amd64.tar.gz",
//!       "sha256": "..."
//!     }
//!   }
//! }
//! ```

use crate::error::{ModelError, Result};
use crate::naming::release_asset_url;
use crate::platform::ArchiveKey;
use crate::sha256_digest::Sha256Digest;
use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The archive file name and digest published for one platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChecksumEntry {
    /// The archive file name, e.g. `circleci-cli_0.1.30888_linux_amd64.tar.gz`.
    pub filename: String,
    /// The SHA-256 digest of the archive.
    pub sha256: Sha256Digest,
}

impl ChecksumEntry {
    /// Create an entry from its parts.
    #[must_use]
    pub fn new(filename: impl Into<String>, sha256: Sha256Digest) -> Self {
        Self {
            filename: filename.into(),
            sha256,
        }
    }
}

/// Checksum entries keyed by platform, iterated in enumeration order.
pub type ChecksumMap = BTreeMap<ArchiveKey, ChecksumEntry>;

/// Return the supported keys that have no entry in `archives`.
#[must_use]
pub fn missing_keys(archives: &ChecksumMap) -> Vec<ArchiveKey> {
    ArchiveKey::all()
        .into_iter()
        .filter(|key| !archives.contains_key(key))
        .collect()
}

/// The persisted record of one mirrored version.
///
/// # Examples
///
/// ```
/// use circleci_mirror_common::{ArchiveKey, ArchiveNaming, ChecksumEntry, ChecksumMap,
///     ManifestState, Sha256Digest, Version};
///
/// let version = Version::new(0, 1, 30888);
/// let naming = ArchiveNaming::default();
/// let archives: ChecksumMap = ArchiveKey::all()
///     .into_iter()
///     .map(|key| {
///         let digest = Sha256Digest::try_from("a".repeat(64)).expect("valid digest");
///         (key, ChecksumEntry::new(naming.archive_filename(version, key), digest))
///     })
///     .collect();
///
/// let state = ManifestState::new(version, "https://example.test/download", archives)
///     .expect("complete manifest");
/// let document = state.to_document().expect("serialise");
/// assert_eq!(ManifestState::from_document(&document).expect("parse"), state);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestState {
    version: Version,
    base_url: String,
    archives: ChecksumMap,
}

/// Unvalidated document shape, checked by [`ManifestState::new`].
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestDocument {
    version: Version,
    base_url: String,
    archives: ChecksumMap,
}

impl ManifestState {
    /// Build a manifest, requiring an entry for every supported platform.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::IncompleteManifest`] if any [`ArchiveKey`] is
    /// absent from `archives`.
    pub fn new(version: Version, base_url: impl Into<String>, archives: ChecksumMap) -> Result<Self> {
        let missing = missing_keys(&archives);
        if !missing.is_empty() {
            return Err(ModelError::IncompleteManifest {
                version: version.to_string(),
                missing: join_keys(&missing),
            });
        }
        Ok(Self {
            version,
            base_url: base_url.into(),
            archives,
        })
    }

    /// Parse and validate a persisted manifest document.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Json`] for malformed documents or invalid field
    /// values, and [`ModelError::IncompleteManifest`] for missing platforms.
    pub fn from_document(document: &str) -> Result<Self> {
        let raw: ManifestDocument = serde_json::from_str(document)?;
        Self::new(raw.version, raw.base_url, raw.archives)
    }

    /// Render the manifest document.
    ///
    /// The output is byte-identical for equal manifests and ends with a
    /// newline.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Json`] if serialisation fails.
    pub fn to_document(&self) -> Result<String> {
        let mut document = serde_json::to_string_pretty(self)?;
        document.push('\n');
        Ok(document)
    }

    /// Return the mirrored version.
    #[must_use]
    pub fn version(&self) -> Version {
        self.version
    }

    /// Return the base download URL for release assets.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Return every checksum entry, keyed by platform.
    #[must_use]
    pub fn archives(&self) -> &ChecksumMap {
        &self.archives
    }

    /// Return the entry for one platform.
    #[must_use]
    pub fn entry(&self, key: ArchiveKey) -> Option<&ChecksumEntry> {
        self.archives.get(&key)
    }

    /// Return the download URL of the archive for one platform.
    #[must_use]
    pub fn archive_url(&self, key: ArchiveKey) -> Option<String> {
        self.entry(key)
            .map(|entry| release_asset_url(&self.base_url, self.version, &entry.filename))
    }
}

/// Render keys as a comma-separated list for messages.
#[must_use]
pub fn join_keys(keys: &[ArchiveKey]) -> String {
    keys.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::ArchiveNaming;
    use crate::platform::{Arch, Os};
    use rstest::{fixture, rstest};

    const BASE_URL: &str = "https://github.com/CircleCI-Public/circleci-cli/releases/download";

    fn digest(fill: char) -> Sha256Digest {
        Sha256Digest::try_from(fill.to_string().repeat(64)).expect("valid digest")
    }

    #[fixture]
    fn archives() -> ChecksumMap {
        let naming = ArchiveNaming::default();
        let version = Version::new(0, 1, 30888);
        ArchiveKey::all()
            .into_iter()
            .zip("abcdef".chars())
            .map(|(key, fill)| {
                (
                    key,
                    ChecksumEntry::new(naming.archive_filename(version, key), digest(fill)),
                )
            })
            .collect()
    }

    #[rstest]
    fn document_round_trips(archives: ChecksumMap) {
        let state =
            ManifestState::new(Version::new(0, 1, 30888), BASE_URL, archives).expect("complete");
        let document = state.to_document().expect("serialise");
        assert!(document.ends_with("}\n"));
        assert_eq!(ManifestState::from_document(&document).expect("parse"), state);
    }

    #[rstest]
    fn document_lists_keys_in_enumeration_order(archives: ChecksumMap) {
        let state =
            ManifestState::new(Version::new(0, 1, 30888), BASE_URL, archives).expect("complete");
        let document = state.to_document().expect("serialise");
        let positions: Vec<usize> = ArchiveKey::all()
            .iter()
            .map(|key| document.find(&format!("\"{key}\"")).expect("key present"))
            .collect();
        assert!(positions.windows(2).all(|pair| matches!(pair, [a, b] if a < b)));
    }

    #[rstest]
    fn serialisation_is_deterministic(archives: ChecksumMap) {
        let first = ManifestState::new(Version::new(1, 0, 0), BASE_URL, archives.clone())
            .expect("complete")
            .to_document()
            .expect("serialise");
        let second = ManifestState::new(Version::new(1, 0, 0), BASE_URL, archives)
            .expect("complete")
            .to_document()
            .expect("serialise");
        assert_eq!(first, second);
    }

    #[rstest]
    fn rejects_incomplete_archives(mut archives: ChecksumMap) {
        archives.remove(&ArchiveKey::new(Os::Windows, Arch::Arm64));
        let err = ManifestState::new(Version::new(0, 1, 30888), BASE_URL, archives)
            .expect_err("incomplete manifest rejected");
        assert!(
            matches!(&err, ModelError::IncompleteManifest { missing, .. } if missing == "windows_arm64"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn rejects_document_with_unknown_key() {
        let document = r#"{"version":"1.0.0","base_url":"x","archives":{"plan9_amd64":{"filename":"f","sha256":"aa"}}}"#;
        let err = ManifestState::from_document(document).expect_err("unknown key rejected");
        assert!(matches!(err, ModelError::Json(_)));
    }

    #[rstest]
    fn archive_url_joins_base_tag_and_filename(archives: ChecksumMap) {
        let state =
            ManifestState::new(Version::new(0, 1, 30888), BASE_URL, archives).expect("complete");
        let url = state
            .archive_url(ArchiveKey::new(Os::Linux, Arch::Amd64))
            .expect("entry present");
        assert_eq!(
            url,
            format!("{BASE_URL}/v0.1.30888/circleci-cli_0.1.30888_linux_amd64.tar.gz")
        );
    }
}
