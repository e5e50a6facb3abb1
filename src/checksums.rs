//! Resolve the published SHA-256 digests for one release.
//!
//! Upstream publishes `<product>_<version>_checksums.txt` next to the
//! archives. Each line is `<sha256>  <filename>`. The resolver keeps the
//! lines naming an expected archive and fails closed unless every supported
//! platform is covered.

use crate::http::{HttpError, get_text, http_agent};
use circleci_mirror_common::manifest::{join_keys, missing_keys};
use circleci_mirror_common::naming::release_asset_url;
use circleci_mirror_common::{ArchiveNaming, ChecksumEntry, ChecksumMap, Sha256Digest, Version};
use log::{debug, warn};
use std::time::Duration;

/// Errors arising from checksum resolution.
#[derive(Debug, thiserror::Error)]
pub enum ChecksumError {
    /// The manifest is absent or does not cover every platform.
    #[error("incomplete checksum manifest for v{version}: {reason}")]
    Incomplete {
        /// The version being resolved.
        version: Version,
        /// What was missing.
        reason: String,
    },

    /// The manifest could not be downloaded.
    #[error(transparent)]
    Transport(HttpError),
}

/// A source of checksum manifest text.
#[cfg_attr(test, mockall::automock)]
pub trait ChecksumSource {
    /// Fetch the manifest at `url` as text.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::NotFound`] when the manifest does not exist and
    /// another [`HttpError`] for any other failure.
    fn fetch(&self, url: &str) -> Result<String, HttpError>;
}

/// Checksum source that downloads manifests over HTTP.
pub struct HttpChecksumSource {
    agent: ureq::Agent,
}

impl HttpChecksumSource {
    /// Create a source whose requests time out after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: http_agent(timeout),
        }
    }
}

impl ChecksumSource for HttpChecksumSource {
    fn fetch(&self, url: &str) -> Result<String, HttpError> {
        get_text(&self.agent, url, &[])
    }
}

/// Builds complete checksum maps for released versions.
pub struct ChecksumResolver<'a> {
    source: &'a dyn ChecksumSource,
    base_url: String,
    naming: ArchiveNaming,
}

impl<'a> ChecksumResolver<'a> {
    /// Create a resolver downloading from `base_url`.
    #[must_use]
    pub fn new(
        source: &'a dyn ChecksumSource,
        base_url: impl Into<String>,
        naming: ArchiveNaming,
    ) -> Self {
        Self {
            source,
            base_url: base_url.into(),
            naming,
        }
    }

    /// Return the base download URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Return the checksum manifest URL for `version`.
    #[must_use]
    pub fn manifest_url(&self, version: Version) -> String {
        release_asset_url(
            &self.base_url,
            version,
            &self.naming.checksums_filename(version),
        )
    }

    /// Resolve a checksum entry for every supported platform.
    ///
    /// # Errors
    ///
    /// Returns [`ChecksumError::Incomplete`] if the manifest is missing
    /// (HTTP 404) or lacks an entry for any platform, and
    /// [`ChecksumError::Transport`] for any other download failure.
    pub fn resolve(&self, version: Version) -> Result<ChecksumMap, ChecksumError> {
        let url = self.manifest_url(version);
        debug!("fetching checksums from {url}");
        let text = self.source.fetch(&url).map_err(|err| {
            if err.is_not_found() {
                ChecksumError::Incomplete {
                    version,
                    reason: format!("checksum manifest not found at {url}"),
                }
            } else {
                ChecksumError::Transport(err)
            }
        })?;

        let archives = parse_checksum_manifest(&text, version, &self.naming);
        let missing = missing_keys(&archives);
        if missing.is_empty() {
            Ok(archives)
        } else {
            Err(ChecksumError::Incomplete {
                version,
                reason: format!("missing archives for: {}", join_keys(&missing)),
            })
        }
    }
}

/// Parse checksum manifest text into entries for the expected archives.
///
/// Blank lines are skipped. Lines that are not exactly two tokens, or whose
/// digest is malformed, are ignored with a warning. Lines naming files that
/// are not expected archives (for example other packaging formats) are
/// ignored. The result may be incomplete.
///
/// # Examples
///
/// ```
/// use circleci_mirror::checksums::parse_checksum_manifest;
/// use circleci_mirror_common::{ArchiveNaming, Version};
///
/// let digest = "0".repeat(64);
/// let text = format!("{digest}  circleci-cli_1.0.0_linux_amd64.tar.gz\n");
/// let map = parse_checksum_manifest(&text, Version::new(1, 0, 0), &ArchiveNaming::default());
/// assert_eq!(map.len(), 1);
/// ```
#[must_use]
pub fn parse_checksum_manifest(
    text: &str,
    version: Version,
    naming: &ArchiveNaming,
) -> ChecksumMap {
    let expected = naming.expected_archives(version);
    let mut archives = ChecksumMap::new();

    for (index, line) in text.lines().enumerate() {
        let mut tokens = line.split_whitespace();
        let (digest, filename) = match (tokens.next(), tokens.next(), tokens.next()) {
            (None, _, _) => continue,
            (Some(digest), Some(filename), None) => (digest, filename),
            _ => {
                warn!("ignoring malformed checksum line {}: {line:?}", index + 1);
                continue;
            }
        };
        let Some(key) = expected.get(filename) else {
            debug!("ignoring checksum for unexpected file {filename}");
            continue;
        };
        match Sha256Digest::try_from(digest.to_ascii_lowercase()) {
            Ok(sha256) => {
                archives.insert(*key, ChecksumEntry::new(filename, sha256));
            }
            Err(err) => warn!("ignoring checksum for {filename}: {err}"),
        }
    }

    archives
}
