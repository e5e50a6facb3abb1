//! Archive naming policy for upstream release assets.
//!
//! Upstream names its assets `<product>_<version>_<os>_<arch>.<ext>` and
//! publishes a checksum manifest named `<product>_<version>_checksums.txt`
//! next to them, under `<base_url>/v<version>/`.

use crate::platform::ArchiveKey;
use crate::version::Version;
use std::collections::BTreeMap;

/// The upstream product prefix used in asset names.
pub const DEFAULT_PRODUCT: &str = "circleci-cli";

/// Builds asset file names and download URLs for one product.
///
/// # Examples
///
/// ```
/// use circleci_mirror_common::{Arch, ArchiveKey, ArchiveNaming, Os, Version};
///
/// let naming = ArchiveNaming::default();
/// let version = Version::new(0, 1, 30888);
/// let key = ArchiveKey::new(Os::Windows, Arch::Amd64);
/// assert_eq!(
///     naming.archive_filename(version, key),
///     "circleci-cli_0.1.30888_windows_amd64.zip"
/// );
/// assert_eq!(
///     naming.checksums_filename(version),
///     "circleci-cli_0.1.30888_checksums.txt"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveNaming {
    product: String,
}

impl ArchiveNaming {
    /// Create a naming policy for the given product prefix.
    #[must_use]
    pub fn new(product: impl Into<String>) -> Self {
        Self {
            product: product.into(),
        }
    }

    /// Return the product prefix.
    #[must_use]
    pub fn product(&self) -> &str {
        &self.product
    }

    /// Return the archive file name for `version` on `key`.
    #[must_use]
    pub fn archive_filename(&self, version: Version, key: ArchiveKey) -> String {
        format!(
            "{}_{version}_{}_{}.{}",
            self.product,
            key.os(),
            key.arch(),
            key.format().extension()
        )
    }

    /// Return the checksum manifest file name for `version`.
    #[must_use]
    pub fn checksums_filename(&self, version: Version) -> String {
        format!("{}_{version}_checksums.txt", self.product)
    }

    /// Return every expected archive file name for `version`, keyed by name.
    #[must_use]
    pub fn expected_archives(&self, version: Version) -> BTreeMap<String, ArchiveKey> {
        ArchiveKey::all()
            .into_iter()
            .map(|key| (self.archive_filename(version, key), key))
            .collect()
    }
}

impl Default for ArchiveNaming {
    fn default() -> Self {
        Self::new(DEFAULT_PRODUCT)
    }
}

/// Join a release base URL, a version and an asset file name.
///
/// # Examples
///
/// ```
/// use circleci_mirror_common::Version;
/// use circleci_mirror_common::naming::release_asset_url;
///
/// let url = release_asset_url("https://example.test/download/", Version::new(1, 2, 3), "a.zip");
/// assert_eq!(url, "https://example.test/download/v1.2.3/a.zip");
/// ```
#[must_use]
pub fn release_asset_url(base_url: &str, version: Version, filename: &str) -> String {
    format!(
        "{}/{}/{filename}",
        base_url.trim_end_matches('/'),
        version.tag()
    )
}
