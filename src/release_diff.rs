//! Detect upstream releases that the mirror has not published yet.
//!
//! The engine lists upstream releases and downstream tags and reports the
//! versions the mirror lacks in ascending version order, whatever order the
//! releases were created in. Upstream tags are trusted: one that does not parse as
//! a version aborts the run. Downstream tags that do not parse are ignored.

use crate::error::{Result, SyncError};
use crate::release_feed::{ReleaseFeed, ReleaseRecord, all_releases, all_tags};
use circleci_mirror_common::Version;
use log::debug;
use std::collections::BTreeSet;

/// Computes the versions missing from the mirror.
pub struct ReleaseDiffEngine<'a> {
    feed: &'a dyn ReleaseFeed,
    upstream_repo: String,
    mirror_repo: String,
    min_version: Option<Version>,
}

impl<'a> ReleaseDiffEngine<'a> {
    /// Create an engine comparing `upstream_repo` against `mirror_repo`.
    ///
    /// Releases older than `min_version` are never reported.
    #[must_use]
    pub fn new(
        feed: &'a dyn ReleaseFeed,
        upstream_repo: impl Into<String>,
        mirror_repo: impl Into<String>,
        min_version: Option<Version>,
    ) -> Self {
        Self {
            feed,
            upstream_repo: upstream_repo.into(),
            mirror_repo: mirror_repo.into(),
            min_version,
        }
    }

    /// Return the versions to mirror in ascending version order.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Feed`] if either listing fails and
    /// [`SyncError::UntrustedTag`] if an upstream tag is not a version.
    pub fn missing_versions(&self) -> Result<Vec<Version>> {
        let releases = all_releases(self.feed, &self.upstream_repo)?;
        let mirrored = mirrored_versions(&all_tags(self.feed, &self.mirror_repo)?);
        debug!(
            "{} upstream release(s), {} mirrored version(s)",
            releases.len(),
            mirrored.len()
        );
        missing_from(&releases, &mirrored, self.min_version)
    }
}

/// Parse downstream tag names into the set of mirrored versions.
///
/// Tags that are not versions (for example `latest`) are skipped.
#[must_use]
pub fn mirrored_versions(tags: &[String]) -> BTreeSet<Version> {
    tags.iter()
        .filter_map(|tag| match Version::parse(tag) {
            Ok(version) => Some(version),
            Err(err) => {
                debug!("ignoring mirror tag {tag}: {err}");
                None
            }
        })
        .collect()
}

/// Select the releases absent from `mirrored`.
///
/// `releases` may be in any order. The result is sorted by version,
/// contains each version once, and excludes drafts, prereleases and
/// versions below `min_version`.
///
/// # Errors
///
/// Returns [`SyncError::UntrustedTag`] if a mirrorable release has a tag that
/// is not a version.
///
/// # Examples
///
/// ```
/// use circleci_mirror::release_diff::missing_from;
/// use circleci_mirror::release_feed::ReleaseRecord;
/// use circleci_mirror_common::Version;
/// use std::collections::BTreeSet;
///
/// let releases = vec![
///     ReleaseRecord::published("v0.1.9322"),
///     ReleaseRecord::published("v0.1.9321"),
/// ];
/// let mirrored = BTreeSet::from([Version::new(0, 1, 9321)]);
/// let missing = missing_from(&releases, &mirrored, None).expect("valid tags");
/// assert_eq!(missing, vec![Version::new(0, 1, 9322)]);
/// ```
pub fn missing_from(
    releases: &[ReleaseRecord],
    mirrored: &BTreeSet<Version>,
    min_version: Option<Version>,
) -> Result<Vec<Version>> {
    let mut missing = BTreeSet::new();
    for release in releases.iter().filter(|r| r.is_mirrorable()) {
        let version =
            Version::parse(&release.tag_name).map_err(|source| SyncError::UntrustedTag {
                tag: release.tag_name.clone(),
                source,
            })?;
        if min_version.is_some_and(|min| version < min) || mirrored.contains(&version) {
            continue;
        }
        missing.insert(version);
    }
    Ok(missing.into_iter().collect())
}
