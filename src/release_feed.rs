//! Paginated release and tag feeds.
//!
//! [`ReleaseFeed`] is the seam between the diff engine and the hosting
//! service. [`GithubReleaseFeed`] talks to the GitHub REST API; tests inject
//! stubs. The free functions [`all_releases`] and [`all_tags`] walk pages
//! from 1 until the first empty page.

use crate::http::{HttpError, get_text, http_agent};
use log::debug;
use serde::Deserialize;
use std::time::Duration;

/// Upper bound on pages fetched for one listing.
///
/// A server that ignores the `page` parameter would otherwise be walked
/// forever.
pub const MAX_PAGES: u32 = 1000;

/// One upstream release as listed by the release feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseRecord {
    /// The git tag the release was cut from, e.g. `v0.1.30888`.
    pub tag_name: String,
    /// Whether the release is an unpublished draft.
    #[serde(default)]
    pub draft: bool,
    /// Whether the release is marked as a pre-release.
    #[serde(default)]
    pub prerelease: bool,
}

impl ReleaseRecord {
    /// Create a published, non-prerelease record for `tag_name`.
    #[must_use]
    pub fn published(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            draft: false,
            prerelease: false,
        }
    }

    /// Return `true` if the release should be mirrored.
    #[must_use]
    pub const fn is_mirrorable(&self) -> bool {
        !self.draft && !self.prerelease
    }
}

#[derive(Deserialize)]
struct TagRecord {
    name: String,
}

/// Errors arising from reading a feed.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// The request failed.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The response body was not the expected JSON shape.
    #[error("unexpected response from {url}: {reason}")]
    Decode {
        /// The URL that was requested.
        url: String,
        /// The decoder's message.
        reason: String,
    },

    /// The listing did not end within [`MAX_PAGES`] pages.
    #[error("listing for {repo} did not end after {MAX_PAGES} pages")]
    PageLimit {
        /// The repository being listed.
        repo: String,
    },
}

/// A source of paginated release and tag listings.
///
/// Pages are 1-based. An empty page marks the end of a listing.
#[cfg_attr(test, mockall::automock)]
pub trait ReleaseFeed {
    /// Return one page of releases for `repo`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] if the page cannot be fetched or decoded.
    fn releases_page(&self, repo: &str, page: u32) -> Result<Vec<ReleaseRecord>, FeedError>;

    /// Return one page of tag names for `repo`.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] if the page cannot be fetched or decoded.
    fn tags_page(&self, repo: &str, page: u32) -> Result<Vec<String>, FeedError>;
}

/// Feed backed by the GitHub REST API.
pub struct GithubReleaseFeed {
    agent: ureq::Agent,
    api_base_url: String,
    per_page: u32,
    token: Option<String>,
}

impl GithubReleaseFeed {
    /// Create a feed for `api_base_url` (e.g. `https://api.github.com`).
    ///
    /// When `token` is present it is sent as a bearer token on every request.
    #[must_use]
    pub fn new(
        api_base_url: impl Into<String>,
        per_page: u32,
        timeout: Duration,
        token: Option<String>,
    ) -> Self {
        Self {
            agent: http_agent(timeout),
            api_base_url: api_base_url.into(),
            per_page,
            token,
        }
    }

    /// Return the listing URL for one page of `resource` (`releases` or
    /// `tags`).
    ///
    /// # Examples
    ///
    /// ```
    /// use circleci_mirror::release_feed::GithubReleaseFeed;
    /// use std::time::Duration;
    ///
    /// let feed = GithubReleaseFeed::new("https://api.github.com", 100, Duration::from_secs(30), None);
    /// assert_eq!(
    ///     feed.page_url("CircleCI-Public/circleci-cli", "releases", 2),
    ///     "https://api.github.com/repos/CircleCI-Public/circleci-cli/releases?per_page=100&page=2"
    /// );
    /// ```
    #[must_use]
    pub fn page_url(&self, repo: &str, resource: &str, page: u32) -> String {
        format!(
            "{}/repos/{repo}/{resource}?per_page={}&page={page}",
            self.api_base_url.trim_end_matches('/'),
            self.per_page
        )
    }

    fn fetch_page<T>(&self, url: &str) -> Result<Vec<T>, FeedError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let mut headers = vec![("Accept", "application/vnd.github+json".to_owned())];
        if let Some(token) = &self.token {
            headers.push(("Authorization", format!("Bearer {token}")));
        }
        let body = get_text(&self.agent, url, &headers)?;
        serde_json::from_str(&body).map_err(|e| FeedError::Decode {
            url: url.to_owned(),
            reason: e.to_string(),
        })
    }
}

impl ReleaseFeed for GithubReleaseFeed {
    fn releases_page(&self, repo: &str, page: u32) -> Result<Vec<ReleaseRecord>, FeedError> {
        self.fetch_page(&self.page_url(repo, "releases", page))
    }

    fn tags_page(&self, repo: &str, page: u32) -> Result<Vec<String>, FeedError> {
        let tags: Vec<TagRecord> = self.fetch_page(&self.page_url(repo, "tags", page))?;
        Ok(tags.into_iter().map(|tag| tag.name).collect())
    }
}

/// Collect every page of a listing until the first empty page.
fn collect_pages<T>(
    repo: &str,
    mut fetch: impl FnMut(u32) -> Result<Vec<T>, FeedError>,
) -> Result<Vec<T>, FeedError> {
    let mut items = Vec::new();
    for page in 1..=MAX_PAGES {
        let batch = fetch(page)?;
        debug!("{repo}: page {page} returned {} item(s)", batch.len());
        if batch.is_empty() {
            return Ok(items);
        }
        items.extend(batch);
    }
    Err(FeedError::PageLimit {
        repo: repo.to_owned(),
    })
}

/// Return every release of `repo`, newest first, in feed order.
///
/// Drafts and prereleases are included; callers filter with
/// [`ReleaseRecord::is_mirrorable`].
///
/// # Errors
///
/// Returns the first [`FeedError`] encountered.
pub fn all_releases(feed: &dyn ReleaseFeed, repo: &str) -> Result<Vec<ReleaseRecord>, FeedError> {
    collect_pages(repo, |page| feed.releases_page(repo, page))
}

/// Return every tag name of `repo`.
///
/// # Errors
///
/// Returns the first [`FeedError`] encountered.
pub fn all_tags(feed: &dyn ReleaseFeed, repo: &str) -> Result<Vec<String>, FeedError> {
    collect_pages(repo, |page| feed.tags_page(repo, page))
}
