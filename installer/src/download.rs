//! Archive download.
//!
//! Provides a trait-based abstraction for fetching release archives,
//! enabling dependency injection for testing.

use std::io::Read;
use std::time::Duration;

/// Network timeout for archive downloads.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Trait for downloading release archives.
///
/// # Examples
///
/// ```
/// use circleci_mirror_installer::download::{DOWNLOAD_TIMEOUT, HttpDownloader};
///
/// let downloader = HttpDownloader::new(DOWNLOAD_TIMEOUT);
/// // Use downloader.download(url) in production
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ArtefactDownloader {
    /// Download `url` and return the complete body.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] for any non-success status or transport
    /// failure.
    fn download(&self, url: &str) -> Result<Vec<u8>, DownloadError>;
}

/// Errors arising from archive downloads.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// HTTP request failed.
    #[error("download failed for {url}: {reason}")]
    HttpError {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The archive was not found (HTTP 404).
    #[error("archive not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },
}

/// HTTP-based downloader using `ureq`.
pub struct HttpDownloader {
    agent: ureq::Agent,
}

impl HttpDownloader {
    /// Create a downloader whose requests time out after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }
}

impl ArtefactDownloader for HttpDownloader {
    fn download(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        let mut body = response.into_body();
        let mut bytes = Vec::new();
        body.as_reader()
            .read_to_end(&mut bytes)
            .map_err(|e| DownloadError::HttpError {
                url: url.to_owned(),
                reason: e.to_string(),
            })?;
        log::debug!("downloaded {} bytes from {url}", bytes.len());
        Ok(bytes)
    }
}

/// Map a ureq error to a [`DownloadError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> DownloadError {
    match err {
        ureq::Error::StatusCode(404) => DownloadError::NotFound {
            url: url.to_owned(),
        },
        other => DownloadError::HttpError {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}
