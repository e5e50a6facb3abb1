//! Error types for the release synchroniser.
//!
//! Each pipeline stage owns a narrow error enum close to the code that raises
//! it ([`FeedError`], [`ChecksumError`], [`ManifestWriteError`],
//! [`GitError`]). [`SyncError`] gathers them for the run as a whole and
//! classifies which failures end a run and which only skip one version.

use crate::checksums::ChecksumError;
use crate::config::ConfigError;
use crate::http::HttpError;
use crate::lock::LockError;
use crate::manifest_writer::ManifestWriteError;
use crate::release_feed::FeedError;
use crate::tag_publisher::GitError;
use circleci_mirror_common::{ModelError, Version};
use thiserror::Error;

/// Errors that can end a synchronisation run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The release or tag feed could not be read.
    #[error("release feed unavailable: {0}")]
    Feed(#[from] FeedError),

    /// An upstream release carries a tag that is not a valid version.
    #[error("upstream release tag {tag} is not a valid version")]
    UntrustedTag {
        /// The offending tag name.
        tag: String,
        /// Why the tag failed to parse.
        #[source]
        source: ModelError,
    },

    /// The checksum manifest for a version is missing or does not cover
    /// every supported platform.
    #[error("incomplete checksum manifest for v{version}: {reason}")]
    IncompleteChecksumManifest {
        /// The version whose checksums could not be resolved.
        version: Version,
        /// What was missing.
        reason: String,
    },

    /// Downloading a checksum manifest failed for a reason other than a
    /// missing file.
    #[error("checksum manifest transport failure: {0}")]
    Checksum(#[source] HttpError),

    /// Writing or verifying the downstream manifests failed.
    #[error(transparent)]
    Manifest(#[from] ManifestWriteError),

    /// A version-control command failed.
    #[error(transparent)]
    Git(#[from] GitError),

    /// The configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Another synchronisation run holds the repository lock.
    #[error(transparent)]
    AlreadyRunning(#[from] LockError),

    /// The data model rejected a value.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    /// Return `true` when the failure concerns only the version being
    /// processed, so a run may skip it and continue with the next one.
    #[must_use]
    pub const fn is_version_local(&self) -> bool {
        matches!(self, Self::IncompleteChecksumManifest { .. })
    }
}

impl From<ChecksumError> for SyncError {
    fn from(err: ChecksumError) -> Self {
        match err {
            ChecksumError::Incomplete { version, reason } => {
                Self::IncompleteChecksumManifest { version, reason }
            }
            ChecksumError::Transport(source) => Self::Checksum(source),
        }
    }
}

/// Result type for synchronisation operations.
pub type Result<T> = std::result::Result<T, SyncError>;
