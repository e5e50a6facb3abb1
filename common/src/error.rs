//! Error types for release versions, platform keys, digests and manifests.
//!
//! Each variant names the rejected input and the constraint it violated.

use thiserror::Error;

/// Errors arising from invalid model values.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A version string does not match `v?N.N.N`.
    #[error("invalid version format \"{value}\"; expected [v]MAJOR.MINOR.PATCH")]
    InvalidVersionFormat {
        /// The rejected version string.
        value: String,
    },

    /// An archive key is not one of the supported `<os>_<arch>` pairs.
    #[error("unknown archive key \"{value}\"; expected one of: {expected}")]
    UnknownArchiveKey {
        /// The rejected key.
        value: String,
        /// Comma-separated list of accepted keys.
        expected: String,
    },

    /// A SHA-256 digest is not a valid 64-character lowercase hex string.
    #[error("invalid SHA-256 digest: {reason}")]
    InvalidSha256Digest {
        /// Description of the validation failure.
        reason: String,
    },

    /// A manifest does not carry an entry for every supported platform.
    #[error("manifest for {version} is missing archives for: {missing}")]
    IncompleteManifest {
        /// The version the manifest describes.
        version: String,
        /// Comma-separated list of missing archive keys.
        missing: String,
    },

    /// The persisted manifest document could not be (de)serialised.
    #[error("manifest document error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using [`ModelError`].
pub type Result<T> = std::result::Result<T, ModelError>;
