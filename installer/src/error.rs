//! Error types for the CircleCI CLI installer.
//!
//! Every stage of the install pipeline reports through [`InstallerError`];
//! none of them leaves a partially written executable behind.

use crate::download::DownloadError;
use camino::Utf8PathBuf;
use circleci_mirror_common::{ArchiveKey, ModelError};
use thiserror::Error;

/// Errors that can occur while installing the executable.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// The host operating system or architecture has no published archive.
    #[error("unsupported platform: {os}/{arch}")]
    UnsupportedPlatform {
        /// The operating system name as reported by the host.
        os: String,
        /// The machine architecture as reported by the host.
        arch: String,
    },

    /// The archive could not be downloaded.
    #[error(transparent)]
    DownloadFailed(#[from] DownloadError),

    /// The downloaded bytes do not match the recorded digest.
    #[error("sha256 mismatch for {filename}: expected {expected}, got {actual}")]
    IntegrityCheckFailed {
        /// The archive file name.
        filename: String,
        /// The digest recorded in the manifest.
        expected: String,
        /// The digest of the downloaded bytes.
        actual: String,
    },

    /// No regular file in the archive is named like the executable.
    #[error("{archive} does not contain {executable}")]
    ExecutableNotFound {
        /// The archive file name.
        archive: String,
        /// The executable file name searched for.
        executable: String,
    },

    /// More than one regular file in the archive is named like the
    /// executable.
    #[error("{archive} contains {count} files named {executable}")]
    AmbiguousExecutable {
        /// The archive file name.
        archive: String,
        /// The executable file name searched for.
        executable: String,
        /// How many entries matched.
        count: usize,
    },

    /// The archive could not be read.
    #[error("failed to read {archive}: {reason}")]
    Archive {
        /// The archive file name.
        archive: String,
        /// Description of the failure.
        reason: String,
    },

    /// The manifest has no entry for the platform.
    #[error("manifest has no archive for {key}")]
    MissingArchive {
        /// The platform looked up.
        key: ArchiveKey,
    },

    /// The manifest document is invalid.
    #[error("invalid manifest: {0}")]
    Manifest(#[from] ModelError),

    /// No installation directory was given and none could be determined.
    #[error("could not determine an installation directory; pass --install-dir")]
    NoInstallDir,

    /// Writing the executable failed.
    #[error("failed to install {path}: {source}")]
    Install {
        /// The destination that was being written.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using [`InstallerError`].
pub type Result<T> = std::result::Result<T, InstallerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use circleci_mirror_common::{Arch, Os};

    #[test]
    fn messages_name_the_failing_input() {
        let err = InstallerError::IntegrityCheckFailed {
            filename: "circleci-cli_0.1.30888_linux_amd64.tar.gz".to_owned(),
            expected: "a".repeat(64),
            actual: "b".repeat(64),
        };
        assert!(err.to_string().starts_with("sha256 mismatch for circleci-cli_0.1.30888"));

        let err = InstallerError::MissingArchive {
            key: ArchiveKey::new(Os::Linux, Arch::Arm64),
        };
        assert_eq!(err.to_string(), "manifest has no archive for linux_arm64");
    }

    #[test]
    fn download_errors_convert_transparently() {
        let err = InstallerError::from(DownloadError::NotFound {
            url: "https://example.test/a.zip".to_owned(),
        });
        assert_eq!(err.to_string(), "archive not found: https://example.test/a.zip");
    }
}
