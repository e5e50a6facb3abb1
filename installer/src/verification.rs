//! Integrity verification of downloaded archives.
//!
//! The whole archive is hashed with SHA-256 and compared with the digest
//! recorded in the manifest before anything is extracted.

use crate::error::{InstallerError, Result};
use circleci_mirror_common::ChecksumEntry;
use sha2::{Digest, Sha256};

/// Return the lowercase hex SHA-256 digest of `bytes`.
///
/// # Examples
///
/// ```
/// use circleci_mirror_installer::verification::sha256_hex;
///
/// assert_eq!(
///     sha256_hex(b""),
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Check that `bytes` hash to the digest recorded in `entry`.
///
/// # Errors
///
/// Returns [`InstallerError::IntegrityCheckFailed`] on any mismatch.
pub fn verify(bytes: &[u8], entry: &ChecksumEntry) -> Result<()> {
    let actual = sha256_hex(bytes);
    if actual == entry.sha256.as_str() {
        Ok(())
    } else {
        Err(InstallerError::IntegrityCheckFailed {
            filename: entry.filename.clone(),
            expected: entry.sha256.to_string(),
            actual,
        })
    }
}
