//! Install pipeline orchestration.
//!
//! Fetch, verify, extract and install run strictly in that order. Each
//! stage consumes the previous stage's output, and no stage runs after a
//! failure.

use crate::download::ArtefactDownloader;
use crate::error::{InstallerError, Result};
use crate::extraction::extract_executable;
use crate::install::install_executable;
use crate::verification::verify;
use camino::{Utf8Path, Utf8PathBuf};
use circleci_mirror_common::{ArchiveKey, ManifestState, Version};
use log::info;

/// What an install run placed where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledExecutable {
    /// The installed version.
    pub version: Version,
    /// The platform whose archive was used.
    pub key: ArchiveKey,
    /// The executable's final path.
    pub path: Utf8PathBuf,
}

/// Install the executable for `key` described by `manifest` into
/// `install_dir`.
///
/// # Errors
///
/// Returns [`InstallerError::MissingArchive`] if the manifest lacks `key`,
/// and otherwise the first error raised by download, verification,
/// extraction or installation.
pub fn install(
    downloader: &dyn ArtefactDownloader,
    manifest: &ManifestState,
    key: ArchiveKey,
    install_dir: &Utf8Path,
) -> Result<InstalledExecutable> {
    let entry = manifest
        .entry(key)
        .ok_or(InstallerError::MissingArchive { key })?;
    let url = manifest
        .archive_url(key)
        .ok_or(InstallerError::MissingArchive { key })?;

    info!("downloading {url}");
    let archive = downloader.download(&url)?;
    verify(&archive, entry)?;

    let executable_name = key.executable_name();
    let executable = extract_executable(&archive, key.format(), &entry.filename, &executable_name)?;
    let path = install_executable(install_dir, &executable_name, &executable)?;

    Ok(InstalledExecutable {
        version: manifest.version(),
        key,
        path,
    })
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
