//! The release manifest the installer works from.
//!
//! A copy of the repository's `manifest.json` is compiled into the binary,
//! so an installed package always fetches the version it was built for.
//! The file lives at the workspace root, where the synchroniser writes it,
//! so this crate builds only from a workspace checkout and is not
//! published on its own.

use crate::error::Result;
use camino::Utf8Path;
use circleci_mirror_common::ManifestState;

/// The manifest document compiled into the installer.
pub const BUNDLED_MANIFEST: &str = include_str!("../../manifest.json");

/// Load the manifest from `path`, or the bundled one when `None`.
///
/// # Errors
///
/// Returns [`crate::error::InstallerError::Io`] if the file cannot be read
/// and [`crate::error::InstallerError::Manifest`] if it is not a complete
/// manifest.
pub fn load_manifest(path: Option<&Utf8Path>) -> Result<ManifestState> {
    let state = match path {
        Some(path) => ManifestState::from_document(&std::fs::read_to_string(path)?)?,
        None => ManifestState::from_document(BUNDLED_MANIFEST)?,
    };
    Ok(state)
}
