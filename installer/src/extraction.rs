//! Executable extraction from release archives.
//!
//! Archives are read in memory. Exactly one regular file whose final path
//! component equals the executable name must be present; its bytes are
//! returned. Directories, links and entries whose path escapes the archive
//! root are never candidates.

use crate::error::{InstallerError, Result};
use circleci_mirror_common::ArchiveFormat;
use flate2::read::GzDecoder;
use std::io::{Cursor, Read};
use std::path::{Component, Path};

/// Extract the executable named `executable` from `archive`.
///
/// `archive_name` only labels errors.
///
/// # Errors
///
/// Returns [`InstallerError::ExecutableNotFound`] when no entry matches,
/// [`InstallerError::AmbiguousExecutable`] when several do and
/// [`InstallerError::Archive`] when the archive cannot be read.
pub fn extract_executable(
    archive: &[u8],
    format: ArchiveFormat,
    archive_name: &str,
    executable: &str,
) -> Result<Vec<u8>> {
    let archive_error = |reason: String| InstallerError::Archive {
        archive: archive_name.to_owned(),
        reason,
    };
    let mut matches = match format {
        ArchiveFormat::TarGz => tar_gz_matches(archive, executable),
        ArchiveFormat::Zip => zip_matches(archive, executable),
    }
    .map_err(archive_error)?;

    match matches.len() {
        0 => Err(InstallerError::ExecutableNotFound {
            archive: archive_name.to_owned(),
            executable: executable.to_owned(),
        }),
        1 => Ok(matches.pop().unwrap_or_default()),
        count => Err(InstallerError::AmbiguousExecutable {
            archive: archive_name.to_owned(),
            executable: executable.to_owned(),
            count,
        }),
    }
}

/// Return `true` when `path` names `executable` inside the archive root.
fn is_candidate(path: &Path, executable: &str) -> bool {
    let escapes = path.is_absolute()
        || path
            .components()
            .any(|component| matches!(component, Component::ParentDir));
    !escapes && path.file_name().is_some_and(|name| name == executable)
}

fn tar_gz_matches(archive: &[u8], executable: &str) -> std::result::Result<Vec<Vec<u8>>, String> {
    let mut tar = tar::Archive::new(GzDecoder::new(Cursor::new(archive)));
    let mut found = Vec::new();
    for entry in tar.entries().map_err(|e| e.to_string())? {
        let mut entry = entry.map_err(|e| e.to_string())?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let path = entry.path().map_err(|e| e.to_string())?.into_owned();
        if !is_candidate(&path, executable) {
            continue;
        }
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes).map_err(|e| e.to_string())?;
        found.push(bytes);
    }
    Ok(found)
}

fn zip_matches(archive: &[u8], executable: &str) -> std::result::Result<Vec<Vec<u8>>, String> {
    let mut zip = zip::ZipArchive::new(Cursor::new(archive)).map_err(|e| e.to_string())?;
    let mut found = Vec::new();
    for index in 0..zip.len() {
        let mut file = zip.by_index(index).map_err(|e| e.to_string())?;
        if !file.is_file() {
            continue;
        }
        let Some(path) = file.enclosed_name() else {
            continue;
        };
        if !is_candidate(&path, executable) {
            continue;
        }
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(|e| e.to_string())?;
        found.push(bytes);
    }
    Ok(found)
}

#[cfg(test)]
#[path = "extraction_tests.rs"]
mod tests;
