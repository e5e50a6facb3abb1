//! Atomic placement of the extracted executable.
//!
//! The bytes are written to a temporary file in the destination directory,
//! made executable, and renamed over the final name, so a failure never
//! leaves a truncated executable behind.

use crate::error::{InstallerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::io::Write;

/// Mode applied when no previous executable exists.
#[cfg(unix)]
const DEFAULT_MODE: u32 = 0o644;

/// Write `bytes` as `dir/name` and mark it executable.
///
/// Returns the installed path.
///
/// # Errors
///
/// Returns [`InstallerError::Install`] if the directory cannot be created
/// or the file cannot be written, chmodded or renamed.
pub fn install_executable(dir: &Utf8Path, name: &str, bytes: &[u8]) -> Result<Utf8PathBuf> {
    let destination = dir.join(name);
    let install_error = |source| InstallerError::Install {
        path: destination.clone(),
        source,
    };

    std::fs::create_dir_all(dir).map_err(install_error)?;
    let mut staged = tempfile::NamedTempFile::new_in(dir).map_err(install_error)?;
    staged.write_all(bytes).map_err(install_error)?;
    staged.as_file().sync_all().map_err(install_error)?;
    set_executable(staged.path(), &destination).map_err(install_error)?;
    staged
        .persist(&destination)
        .map_err(|err| install_error(err.error))?;

    log::info!("installed {destination}");
    Ok(destination)
}

/// Give `staged` the mode of `destination` (or the default) plus execute
/// bits for everyone.
#[cfg(unix)]
fn set_executable(staged: &std::path::Path, destination: &Utf8Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let base = match std::fs::metadata(destination) {
        Ok(existing) => existing.permissions().mode() & 0o7777,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => DEFAULT_MODE,
        Err(err) => return Err(err),
    };
    std::fs::set_permissions(staged, std::fs::Permissions::from_mode(base | 0o111))
}

#[cfg(not(unix))]
fn set_executable(_staged: &std::path::Path, _destination: &Utf8Path) -> std::io::Result<()> {
    Ok(())
}
