//! Resolve the host platform to a published archive.
//!
//! Operating system names are matched case-insensitively, with `macos`
//! accepted for `darwin`. Architecture strings are matched loosely, since
//! hosts report the same CPU as `x86_64`, `AMD64`, `i686` and so on.

use crate::error::{InstallerError, Result};
use circleci_mirror_common::{Arch, ArchiveKey, Os};

/// Map an operating system name and machine string to an archive key.
///
/// # Errors
///
/// Returns [`InstallerError::UnsupportedPlatform`] when either component
/// has no published archive.
///
/// # Examples
///
/// ```
/// use circleci_mirror_installer::platform::resolve;
///
/// let key = resolve("Linux", "x86_64").expect("supported");
/// assert_eq!(key.to_string(), "linux_amd64");
/// assert_eq!(resolve("macos", "aarch64").expect("supported").to_string(), "darwin_arm64");
/// ```
pub fn resolve(os: &str, machine: &str) -> Result<ArchiveKey> {
    let unsupported = || InstallerError::UnsupportedPlatform {
        os: os.to_owned(),
        arch: machine.to_owned(),
    };
    let os_kind = parse_os(os).ok_or_else(unsupported)?;
    let arch = parse_arch(os_kind, machine).ok_or_else(unsupported)?;
    Ok(ArchiveKey::new(os_kind, arch))
}

/// Resolve the platform this process runs on.
///
/// # Errors
///
/// Returns [`InstallerError::UnsupportedPlatform`] on hosts without a
/// published archive.
pub fn host() -> Result<ArchiveKey> {
    resolve(std::env::consts::OS, std::env::consts::ARCH)
}

fn parse_os(os: &str) -> Option<Os> {
    match os.to_ascii_lowercase().as_str() {
        "darwin" | "macos" => Some(Os::Darwin),
        "linux" => Some(Os::Linux),
        "windows" => Some(Os::Windows),
        _ => None,
    }
}

fn parse_arch(os: Os, machine: &str) -> Option<Arch> {
    let machine = machine.to_ascii_lowercase();
    if machine.contains("arm") || machine == "aarch64" {
        return Some(Arch::Arm64);
    }
    let is_x86 = ["x86", "amd", "i386", "i686"]
        .iter()
        .any(|marker| machine.contains(marker));
    if is_x86 || os == Os::Windows {
        return Some(Arch::Amd64);
    }
    None
}
