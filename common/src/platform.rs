//! The supported platform matrix for published archives.
//!
//! Upstream publishes one archive per `(operating system, architecture)`
//! pair. The matrix is fixed: three operating systems by two architectures.
//! Each pair is addressed by an [`ArchiveKey`] rendered as `<os>_<arch>`.

use crate::error::{ModelError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Base name of the executable shipped inside every archive.
pub const EXECUTABLE_STEM: &str = "circleci";

/// A supported operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Os {
    /// macOS.
    Darwin,
    /// Linux.
    Linux,
    /// Windows.
    Windows,
}

impl Os {
    /// All supported operating systems in enumeration order.
    pub const ALL: [Self; 3] = [Self::Darwin, Self::Linux, Self::Windows];

    /// Return the lower-case name used in archive file names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Darwin => "darwin",
            Self::Linux => "linux",
            Self::Windows => "windows",
        }
    }

    /// Return the archive format upstream publishes for this system.
    #[must_use]
    pub const fn archive_format(self) -> ArchiveFormat {
        match self {
            Self::Windows => ArchiveFormat::Zip,
            Self::Darwin | Self::Linux => ArchiveFormat::TarGz,
        }
    }

    /// Return the executable file name on this system.
    ///
    /// # Examples
    ///
    /// ```
    /// use circleci_mirror_common::Os;
    ///
    /// assert_eq!(Os::Linux.executable_name(), "circleci");
    /// assert_eq!(Os::Windows.executable_name(), "circleci.exe");
    /// ```
    #[must_use]
    pub fn executable_name(self) -> String {
        match self {
            Self::Windows => format!("{EXECUTABLE_STEM}.exe"),
            Self::Darwin | Self::Linux => EXECUTABLE_STEM.to_owned(),
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A supported CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Arch {
    /// 64-bit x86.
    Amd64,
    /// 64-bit ARM.
    Arm64,
}

impl Arch {
    /// All supported architectures in enumeration order.
    pub const ALL: [Self; 2] = [Self::Amd64, Self::Arm64];

    /// Return the name used in archive file names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Amd64 => "amd64",
            Self::Arm64 => "arm64",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Container format of a published archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
    /// A zip archive (`.zip`).
    Zip,
    /// A gzip-compressed tarball (`.tar.gz`).
    TarGz,
}

impl ArchiveFormat {
    /// Return the file extension without a leading dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::TarGz => "tar.gz",
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// One `(operating system, architecture)` pair from the supported matrix.
///
/// Ordering follows the enumeration order of [`ArchiveKey::all`], which
/// keeps every rendered manifest deterministic.
///
/// # Examples
///
/// ```
/// use circleci_mirror_common::{Arch, ArchiveFormat, ArchiveKey, Os};
///
/// let key: ArchiveKey = "windows_arm64".parse().expect("supported key");
/// assert_eq!(key, ArchiveKey::new(Os::Windows, Arch::Arm64));
/// assert_eq!(key.format(), ArchiveFormat::Zip);
/// assert_eq!(ArchiveKey::all().len(), 6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArchiveKey {
    os: Os,
    arch: Arch,
}

impl ArchiveKey {
    /// Create a key from its components.
    #[must_use]
    pub const fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// Return every supported key, operating system first.
    #[must_use]
    pub fn all() -> Vec<Self> {
        Os::ALL
            .into_iter()
            .flat_map(|os| Arch::ALL.into_iter().map(move |arch| Self::new(os, arch)))
            .collect()
    }

    /// Return the operating system component.
    #[must_use]
    pub const fn os(&self) -> Os {
        self.os
    }

    /// Return the architecture component.
    #[must_use]
    pub const fn arch(&self) -> Arch {
        self.arch
    }

    /// Return the archive format published for this key.
    #[must_use]
    pub const fn format(&self) -> ArchiveFormat {
        self.os.archive_format()
    }

    /// Return the executable file name for this key's operating system.
    #[must_use]
    pub fn executable_name(&self) -> String {
        self.os.executable_name()
    }
}

impl FromStr for ArchiveKey {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self> {
        Self::all()
            .into_iter()
            .find(|key| key.to_string() == value)
            .ok_or_else(|| ModelError::UnknownArchiveKey {
                value: value.to_owned(),
                expected: Self::all()
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

impl TryFrom<String> for ArchiveKey {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ArchiveKey> for String {
    fn from(key: ArchiveKey) -> Self {
        key.to_string()
    }
}

impl fmt::Display for ArchiveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.os, self.arch)
    }
}
