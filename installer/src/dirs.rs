//! Directory resolution abstraction for platform-specific paths.

use camino::Utf8PathBuf;

/// Platform directories relevant to installation.
#[cfg_attr(test, mockall::automock)]
pub trait BaseDirs {
    /// The user's executable directory, where the platform defines one.
    fn executable_dir(&self) -> Option<Utf8PathBuf>;

    /// The user's home directory.
    fn home_dir(&self) -> Option<Utf8PathBuf>;
}

/// [`BaseDirs`] backed by `directories-next`.
pub struct SystemBaseDirs {
    inner: directories_next::BaseDirs,
}

impl SystemBaseDirs {
    /// Resolve the current user's directories.
    ///
    /// Returns `None` when no home directory can be found.
    #[must_use]
    pub fn new() -> Option<Self> {
        directories_next::BaseDirs::new().map(|inner| Self { inner })
    }
}

impl BaseDirs for SystemBaseDirs {
    fn executable_dir(&self) -> Option<Utf8PathBuf> {
        self.inner
            .executable_dir()
            .and_then(|dir| Utf8PathBuf::from_path_buf(dir.to_path_buf()).ok())
    }

    fn home_dir(&self) -> Option<Utf8PathBuf> {
        Utf8PathBuf::from_path_buf(self.inner.home_dir().to_path_buf()).ok()
    }
}

/// Return the default installation directory.
///
/// Uses the platform executable directory, falling back to `~/.local/bin`
/// where the platform defines none.
#[must_use]
pub fn default_install_dir(dirs: &dyn BaseDirs) -> Option<Utf8PathBuf> {
    dirs.executable_dir()
        .or_else(|| dirs.home_dir().map(|home| home.join(".local").join("bin")))
}
