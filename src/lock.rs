//! Advisory lock preventing concurrent synchronisation of one repository.

use camino::{Utf8Path, Utf8PathBuf};
use fs2::FileExt;
use std::fs::{File, OpenOptions};

/// Lock file name, created in the repository directory.
pub const LOCK_FILE_NAME: &str = ".circleci-mirror.lock";

/// Errors arising from taking the run lock.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    /// Another process holds the lock.
    #[error("another synchronisation run holds {path}")]
    Held {
        /// The lock file.
        path: Utf8PathBuf,
    },

    /// The lock file could not be opened.
    #[error("failed to open lock file {path}: {source}")]
    Io {
        /// The lock file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// An exclusive advisory lock, released when dropped.
#[derive(Debug)]
pub struct RunLock {
    file: File,
    path: Utf8PathBuf,
}

impl RunLock {
    /// Take the lock for `repo_dir` without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Held`] if another process holds the lock and
    /// [`LockError::Io`] if the lock file cannot be opened.
    pub fn acquire(repo_dir: &Utf8Path) -> Result<Self, LockError> {
        let path = repo_dir.join(LOCK_FILE_NAME);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|source| LockError::Io {
                path: path.clone(),
                source,
            })?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Self { file, path }),
            Err(err) if err.kind() == fs2::lock_contended_error().kind() => {
                Err(LockError::Held { path })
            }
            Err(source) => Err(LockError::Io { path, source }),
        }
    }

    /// Return the lock file path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&self.file) {
            log::debug!("failed to release {}: {err}", self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo_dir() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("UTF-8 path");
        (dir, root)
    }

    #[test]
    fn second_acquire_is_refused_until_release() {
        let (_dir, root) = repo_dir();
        let first = RunLock::acquire(&root).expect("first lock");
        assert!(first.path().ends_with(LOCK_FILE_NAME));

        let err = RunLock::acquire(&root).expect_err("lock held");
        assert!(matches!(err, LockError::Held { .. }));

        drop(first);
        RunLock::acquire(&root).expect("lock released");
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let (_dir, root) = repo_dir();
        let err = RunLock::acquire(&root.join("absent")).expect_err("no directory");
        assert!(matches!(err, LockError::Io { .. }));
    }
}
