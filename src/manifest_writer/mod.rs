//! Regenerate the downstream packaging files for one version.
//!
//! The writer always produces the structured manifest document and then
//! applies the configured templates and patch targets. Every output is
//! rendered in memory before any file is touched, and each file is replaced
//! through a temporary file in the same directory followed by a rename.
//! After writing, each file is read back: the manifest document and patched
//! files must reproduce the input [`ManifestState`] and rendered templates
//! must match byte for byte.

pub mod patch;
mod scanner;
pub mod template;

use crate::config::{PatchTarget, TemplateTarget};
use camino::{Utf8Path, Utf8PathBuf};
use circleci_mirror_common::{ManifestState, ModelError};
use log::debug;
use patch::{PatchError, patch_source, read_patched_state};
use std::io::Write;
use template::{describe_tera_error, render_template};

pub use scanner::ScanError;

/// Errors arising from regenerating downstream files.
#[derive(Debug, thiserror::Error)]
pub enum ManifestWriteError {
    /// A file could not be read or written.
    #[error("failed to {action} {path}: {source}")]
    Io {
        /// What was being attempted.
        action: &'static str,
        /// The file involved.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A template failed to render.
    #[error("failed to render template {path}: {reason}")]
    Template {
        /// The template file.
        path: Utf8PathBuf,
        /// The rendering error and its causes.
        reason: String,
    },

    /// A patch target could not be patched or read back.
    #[error("failed to patch {path}: {source}")]
    Patch {
        /// The patched file.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        source: PatchError,
    },

    /// The manifest document could not be produced or parsed.
    #[error("manifest document {path} is invalid: {source}")]
    Document {
        /// The manifest document.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        source: ModelError,
    },

    /// A written file does not reproduce the manifest it was written from.
    #[error("{path} does not round-trip to the manifest for v{version}")]
    RoundTripMismatch {
        /// The file that failed verification.
        path: Utf8PathBuf,
        /// The version being written.
        version: String,
    },
}

type Result<T> = std::result::Result<T, ManifestWriteError>;

/// How a written file is checked after writing.
#[derive(Debug, Clone)]
enum Verification {
    Document,
    Patched(PatchTarget),
    Exact,
}

/// One fully rendered output file.
#[derive(Debug, Clone)]
struct RenderedFile {
    path: Utf8PathBuf,
    contents: String,
    verification: Verification,
}

/// Writes manifest state into a repository working tree.
#[derive(Debug, Clone)]
pub struct ManifestWriter {
    repo_dir: Utf8PathBuf,
    manifest_path: Utf8PathBuf,
    templates: Vec<TemplateTarget>,
    patches: Vec<PatchTarget>,
}

impl ManifestWriter {
    /// Create a writer for `repo_dir`.
    ///
    /// Relative paths in the targets resolve against `repo_dir`.
    #[must_use]
    pub fn new(
        repo_dir: impl Into<Utf8PathBuf>,
        manifest_path: impl Into<Utf8PathBuf>,
        templates: Vec<TemplateTarget>,
        patches: Vec<PatchTarget>,
    ) -> Self {
        Self {
            repo_dir: repo_dir.into(),
            manifest_path: manifest_path.into(),
            templates,
            patches,
        }
    }

    /// Return the absolute path of the manifest document.
    #[must_use]
    pub fn manifest_path(&self) -> Utf8PathBuf {
        self.resolve(&self.manifest_path)
    }

    /// Read the manifest document currently in the working tree.
    ///
    /// Returns `None` when no document exists yet.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestWriteError`] if the document exists but cannot be
    /// read or parsed.
    pub fn current_state(&self) -> Result<Option<ManifestState>> {
        let path = self.manifest_path();
        match std::fs::read_to_string(&path) {
            Ok(document) => ManifestState::from_document(&document)
                .map(Some)
                .map_err(|source| ManifestWriteError::Document { path, source }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ManifestWriteError::Io {
                action: "read",
                path,
                source,
            }),
        }
    }

    /// Write every output for `state` and verify it.
    ///
    /// Returns the written paths in write order: the manifest document,
    /// then templates, then patch targets.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestWriteError`] if rendering fails (no file is
    /// touched), a write fails, or a written file does not round-trip.
    pub fn write(&self, state: &ManifestState) -> Result<Vec<Utf8PathBuf>> {
        let rendered = self.render_all(state)?;
        for file in &rendered {
            debug!("writing {}", file.path);
            write_atomically(&file.path, &file.contents)?;
        }
        for file in &rendered {
            verify(file, state)?;
        }
        Ok(rendered.into_iter().map(|file| file.path).collect())
    }

    fn render_all(&self, state: &ManifestState) -> Result<Vec<RenderedFile>> {
        let manifest_path = self.manifest_path();
        let document = state
            .to_document()
            .map_err(|source| ManifestWriteError::Document {
                path: manifest_path.clone(),
                source,
            })?;
        let mut rendered = vec![RenderedFile {
            path: manifest_path,
            contents: document,
            verification: Verification::Document,
        }];

        for target in &self.templates {
            let source_path = self.resolve(&target.source);
            let source = read_file(&source_path)?;
            let contents = render_template(target.source.as_str(), &source, state).map_err(
                |err| ManifestWriteError::Template {
                    path: source_path.clone(),
                    reason: describe_tera_error(&err),
                },
            )?;
            rendered.push(RenderedFile {
                path: self.resolve(&target.destination),
                contents,
                verification: Verification::Exact,
            });
        }

        for target in &self.patches {
            let path = self.resolve(&target.path);
            let source = read_file(&path)?;
            let contents = patch_source(&source, target, state).map_err(|source| {
                ManifestWriteError::Patch {
                    path: path.clone(),
                    source,
                }
            })?;
            rendered.push(RenderedFile {
                path,
                contents,
                verification: Verification::Patched(target.clone()),
            });
        }

        Ok(rendered)
    }

    fn resolve(&self, path: &Utf8Path) -> Utf8PathBuf {
        self.repo_dir.join(path)
    }
}

fn read_file(path: &Utf8Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| ManifestWriteError::Io {
        action: "read",
        path: path.to_owned(),
        source,
    })
}

/// Replace `path` with `contents` through a same-directory temporary file.
fn write_atomically(path: &Utf8Path, contents: &str) -> Result<()> {
    let io_error = |source| ManifestWriteError::Io {
        action: "write",
        path: path.to_owned(),
        source,
    };
    let dir = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    std::fs::create_dir_all(dir).map_err(io_error)?;
    let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(io_error)?;
    temp.write_all(contents.as_bytes()).map_err(io_error)?;
    temp.as_file().sync_all().map_err(io_error)?;
    temp.persist(path).map_err(|err| io_error(err.error))?;
    Ok(())
}

/// Re-read a written file and check it reproduces `state`.
fn verify(file: &RenderedFile, state: &ManifestState) -> Result<()> {
    let written = read_file(&file.path)?;
    let reproduced = match &file.verification {
        Verification::Document => ManifestState::from_document(&written)
            .map_err(|source| ManifestWriteError::Document {
                path: file.path.clone(),
                source,
            })?
            .eq(state),
        Verification::Patched(target) => read_patched_state(&written, target)
            .map_err(|source| ManifestWriteError::Patch {
                path: file.path.clone(),
                source,
            })?
            .eq(state),
        Verification::Exact => written == file.contents,
    };
    if reproduced {
        Ok(())
    } else {
        Err(ManifestWriteError::RoundTripMismatch {
            path: file.path.clone(),
            version: state.version().to_string(),
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Manifest fixtures shared by the writer's unit tests.

    use circleci_mirror_common::{
        Arch, ArchiveKey, ArchiveNaming, ChecksumEntry, ChecksumMap, ManifestState, Os,
        Sha256Digest, Version,
    };

    pub(crate) const BASE_URL: &str =
        "https://github.com/CircleCI-Public/circleci-cli/releases/download";

    fn digest_for(key: ArchiveKey) -> &'static str {
        match (key.os(), key.arch()) {
            (Os::Darwin, Arch::Amd64) => {
                "eb56773a9b42839c8605286cc3f1bcb37b91c963f6b7253742e05fd24f39810b"
            }
            (Os::Darwin, Arch::Arm64) => {
                "6070548dd31a0a0c9e18a488b01a97dfc153d8756e9168aff5e16430ac2ba260"
            }
            (Os::Linux, Arch::Amd64) => {
                "12b6d549ec86d381a4e847f02ebd1e85a062c26930b28d184cc48dd413869c0e"
            }
            (Os::Linux, Arch::Arm64) => {
                "46b54f9ae39bd1ac3cb46ee9f9c2e0509be1bd6bf53f2dc334c39be525af0544"
            }
            (Os::Windows, Arch::Amd64) => {
                "2e7649aa3d45590bc6ce04a199b720db0724bf9f19e83f80f87278fa4fcc3603"
            }
            (Os::Windows, Arch::Arm64) => {
                "dd2082bf328a05f0fbdb9e8a00cfb4d6ca6d1fb4bd2d3b4e98fde047173cffac"
            }
        }
    }

    /// Manifest for `version` carrying the digests published for 0.1.30888.
    pub(crate) fn sample_state_for(version: Version) -> ManifestState {
        let naming = ArchiveNaming::default();
        let archives: ChecksumMap = ArchiveKey::all()
            .into_iter()
            .map(|key| {
                let digest = Sha256Digest::try_from(digest_for(key)).expect("valid digest");
                (
                    key,
                    ChecksumEntry::new(naming.archive_filename(version, key), digest),
                )
            })
            .collect();
        ManifestState::new(version, BASE_URL, archives).expect("complete manifest")
    }

    /// The manifest published for 0.1.30888.
    pub(crate) fn sample_state() -> ManifestState {
        sample_state_for(Version::new(0, 1, 30888))
    }
}
