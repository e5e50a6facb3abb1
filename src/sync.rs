//! Orchestrate one synchronisation run.
//!
//! The synchroniser asks the diff engine for the missing versions and then,
//! strictly oldest first, resolves checksums, regenerates the manifests and
//! publishes a commit and tag for each one. Fatal errors end the run;
//! versions already published stay published. An incomplete checksum
//! manifest either skips the version or stops the run, per
//! [`IncompletePolicy`].

use crate::checksums::ChecksumResolver;
use crate::config::IncompletePolicy;
use crate::error::{Result, SyncError};
use crate::manifest_writer::ManifestWriter;
use crate::output::write_stderr_line;
use crate::release_diff::ReleaseDiffEngine;
use crate::tag_publisher::TagPublisher;
use circleci_mirror_common::{ManifestState, Version};
use log::{info, warn};
use std::io::Write;

/// A version left unpublished by a run, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedVersion {
    /// The skipped version.
    pub version: Version,
    /// Why it was skipped.
    pub reason: String,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Versions committed and tagged, in publication order.
    pub published: Vec<Version>,
    /// Versions skipped because their checksums were incomplete.
    pub skipped: Vec<SkippedVersion>,
}

impl SyncReport {
    /// Return `true` if the run changed nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.published.is_empty() && self.skipped.is_empty()
    }
}

/// The collaborators of a run.
pub struct Synchroniser<'a> {
    diff: ReleaseDiffEngine<'a>,
    checksums: ChecksumResolver<'a>,
    writer: ManifestWriter,
    publisher: TagPublisher<'a>,
    on_incomplete: IncompletePolicy,
}

impl<'a> Synchroniser<'a> {
    /// Assemble a synchroniser from its stages.
    #[must_use]
    pub fn new(
        diff: ReleaseDiffEngine<'a>,
        checksums: ChecksumResolver<'a>,
        writer: ManifestWriter,
        publisher: TagPublisher<'a>,
        on_incomplete: IncompletePolicy,
    ) -> Self {
        Self {
            diff,
            checksums,
            writer,
            publisher,
            on_incomplete,
        }
    }

    /// Return the versions a run would publish, without side effects.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] if the feeds cannot be read.
    pub fn plan(&self) -> Result<Vec<Version>> {
        self.diff.missing_versions()
    }

    /// Mirror every missing version.
    ///
    /// Writes `Adding new version: v<version>` to `stderr` before each
    /// version is processed.
    ///
    /// # Errors
    ///
    /// Returns the first fatal [`SyncError`]. With
    /// [`IncompletePolicy::Stop`], an incomplete checksum manifest is fatal
    /// too.
    pub fn run(&self, stderr: &mut dyn Write) -> Result<SyncReport> {
        let mut report = SyncReport::default();
        for version in self.plan()? {
            write_stderr_line(stderr, format!("Adding new version: {}", version.tag()));
            match self.mirror_version(version) {
                Ok(()) => report.published.push(version),
                Err(err) if err.is_version_local() && self.on_incomplete == IncompletePolicy::Skip => {
                    warn!("skipping {}: {err}", version.tag());
                    report.skipped.push(SkippedVersion {
                        version,
                        reason: err.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }
        }
        Ok(report)
    }

    fn mirror_version(&self, version: Version) -> Result<()> {
        let archives = self.checksums.resolve(version)?;
        let state = ManifestState::new(version, self.checksums.base_url(), archives)
            .map_err(SyncError::Model)?;
        let written = self.writer.write(&state)?;
        info!("wrote {} file(s) for {}", written.len(), version.tag());
        self.publisher.publish(version)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
