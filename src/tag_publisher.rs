//! Record each mirrored version in version control.
//!
//! For every version the publisher stages the modified tracked files,
//! commits them as `Add version <version>` and tags the commit
//! `v<version>`. Steps already done by an interrupted earlier run are
//! skipped. With pushing enabled the branch and tags are pushed after
//! each version, so a later failure never loses an already published one.

use camino::Utf8PathBuf;
use circleci_mirror_common::Version;
use log::{debug, info};
use std::process::{Command, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Errors arising from git operations.
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    /// The git process could not be started or waited on.
    #[error("failed to run git {command}: {source}")]
    Spawn {
        /// The git arguments, space-separated.
        command: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Git exited unsuccessfully.
    #[error("git {command} failed: {message}")]
    Failed {
        /// The git arguments, space-separated.
        command: String,
        /// Git's diagnostic output.
        message: String,
    },

    /// Git did not finish in time and was killed.
    #[error("git {command} timed out after {seconds} seconds")]
    TimedOut {
        /// The git arguments, space-separated.
        command: String,
        /// The timeout that elapsed.
        seconds: u64,
    },
}

/// Runs git commands in the repository being synchronised.
#[cfg_attr(test, mockall::automock)]
pub trait GitExecutor {
    /// Run git with `args` and return its standard output.
    ///
    /// # Errors
    ///
    /// Returns [`GitError`] if git cannot be started, exits unsuccessfully,
    /// or exceeds its timeout.
    fn run(&self, args: &[String]) -> Result<String, GitError>;
}

/// Git executor that spawns the system `git` binary.
#[derive(Debug, Clone)]
pub struct SystemGit {
    repo_dir: Utf8PathBuf,
    timeout: Duration,
}

impl SystemGit {
    /// Create an executor running in `repo_dir` with a per-command timeout.
    #[must_use]
    pub fn new(repo_dir: impl Into<Utf8PathBuf>, timeout: Duration) -> Self {
        Self {
            repo_dir: repo_dir.into(),
            timeout,
        }
    }
}

impl GitExecutor for SystemGit {
    fn run(&self, args: &[String]) -> Result<String, GitError> {
        let command = args.join(" ");
        let spawn_error = |source| GitError::Spawn {
            command: command.clone(),
            source,
        };

        let mut child = Command::new("git")
            .args(args)
            .current_dir(self.repo_dir.as_std_path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;

        let Some(status) = child.wait_timeout(self.timeout).map_err(spawn_error)? else {
            if let Err(err) = child.kill().and_then(|()| child.wait().map(drop)) {
                debug!("failed to reap timed-out git {command}: {err}");
            }
            return Err(GitError::TimedOut {
                command,
                seconds: self.timeout.as_secs(),
            });
        };

        let stdout = child
            .stdout
            .take()
            .map(std::io::read_to_string)
            .transpose()
            .map_err(spawn_error)?
            .unwrap_or_default();
        let stderr = child
            .stderr
            .take()
            .map(std::io::read_to_string)
            .transpose()
            .map_err(spawn_error)?
            .unwrap_or_default();

        if status.success() {
            Ok(stdout)
        } else {
            let message = if stderr.trim().is_empty() {
                stdout.trim().to_owned()
            } else {
                stderr.trim().to_owned()
            };
            Err(GitError::Failed { command, message })
        }
    }
}

/// Commits, tags and optionally pushes mirrored versions.
pub struct TagPublisher<'a> {
    git: &'a dyn GitExecutor,
    push: bool,
}

impl<'a> TagPublisher<'a> {
    /// Create a publisher; `push` enables pushing after each version.
    #[must_use]
    pub fn new(git: &'a dyn GitExecutor, push: bool) -> Self {
        Self { git, push }
    }

    /// Publish `version` from the current working tree.
    ///
    /// A run interrupted after committing or tagging leaves the version
    /// unmirrored, so the next run publishes it again. The commit is skipped
    /// when nothing is staged and the tag when it already exists, letting
    /// that run finish the job.
    ///
    /// # Errors
    ///
    /// Returns the first [`GitError`]; later commands are not run.
    pub fn publish(&self, version: Version) -> Result<(), GitError> {
        let tag = version.tag();
        self.git_run(&["add", "-u"])?;

        if self.git_run(&["diff", "--cached", "--name-only"])?.trim().is_empty() {
            info!("nothing to commit for {tag}; tagging the current commit");
        } else {
            self.git_run(&["commit", "-m", &format!("Add version {version}")])?;
        }

        if self.git_run(&["tag", "--list", &tag])?.trim().is_empty() {
            self.git_run(&["tag", &tag])?;
        } else {
            info!("tag {tag} already exists");
        }

        if self.push {
            self.git_run(&["push"])?;
            self.git_run(&["push", "--tags"])?;
        }
        info!("published {tag}");
        Ok(())
    }

    fn git_run(&self, args: &[&str]) -> Result<String, GitError> {
        let args: Vec<String> = args.iter().map(|arg| (*arg).to_owned()).collect();
        debug!("git {}", args.join(" "));
        self.git.run(&args)
    }
}
