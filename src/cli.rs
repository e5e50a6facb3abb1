//! CLI argument definitions for the release synchroniser.
//!
//! Kept apart from the binary entrypoint so argument parsing can be tested
//! without running a synchronisation.

use camino::Utf8PathBuf;
use circleci_mirror_common::Version;
use clap::Parser;
use log::LevelFilter;

/// Mirror new CircleCI CLI releases into this repository.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "circleci-mirror-sync")]
#[command(version, about)]
#[command(long_about = concat!(
    "Mirror new CircleCI CLI releases into this repository.\n\n",
    "Upstream releases newer than the minimum version and not yet tagged in ",
    "the mirror are processed oldest first. For each one the checksum ",
    "manifest is downloaded, the manifest files are regenerated, and the ",
    "change is committed and tagged v<version>.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Mirror and push every missing release:\n",
    "    $ circleci-mirror-sync --push\n\n",
    "  List missing releases without changing anything:\n",
    "    $ circleci-mirror-sync --dry-run\n\n",
    "ENVIRONMENT:\n",
    "  GH_TOKEN    API token for the release feed (name set by token_env)\n",
    "  RUST_LOG    Overrides the log level chosen by -v/-q",
))]
pub struct Cli {
    /// Push the branch and tags after each published version.
    #[arg(long)]
    pub push: bool,

    /// Configuration file [default: <repo-dir>/mirror.toml when present].
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Repository to synchronise [default: current directory].
    #[arg(long, value_name = "DIR")]
    pub repo_dir: Option<Utf8PathBuf>,

    /// Ignore upstream releases older than this version.
    #[arg(long, value_name = "VERSION")]
    pub min_version: Option<Version>,

    /// List the missing versions and exit without writing anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl Cli {
    /// Return the log level selected by `-v` and `-q`.
    ///
    /// # Examples
    ///
    /// ```
    /// use circleci_mirror::cli::Cli;
    /// use clap::Parser;
    /// use log::LevelFilter;
    ///
    /// let cli = Cli::parse_from(["circleci-mirror-sync", "-vv"]);
    /// assert_eq!(cli.log_level(), LevelFilter::Debug);
    /// ```
    #[must_use]
    pub const fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbosity {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
