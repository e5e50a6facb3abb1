//! CLI argument definitions for the CircleCI CLI installer.

use camino::Utf8PathBuf;
use circleci_mirror_common::ArchiveKey;
use clap::Parser;
use log::LevelFilter;

/// Install the CircleCI CLI executable for this machine.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "circleci-mirror-installer")]
#[command(version, about)]
#[command(long_about = concat!(
    "Install the CircleCI CLI executable for this machine.\n\n",
    "The archive for the host platform is downloaded from the upstream ",
    "release, checked against the SHA-256 digest recorded in the bundled ",
    "manifest, and its executable installed atomically.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Install into the default executable directory:\n",
    "    $ circleci-mirror-installer\n\n",
    "  Install somewhere else:\n",
    "    $ circleci-mirror-installer --install-dir ./bin\n\n",
    "  Preview without downloading:\n",
    "    $ circleci-mirror-installer --dry-run",
))]
pub struct Cli {
    /// Directory receiving the executable [default: platform-specific].
    #[arg(short, long, value_name = "DIR")]
    pub install_dir: Option<Utf8PathBuf>,

    /// Read the release manifest from FILE instead of the bundled copy.
    #[arg(short, long, value_name = "FILE")]
    pub manifest: Option<Utf8PathBuf>,

    /// Install the archive for PLATFORM (e.g. `linux_arm64`) instead of
    /// the host's.
    #[arg(long, value_name = "PLATFORM")]
    pub platform: Option<ArchiveKey>,

    /// Show what would be installed and exit.
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
