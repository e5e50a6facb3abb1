//! Tests for sync CLI parsing.

use super::*;
use rstest::rstest;

#[test]
fn cli_parses_defaults() {
    let cli = Cli::parse_from(["circleci-mirror-sync"]);
    assert!(!cli.push);
    assert!(cli.config.is_none());
    assert!(cli.repo_dir.is_none());
    assert!(cli.min_version.is_none());
    assert!(!cli.dry_run);
    assert_eq!(cli.verbosity, 0);
    assert!(!cli.quiet);
}

#[test]
fn cli_parses_paths() {
    let cli = Cli::parse_from([
        "circleci-mirror-sync",
        "--config",
        "/etc/mirror.toml",
        "--repo-dir",
        "/srv/mirror",
    ]);
    assert_eq!(cli.config, Some(Utf8PathBuf::from("/etc/mirror.toml")));
    assert_eq!(cli.repo_dir, Some(Utf8PathBuf::from("/srv/mirror")));
}

#[rstest]
#[case("0.1.9322")]
#[case("v0.1.9322")]
fn cli_parses_min_version(#[case] raw: &str) {
    let cli = Cli::parse_from(["circleci-mirror-sync", "--min-version", raw]);
    assert_eq!(cli.min_version, Some(Version::new(0, 1, 9322)));
}

#[test]
fn cli_rejects_invalid_min_version() {
    let result = Cli::try_parse_from(["circleci-mirror-sync", "--min-version", "latest"]);
    assert!(result.is_err());
}

#[test]
fn cli_rejects_quiet_with_verbose() {
    let result = Cli::try_parse_from(["circleci-mirror-sync", "-q", "-v"]);
    assert!(result.is_err());
}

#[rstest]
#[case(&["circleci-mirror-sync"], LevelFilter::Warn)]
#[case(&["circleci-mirror-sync", "-v"], LevelFilter::Info)]
#[case(&["circleci-mirror-sync", "-vv"], LevelFilter::Debug)]
#[case(&["circleci-mirror-sync", "-vvvv"], LevelFilter::Trace)]
#[case(&["circleci-mirror-sync", "--quiet"], LevelFilter::Error)]
fn log_level_follows_flags(#[case] args: &[&str], #[case] expected: LevelFilter) {
    assert_eq!(Cli::parse_from(args).log_level(), expected);
}

#[test]
fn cli_parses_push_and_dry_run() {
    let cli = Cli::parse_from(["circleci-mirror-sync", "--push", "--dry-run"]);
    assert!(cli.push);
    assert!(cli.dry_run);
}
