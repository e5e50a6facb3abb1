//! Release synchroniser CLI entrypoint.
//!
//! Mirrors every upstream CircleCI CLI release missing from the repository,
//! oldest first, committing and tagging each one.

use camino::{Utf8Path, Utf8PathBuf};
use circleci_mirror::checksums::{ChecksumResolver, HttpChecksumSource};
use circleci_mirror::cli::Cli;
use circleci_mirror::config::SyncConfig;
use circleci_mirror::error::{Result, SyncError};
use circleci_mirror::lock::RunLock;
use circleci_mirror::manifest_writer::ManifestWriter;
use circleci_mirror::output::{summary_message, write_stderr_line};
use circleci_mirror::release_diff::ReleaseDiffEngine;
use circleci_mirror::release_feed::GithubReleaseFeed;
use circleci_mirror::sync::Synchroniser;
use circleci_mirror::tag_publisher::{SystemGit, TagPublisher};
use circleci_mirror_common::ArchiveNaming;
use clap::Parser;
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    let mut stderr = std::io::stderr();
    init_logging(&cli, &mut stderr);
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

/// Log at the level chosen by `-v`/`-q`; `RUST_LOG` takes precedence.
fn init_logging(cli: &Cli, stderr: &mut dyn Write) {
    let result = env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .try_init();
    if let Err(err) = result {
        write_stderr_line(stderr, format!("failed to initialise logging: {err}"));
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<()> {
    let repo_dir = resolve_repo_dir(cli.repo_dir.clone())?;
    let config = load_config(cli, &repo_dir)?;

    let feed = GithubReleaseFeed::new(
        config.api_base_url.clone(),
        config.per_page,
        config.http_timeout(),
        config.read_token(),
    );
    let diff = ReleaseDiffEngine::new(
        &feed,
        config.upstream_repo.clone(),
        config.mirror_repo.clone(),
        config.min_version,
    );

    // Dry-run mode: list what would be mirrored without side effects
    if cli.dry_run {
        return run_dry(&diff, stderr);
    }

    let _lock = RunLock::acquire(&repo_dir)?;

    let source = HttpChecksumSource::new(config.http_timeout());
    let checksums = ChecksumResolver::new(
        &source,
        config.releases_base_url.clone(),
        ArchiveNaming::new(config.product.clone()),
    );
    let writer = ManifestWriter::new(
        repo_dir.clone(),
        config.manifest_path.clone(),
        config.templates.clone(),
        config.patch.clone(),
    );
    let git = SystemGit::new(repo_dir, config.git_timeout());
    let publisher = TagPublisher::new(&git, cli.push);

    let synchroniser = Synchroniser::new(
        diff,
        checksums,
        writer,
        publisher,
        config.on_incomplete_checksums,
    );

    let report = if cli.quiet {
        synchroniser.run(&mut std::io::sink())?
    } else {
        synchroniser.run(stderr)?
    };

    if !cli.quiet {
        for skipped in &report.skipped {
            write_stderr_line(
                stderr,
                format!("Skipped {}: {}", skipped.version.tag(), skipped.reason),
            );
        }
        write_stderr_line(stderr, summary_message(&report));
    }
    Ok(())
}

/// Lists the versions a run would publish.
fn run_dry(diff: &ReleaseDiffEngine<'_>, stderr: &mut dyn Write) -> Result<()> {
    let missing = diff.missing_versions()?;
    write_stderr_line(stderr, "Dry run - no files will be modified");
    if missing.is_empty() {
        write_stderr_line(stderr, "Mirror is up to date");
        return Ok(());
    }
    write_stderr_line(stderr, "");
    write_stderr_line(stderr, "Versions to mirror:");
    for version in missing {
        write_stderr_line(stderr, format!("  - {}", version.tag()));
    }
    Ok(())
}

/// Loads configuration and applies command-line overrides.
fn load_config(cli: &Cli, repo_dir: &Utf8Path) -> Result<SyncConfig> {
    let mut config = SyncConfig::load(repo_dir, cli.config.as_deref())?;
    if let Some(min_version) = cli.min_version {
        config.min_version = Some(min_version);
    }
    Ok(config)
}

/// Returns the repository directory from the CLI or the current directory.
fn resolve_repo_dir(cli_repo_dir: Option<Utf8PathBuf>) -> Result<Utf8PathBuf> {
    if let Some(dir) = cli_repo_dir {
        return Ok(dir);
    }
    let cwd = std::env::current_dir()?;
    Utf8PathBuf::try_from(cwd).map_err(|e| SyncError::Io(e.into_io_error()))
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, err);
            1
        }
    }
}
