//! CircleCI CLI installer entrypoint.
//!
//! Installs the executable for the host platform recorded in the bundled
//! release manifest.

use camino::Utf8PathBuf;
use circleci_mirror_installer::cli::Cli;
use circleci_mirror_installer::dirs::{SystemBaseDirs, default_install_dir};
use circleci_mirror_installer::download::{DOWNLOAD_TIMEOUT, HttpDownloader};
use circleci_mirror_installer::error::{InstallerError, Result};
use circleci_mirror_installer::manifest::load_manifest;
use circleci_mirror_installer::output::{DryRunInfo, ShellSnippet, path_contains, success_message};
use circleci_mirror_installer::pipeline::install;
use circleci_mirror_installer::platform;
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
    let manifest = load_manifest(cli.manifest.as_deref())?;
    let key = match cli.platform {
        Some(key) => key,
        None => platform::host()?,
    };
    let install_dir = resolve_install_dir(cli.install_dir.clone())?;

    if cli.dry_run {
        let archive_url = manifest.archive_url(key);
        let info = DryRunInfo {
            version: manifest.version(),
            key,
            archive_url: archive_url.as_deref(),
            sha256: manifest.entry(key).map(|entry| entry.sha256.as_str()),
            install_dir: &install_dir,
        };
        write_stderr_line(stderr, info.display_text());
        return Ok(());
    }

    if !cli.quiet {
        write_stderr_line(
            stderr,
            format!("Installing CircleCI CLI {} for {key}...", manifest.version()),
        );
    }

    let downloader = HttpDownloader::new(DOWNLOAD_TIMEOUT);
    let installed = install(&downloader, &manifest, key, &install_dir)?;

    if !cli.quiet {
        write_stderr_line(stderr, success_message(installed.version, &installed.path));
        let path = std::env::var_os("PATH");
        if !path_contains(path.as_deref(), &install_dir) {
            write_stderr_line(stderr, "");
            write_stderr_line(stderr, ShellSnippet::new(&install_dir).display_text());
        }
    }
    Ok(())
}

/// Determines the install directory from the CLI or the platform default.
fn resolve_install_dir(cli_dir: Option<Utf8PathBuf>) -> Result<Utf8PathBuf> {
    if let Some(dir) = cli_dir {
        return Ok(dir);
    }
    SystemBaseDirs::new()
        .and_then(|dirs| default_install_dir(&dirs))
        .ok_or(InstallerError::NoInstallDir)
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

fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}
