//! Output formatting for the installer CLI.
//!
//! This module renders the success message, the dry-run report and, when
//! the installation directory is not on `PATH`, the shell snippets that
//! put it there.

use camino::Utf8Path;
use circleci_mirror_common::{ArchiveKey, Version};
use std::ffi::OsStr;

/// Shell configuration snippets for different shells.
#[derive(Debug, Clone)]
pub struct ShellSnippet {
    /// Export line for bash/zsh.
    pub bash: String,
    /// Set line for fish shell.
    pub fish: String,
    /// Set line for PowerShell.
    pub powershell: String,
}

impl ShellSnippet {
    /// Create snippets prepending `install_dir` to `PATH`.
    ///
    /// # Example
    ///
    /// ```
    /// use camino::Utf8PathBuf;
    /// use circleci_mirror_installer::output::ShellSnippet;
    ///
    /// let snippet = ShellSnippet::new(&Utf8PathBuf::from("/home/user/.local/bin"));
    /// assert_eq!(snippet.bash, "export PATH=\"/home/user/.local/bin:$PATH\"");
    /// ```
    #[must_use]
    pub fn new(install_dir: &Utf8Path) -> Self {
        Self {
            bash: format!("export PATH=\"{install_dir}:$PATH\""),
            fish: format!("fish_add_path \"{install_dir}\""),
            powershell: format!("$env:Path = \"{install_dir};$env:Path\""),
        }
    }

    /// Format the snippet for display to the user.
    #[must_use]
    pub fn display_text(&self) -> String {
        format!(
            concat!(
                "Add the following to your shell configuration:\n\n",
                "  # bash/zsh (~/.bashrc, ~/.zshrc)\n",
                "  {}\n\n",
                "  # fish (~/.config/fish/config.fish)\n",
                "  {}\n\n",
                "  # PowerShell ($PROFILE)\n",
                "  {}"
            ),
            self.bash, self.fish, self.powershell
        )
    }
}

/// Return `true` if `dir` is one of the entries of the `PATH` value `path`.
#[must_use]
pub fn path_contains(path: Option<&OsStr>, dir: &Utf8Path) -> bool {
    path.is_some_and(|value| std::env::split_paths(value).any(|entry| entry == dir.as_std_path()))
}

/// Format a success message after installation.
#[must_use]
pub fn success_message(version: Version, path: &Utf8Path) -> String {
    format!("Installed circleci {version} to {path}")
}

/// What a run would install, for `--dry-run`.
///
/// # Example
///
/// ```
/// use camino::Utf8PathBuf;
/// use circleci_mirror_common::{Arch, ArchiveKey, Os, Version};
/// use circleci_mirror_installer::output::DryRunInfo;
///
/// let dir = Utf8PathBuf::from("/home/user/.local/bin");
/// let info = DryRunInfo {
///     version: Version::new(0, 1, 30888),
///     key: ArchiveKey::new(Os::Linux, Arch::Amd64),
///     archive_url: Some("https://example.test/v0.1.30888/a.tar.gz"),
///     sha256: None,
///     install_dir: &dir,
/// };
///
/// let output = info.display_text();
/// assert!(output.contains("Dry run"));
/// assert!(output.contains("linux_amd64"));
/// ```
#[derive(Debug)]
pub struct DryRunInfo<'a> {
    /// Version recorded in the manifest.
    pub version: Version,
    /// Platform being installed for.
    pub key: ArchiveKey,
    /// Archive download URL, if the manifest lists the platform.
    pub archive_url: Option<&'a str>,
    /// Expected archive digest, if the manifest lists the platform.
    pub sha256: Option<&'a str>,
    /// Directory that would receive the executable.
    pub install_dir: &'a Utf8Path,
}

impl DryRunInfo<'_> {
    /// Format the dry-run information for display.
    #[must_use]
    pub fn display_text(&self) -> String {
        let mut lines = vec![
            "Dry run - no files will be modified".to_owned(),
            String::new(),
            format!("Version: {}", self.version),
            format!("Platform: {}", self.key),
        ];
        match (self.archive_url, self.sha256) {
            (Some(url), Some(sha256)) => {
                lines.push(format!("Archive: {url}"));
                lines.push(format!("SHA-256: {sha256}"));
            }
            (Some(url), None) => lines.push(format!("Archive: {url}")),
            _ => lines.push("Archive: not listed in the manifest".to_owned()),
        }
        lines.push(format!(
            "Destination: {}",
            self.install_dir.join(self.key.executable_name())
        ));
        lines.join("\n")
    }
}
