//! Synchroniser configuration loaded from `mirror.toml`.
//!
//! Every field has a default matching the upstream CircleCI CLI project, so
//! a missing configuration file is equivalent to an empty one. Unknown keys
//! are rejected to catch typos early. Relative paths resolve against the
//! repository directory.

use camino::{Utf8Path, Utf8PathBuf};
use circleci_mirror_common::{DEFAULT_PRODUCT, Version};
use serde::Deserialize;
use std::time::Duration;

/// Default configuration file name, looked up in the repository directory.
pub const DEFAULT_CONFIG_FILE: &str = "mirror.toml";

/// Errors arising from loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration {path}: {source}")]
    Read {
        /// The configuration file path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid.
    #[error("invalid configuration {path}: {reason}")]
    Parse {
        /// The configuration file path.
        path: Utf8PathBuf,
        /// The parser's message.
        reason: String,
    },
}

/// What to do when a version's checksum manifest is incomplete.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum IncompletePolicy {
    /// Log the version as skipped and continue with the next one.
    #[default]
    Skip,
    /// End the run with an error.
    Stop,
}

/// A template rendered into a file in the repository.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TemplateTarget {
    /// The Tera template file.
    pub source: Utf8PathBuf,
    /// The file the rendered template replaces.
    pub destination: Utf8PathBuf,
}

/// A file whose constant assignments are patched in place.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PatchTarget {
    /// The file to patch.
    pub path: Utf8PathBuf,
    /// Name of the constant holding the version string.
    #[serde(default = "PatchTarget::default_version_anchor")]
    pub version_anchor: String,
    /// Name of the constant holding the archive mapping.
    #[serde(default = "PatchTarget::default_archives_anchor")]
    pub archives_anchor: String,
    /// Name of the constant holding the base download URL.
    #[serde(default = "PatchTarget::default_base_url_anchor")]
    pub base_url_anchor: String,
}

impl PatchTarget {
    /// Create a target for `path` with the default anchor names.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            version_anchor: Self::default_version_anchor(),
            archives_anchor: Self::default_archives_anchor(),
            base_url_anchor: Self::default_base_url_anchor(),
        }
    }

    fn default_version_anchor() -> String {
        "VERSION".to_owned()
    }

    fn default_archives_anchor() -> String {
        "ARCHIVE_SHA256".to_owned()
    }

    fn default_base_url_anchor() -> String {
        "RELEASES_BASE_URL".to_owned()
    }
}

/// Settings for one synchronisation run.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// The upstream repository, `owner/name`.
    pub upstream_repo: String,
    /// The mirror repository, `owner/name`.
    pub mirror_repo: String,
    /// Base URL under which release assets are published.
    pub releases_base_url: String,
    /// Base URL of the hosting service's REST API.
    pub api_base_url: String,
    /// Product prefix of archive file names.
    pub product: String,
    /// Oldest version worth mirroring.
    pub min_version: Option<Version>,
    /// Page size for release and tag listings.
    pub per_page: u32,
    /// Name of the environment variable holding an API token.
    pub token_env: String,
    /// Timeout for HTTP requests, in seconds.
    pub http_timeout_secs: u64,
    /// Timeout for each git command, in seconds.
    pub git_timeout_secs: u64,
    /// Behaviour when a checksum manifest is incomplete.
    pub on_incomplete_checksums: IncompletePolicy,
    /// The structured manifest document.
    pub manifest_path: Utf8PathBuf,
    /// Templates regenerated for each version.
    pub templates: Vec<TemplateTarget>,
    /// Files patched in place for each version.
    pub patch: Vec<PatchTarget>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            upstream_repo: "CircleCI-Public/circleci-cli".to_owned(),
            mirror_repo: "AleksaC/circleci-cli-py".to_owned(),
            releases_base_url: "https://github.com/CircleCI-Public/circleci-cli/releases/download"
                .to_owned(),
            api_base_url: "https://api.github.com".to_owned(),
            product: DEFAULT_PRODUCT.to_owned(),
            min_version: Some(Version::new(0, 1, 9321)),
            per_page: 100,
            token_env: "GH_TOKEN".to_owned(),
            http_timeout_secs: 30,
            git_timeout_secs: 300,
            on_incomplete_checksums: IncompletePolicy::Skip,
            manifest_path: Utf8PathBuf::from("manifest.json"),
            templates: Vec::new(),
            patch: Vec::new(),
        }
    }
}

impl SyncConfig {
    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for invalid TOML, unknown keys or
    /// invalid values. `origin` names the source in the message.
    ///
    /// # Examples
    ///
    /// ```
    /// use circleci_mirror::config::SyncConfig;
    ///
    /// let config = SyncConfig::from_toml_str("per_page = 50\n", "inline".into())
    ///     .expect("valid configuration");
    /// assert_eq!(config.per_page, 50);
    /// assert_eq!(config.upstream_repo, "CircleCI-Public/circleci-cli");
    /// ```
    pub fn from_toml_str(source: &str, origin: Utf8PathBuf) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|e| ConfigError::Parse {
            path: origin,
            reason: e.to_string(),
        })
    }

    /// Load configuration for `repo_dir`.
    ///
    /// An explicit `path` must exist and is used as given. Without one,
    /// `mirror.toml` in `repo_dir` is used when present and defaults
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(repo_dir: &Utf8Path, path: Option<&Utf8Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(explicit) => (explicit.to_owned(), true),
            None => (repo_dir.join(DEFAULT_CONFIG_FILE), false),
        };
        match std::fs::read_to_string(&path) {
            Ok(source) => Self::from_toml_str(&source, path),
            Err(err) if !required && err.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read { path, source }),
        }
    }

    /// Return the HTTP request timeout.
    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Return the git command timeout.
    #[must_use]
    pub const fn git_timeout(&self) -> Duration {
        Duration::from_secs(self.git_timeout_secs)
    }

    /// Read the API token from the configured environment variable.
    ///
    /// Unset and blank values yield `None`.
    #[must_use]
    pub fn read_token(&self) -> Option<String> {
        std::env::var(&self.token_env)
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
    }
}
