//! Release synchroniser for the CircleCI CLI mirror.
//!
//! A run compares upstream releases with the tags already present in the
//! mirror repository, then publishes each missing version oldest first:
//! its checksum manifest is resolved into a [`ManifestState`], the
//! repository's manifest files are regenerated from that state, and the
//! change is committed and tagged.
//!
//! # Modules
//!
//! - [`release_feed`] - Paginated upstream release and mirror tag listings
//! - [`release_diff`] - Which versions still need mirroring
//! - [`checksums`] - Checksum manifest download and parsing
//! - [`manifest_writer`] - Manifest document, templates and legacy patching
//! - [`tag_publisher`] - Commit, tag and push through git
//! - [`sync`] - Run orchestration
//! - [`config`] - `mirror.toml` loading
//! - [`lock`] - Single-writer run lock
//!
//! [`ManifestState`]: circleci_mirror_common::ManifestState

pub mod checksums;
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod lock;
pub mod manifest_writer;
pub mod output;
pub mod release_diff;
pub mod release_feed;
pub mod sync;
pub mod tag_publisher;

pub use config::{IncompletePolicy, SyncConfig};
pub use error::{Result, SyncError};
pub use sync::{SkippedVersion, SyncReport, Synchroniser};
