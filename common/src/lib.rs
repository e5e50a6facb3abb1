//! Shared data model for the CircleCI CLI mirror.
//!
//! Both the release synchroniser and the end-user installer agree on the
//! types defined here: release versions, the supported platform matrix,
//! archive naming, checksum entries, and the persisted manifest document.
//!
//! # Modules
//!
//! - [`error`] - Validation errors for model values
//! - [`manifest`] - Checksum entries and the persisted [`ManifestState`]
//! - [`naming`] - Archive and checksum-manifest file naming
//! - [`platform`] - Operating systems, architectures, and archive formats
//! - [`sha256_digest`] - Validated SHA-256 hex digests
//! - [`version`] - Release version parsing and ordering

pub mod error;
pub mod manifest;
pub mod naming;
pub mod platform;
pub mod sha256_digest;
pub mod version;

pub use error::{ModelError, Result};
pub use manifest::{ChecksumEntry, ChecksumMap, ManifestState};
pub use naming::{ArchiveNaming, DEFAULT_PRODUCT};
pub use platform::{Arch, ArchiveFormat, ArchiveKey, Os};
pub use sha256_digest::Sha256Digest;
pub use version::Version;
