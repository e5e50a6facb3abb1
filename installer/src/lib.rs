//! CircleCI CLI installer library.
//!
//! Installs the CircleCI CLI executable for the host platform from the
//! mirror's release manifest: the archive is downloaded, verified against
//! its recorded SHA-256 digest, unpacked in memory, and its executable
//! placed atomically in the installation directory.
//!
//! # Modules
//!
//! - [`cli`] - Command-line argument definitions
//! - [`dirs`] - Directory resolution abstraction for platform-specific paths
//! - [`download`] - Archive download
//! - [`error`] - Installer error type
//! - [`extraction`] - Executable extraction from `.tar.gz` and `.zip`
//! - [`install`] - Atomic executable placement
//! - [`manifest`] - Bundled release manifest
//! - [`output`] - Success, dry-run and PATH hint formatting
//! - [`pipeline`] - Install pipeline orchestration
//! - [`platform`] - Host platform resolution
//! - [`verification`] - SHA-256 integrity checks

pub mod cli;
pub mod dirs;
pub mod download;
pub mod error;
pub mod extraction;
pub mod install;
pub mod manifest;
pub mod output;
pub mod pipeline;
pub mod platform;
pub mod verification;

#[cfg(test)]
mod test_archives;
