//! # gk-git
//!
//! Git-side evidence and configuration for git-keys:
//!
//! - [`identity`] parses `[user]` and `[includeIf "gitdir:..."]` stanzas
//! - [`repos`] walks include directories and classifies repository remotes (gix)
//! - [`includes`] maintains the managed conditional-include block and the
//!   per-persona identity files it points at
//!
//! [`scan_git`] combines the first two into the scan's git evidence.

pub mod error;
pub mod identity;
pub mod includes;
pub mod repos;

use std::fs;
use std::path::Path;

use gk_core::scan::{GitInclude, GitScan};

pub use error::GitError;
pub use includes::{GitConfigFile, IncludeEntry};
pub use repos::{classify_remote, discover_platforms};

/// Global identity, conditional includes with their identities, and the
/// platforms used by repositories under each include's directory.
///
/// A missing global config yields an empty scan.
///
/// # Errors
///
/// Fails when the global config exists but cannot be read.
pub fn scan_git(gitconfig: &Path, home: &Path) -> Result<GitScan, GitError> {
    let text = match fs::read_to_string(gitconfig) {
        Ok(text) => text,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %gitconfig.display(), "no global git config");
            return Ok(GitScan::default());
        }
        Err(error) => return Err(GitError::io(gitconfig, error)),
    };

    let global = identity::parse_identity(&text);
    let mut includes = Vec::new();
    for (condition, path) in identity::parse_includes(&text, home) {
        let identity = identity::read_identity(&path).unwrap_or_else(|error| {
            tracing::warn!(path = %path.display(), %error, "unreadable include file");
            gk_core::scan::GitIdentity::default()
        });
        let platforms = discover_platforms(&repos::condition_root(&condition, home));
        tracing::debug!(%condition, platforms = platforms.len(), "scanned conditional include");
        includes.push(GitInclude {
            condition,
            path,
            identity,
            platforms,
        });
    }
    Ok(GitScan { global, includes })
}
