//! Explicit session value threaded through scan, recommendation, and sagas.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};

/// File-system locations and the clock for one command invocation.
///
/// Built once by the binary from configuration; tests build it over a
/// temporary directory with a pinned `now`.
#[derive(Debug, Clone)]
pub struct Session {
    /// Home directory used to expand `~/`.
    pub home: PathBuf,
    /// Directory holding key pairs (`~/.ssh`).
    pub ssh_dir: PathBuf,
    /// SSH routing file (`~/.ssh/config`).
    pub ssh_config: PathBuf,
    /// Global git config (`~/.gitconfig`).
    pub gitconfig: PathBuf,
    /// Where rotated keys are archived (`~/.ssh/archive`).
    pub archive_dir: PathBuf,
    /// Machine display name embedded in key comments and titles.
    pub machine_name: String,
    pub now: DateTime<Utc>,
}

impl Session {
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    /// Resolve a declared `local_path`: absolute, `~/`-prefixed, or relative
    /// to the key directory.
    #[must_use]
    pub fn resolve_key_path(&self, local_path: &str) -> PathBuf {
        if let Some(rest) = local_path.strip_prefix("~/") {
            return self.home.join(rest);
        }
        let path = PathBuf::from(local_path);
        if path.is_absolute() {
            path
        } else {
            self.ssh_dir.join(path)
        }
    }
}
