//! File-system locations.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

fn default_config_file() -> String {
    "~/.git-keys.toml".into()
}

fn default_ssh_dir() -> String {
    "~/.ssh".into()
}

fn default_ssh_config() -> String {
    "~/.ssh/config".into()
}

fn default_gitconfig() -> String {
    "~/.gitconfig".into()
}

fn default_backup_dir() -> String {
    "~/.git-keys/backups".into()
}

fn default_archive_subdir() -> String {
    "archive".into()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    /// Declared config document.
    #[serde(default = "default_config_file")]
    pub config_file: String,

    /// Key directory.
    #[serde(default = "default_ssh_dir")]
    pub ssh_dir: String,

    /// SSH routing file.
    #[serde(default = "default_ssh_config")]
    pub ssh_config: String,

    /// Global git config scanned for identities and conditional includes.
    #[serde(default = "default_gitconfig")]
    pub gitconfig: String,

    /// Backup snapshot directory.
    #[serde(default = "default_backup_dir")]
    pub backup_dir: String,

    /// Archive directory name, relative to `ssh_dir`.
    #[serde(default = "default_archive_subdir")]
    pub archive_subdir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            config_file: default_config_file(),
            ssh_dir: default_ssh_dir(),
            ssh_config: default_ssh_config(),
            gitconfig: default_gitconfig(),
            backup_dir: default_backup_dir(),
            archive_subdir: default_archive_subdir(),
        }
    }
}

/// Concrete paths after `~` expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub home: PathBuf,
    pub config_file: PathBuf,
    pub ssh_dir: PathBuf,
    pub ssh_config: PathBuf,
    pub gitconfig: PathBuf,
    pub backup_dir: PathBuf,
    pub archive_dir: PathBuf,
}

impl PathsConfig {
    /// Expand every path against `home`.
    #[must_use]
    pub fn resolve_with_home(&self, home: &Path) -> ResolvedPaths {
        let ssh_dir = expand_tilde(&self.ssh_dir, home);
        ResolvedPaths {
            home: home.to_path_buf(),
            config_file: expand_tilde(&self.config_file, home),
            archive_dir: ssh_dir.join(&self.archive_subdir),
            ssh_dir,
            ssh_config: expand_tilde(&self.ssh_config, home),
            gitconfig: expand_tilde(&self.gitconfig, home),
            backup_dir: expand_tilde(&self.backup_dir, home),
        }
    }

    /// Expand every path against the current user's home directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HomeNotFound`] when no home directory is known.
    pub fn resolve(&self) -> Result<ResolvedPaths, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(self.resolve_with_home(&home))
    }
}

/// Expand a leading `~` or `~/` against `home`.
#[must_use]
pub fn expand_tilde(path: &str, home: &Path) -> PathBuf {
    if path == "~" {
        home.to_path_buf()
    } else if let Some(rest) = path.strip_prefix("~/") {
        home.join(rest)
    } else {
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resolve_under_home() {
        let paths = PathsConfig::default().resolve_with_home(Path::new("/home/dev"));
        assert_eq!(paths.config_file, PathBuf::from("/home/dev/.git-keys.toml"));
        assert_eq!(paths.ssh_config, PathBuf::from("/home/dev/.ssh/config"));
        assert_eq!(paths.archive_dir, PathBuf::from("/home/dev/.ssh/archive"));
        assert_eq!(paths.backup_dir, PathBuf::from("/home/dev/.git-keys/backups"));
    }

    #[test]
    fn tilde_expansion_leaves_other_paths_alone() {
        let home = Path::new("/home/dev");
        assert_eq!(expand_tilde("~", home), PathBuf::from("/home/dev"));
        assert_eq!(expand_tilde("/etc/ssh", home), PathBuf::from("/etc/ssh"));
        assert_eq!(expand_tilde("~other/x", home), PathBuf::from("~other/x"));
    }
}
