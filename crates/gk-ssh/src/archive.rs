//! Moving key pairs: archiving retired keys and promoting rotated ones.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use gk_core::naming::archive_file_name;

use crate::error::SshError;
use crate::keys::{public_key_path, set_mode};

/// Move a pair into `archive_dir` as `{file}.old-YYYY-MM-DD` and
/// `{file}.old-YYYY-MM-DD.pub`.
///
/// Returns the archived private key path. A missing public key is skipped.
///
/// # Errors
///
/// Fails when the private key is missing or a move fails.
pub fn archive_key_pair(
    private: &Path,
    archive_dir: &Path,
    date: NaiveDate,
) -> Result<PathBuf, SshError> {
    let file_name = private
        .file_name()
        .ok_or_else(|| SshError::Parse(format!("not a key file: {}", private.display())))?
        .to_string_lossy()
        .into_owned();

    if !archive_dir.exists() {
        fs::create_dir_all(archive_dir).map_err(|e| SshError::io(archive_dir, e))?;
        set_mode(archive_dir, 0o700)?;
    }

    let target = archive_dir.join(archive_file_name(&file_name, date));
    fs::rename(private, &target).map_err(|e| SshError::io(private, e))?;

    let public = public_key_path(private);
    if public.exists() {
        let public_target = public_key_path(&target);
        fs::rename(&public, &public_target).map_err(|e| SshError::io(&public, e))?;
    }
    tracing::info!(from = %private.display(), to = %target.display(), "archived key pair");
    Ok(target)
}

/// Rename a pair from `from` to `to` (both private paths).
///
/// # Errors
///
/// [`SshError::KeyExists`] when `to` is taken; otherwise the failed rename.
pub fn move_key_pair(from: &Path, to: &Path) -> Result<(), SshError> {
    if to.exists() {
        return Err(SshError::KeyExists(to.to_path_buf()));
    }
    fs::rename(from, to).map_err(|e| SshError::io(from, e))?;
    let from_pub = public_key_path(from);
    if from_pub.exists() {
        let to_pub = public_key_path(to);
        fs::rename(&from_pub, &to_pub).map_err(|e| SshError::io(&from_pub, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pair(dir: &Path, name: &str) -> PathBuf {
        let private = dir.join(name);
        fs::write(&private, "PRIVATE").expect("write private");
        fs::write(public_key_path(&private), "ssh-ed25519 AAAA c").expect("write public");
        private
    }

    #[test]
    fn archive_uses_dated_suffix() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let private = pair(tmp.path(), "git-keys-github-octo-ed25519");
        let archive = tmp.path().join("archive");
        let date = NaiveDate::from_ymd_opt(2026, 3, 9).expect("date");

        let archived = archive_key_pair(&private, &archive, date).expect("archive");
        assert_eq!(
            archived,
            archive.join("git-keys-github-octo-ed25519.old-2026-03-09")
        );
        assert!(archive.join("git-keys-github-octo-ed25519.old-2026-03-09.pub").exists());
        assert!(!private.exists());
    }

    #[test]
    fn move_promotes_both_files() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let from = pair(tmp.path(), "k-new");
        let to = tmp.path().join("k");
        move_key_pair(&from, &to).expect("move");
        assert!(to.exists());
        assert!(public_key_path(&to).exists());
        assert!(!from.exists());
    }

    #[test]
    fn move_refuses_to_clobber() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let from = pair(tmp.path(), "k-new");
        let to = pair(tmp.path(), "k");
        assert!(matches!(move_key_pair(&from, &to), Err(SshError::KeyExists(_))));
    }
}
