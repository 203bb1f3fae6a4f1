//! Key-material collaborator.
//!
//! Generation is delegated to `ssh-keygen`; inspection parses the `.pub`
//! file with `ssh-key`. Both files of a pair are always handled together.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use gk_core::KeyType;

use crate::error::SshError;
use crate::fingerprint::inspect_public_key;
use crate::process;

/// `id_x` -> `id_x.pub`
#[must_use]
pub fn public_key_path(private: &Path) -> PathBuf {
    let mut name = private.as_os_str().to_os_string();
    name.push(".pub");
    PathBuf::from(name)
}

#[async_trait]
pub trait KeyMaterial: Send + Sync {
    /// Write a new owner-only private key and its public key at `path`.
    ///
    /// # Errors
    ///
    /// [`SshError::KeyExists`] if either file exists; otherwise the
    /// generator's failure.
    async fn generate(&self, key_type: KeyType, comment: &str, path: &Path) -> Result<(), SshError>;

    /// `SHA256:` fingerprint of the pair at `path`.
    ///
    /// # Errors
    ///
    /// Fails when the public key is missing or unparseable.
    async fn fingerprint(&self, path: &Path) -> Result<String, SshError>;

    /// Public key line of the pair at `path`.
    ///
    /// # Errors
    ///
    /// Fails when the public key is missing or unreadable.
    async fn public_key(&self, path: &Path) -> Result<String, SshError>;

    /// Modulus size for algorithms without a fixed length.
    ///
    /// # Errors
    ///
    /// Fails when the key cannot be measured.
    async fn bits(&self, path: &Path) -> Result<u32, SshError>;

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    /// Remove both files; missing files are not an error.
    ///
    /// # Errors
    ///
    /// Fails when an existing file cannot be removed.
    fn delete(&self, path: &Path) -> Result<(), SshError> {
        for file in [path.to_path_buf(), public_key_path(path)] {
            match fs::remove_file(&file) {
                Ok(()) => tracing::debug!(path = %file.display(), "deleted key file"),
                Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
                Err(error) => return Err(SshError::io(file, error)),
            }
        }
        Ok(())
    }
}

/// [`KeyMaterial`] over the system `ssh-keygen`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SshKeygen;

#[async_trait]
impl KeyMaterial for SshKeygen {
    async fn generate(&self, key_type: KeyType, comment: &str, path: &Path) -> Result<(), SshError> {
        if path.exists() || public_key_path(path).exists() {
            return Err(SshError::KeyExists(path.to_path_buf()));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| SshError::io(parent, e))?;
        }

        let path_str = path.to_string_lossy();
        let bits = key_type.bits().to_string();
        let mut args = vec!["-q", "-t", key_type.as_str()];
        if key_type == KeyType::Rsa {
            args.extend(["-b", bits.as_str()]);
        }
        args.extend(["-f", path_str.as_ref(), "-N", "", "-C", comment]);
        process::run_checked("ssh-keygen", &args).await?;

        set_mode(path, 0o600)?;
        set_mode(&public_key_path(path), 0o644)?;
        tracing::info!(path = %path.display(), %key_type, "generated key pair");
        Ok(())
    }

    async fn fingerprint(&self, path: &Path) -> Result<String, SshError> {
        let line = self.public_key(path).await?;
        Ok(inspect_public_key(&line)?.fingerprint)
    }

    async fn public_key(&self, path: &Path) -> Result<String, SshError> {
        let pub_path = public_key_path(path);
        let text = tokio::fs::read_to_string(&pub_path)
            .await
            .map_err(|e| SshError::io(&pub_path, e))?;
        Ok(text.trim().to_string())
    }

    async fn bits(&self, path: &Path) -> Result<u32, SshError> {
        let pub_path = public_key_path(path);
        let pub_str = pub_path.to_string_lossy();
        let output = process::run_checked("ssh-keygen", &["-l", "-f", pub_str.as_ref()]).await?;
        parse_bits(&String::from_utf8_lossy(&output.stdout))
    }
}

/// First field of `ssh-keygen -l` output.
fn parse_bits(listing: &str) -> Result<u32, SshError> {
    listing
        .split_whitespace()
        .next()
        .and_then(|field| field.parse().ok())
        .ok_or_else(|| SshError::Parse(format!("unexpected ssh-keygen -l output: {listing}")))
}

#[cfg(unix)]
pub(crate) fn set_mode(path: &Path, mode: u32) -> Result<(), SshError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(|e| SshError::io(path, e))
}

#[cfg(not(unix))]
pub(crate) fn set_mode(_path: &Path, _mode: u32) -> Result<(), SshError> {
    Ok(())
}
