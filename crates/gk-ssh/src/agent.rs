//! SSH agent collaborator over `ssh-add`.

use std::path::Path;

use async_trait::async_trait;

use crate::error::SshError;
use crate::process;

#[async_trait]
pub trait SshAgent: Send + Sync {
    /// Fingerprints of the identities currently loaded.
    ///
    /// # Errors
    ///
    /// [`SshError::AgentUnavailable`] when no agent is reachable.
    async fn loaded_fingerprints(&self) -> Result<Vec<String>, SshError>;

    /// # Errors
    ///
    /// Fails when the agent rejects the key.
    async fn add(&self, path: &Path) -> Result<(), SshError>;

    /// # Errors
    ///
    /// Fails when the key is not loaded or no agent is reachable.
    async fn remove(&self, path: &Path) -> Result<(), SshError>;
}

/// [`SshAgent`] over the system `ssh-add`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SshAdd {
    /// Pass `--apple-use-keychain` so macOS keeps the key across reboots.
    pub apple_keychain: bool,
}

impl SshAdd {
    #[must_use]
    pub fn for_current_os() -> Self {
        Self {
            apple_keychain: cfg!(target_os = "macos"),
        }
    }
}

#[async_trait]
impl SshAgent for SshAdd {
    async fn loaded_fingerprints(&self) -> Result<Vec<String>, SshError> {
        if std::env::var_os("SSH_AUTH_SOCK").is_none() {
            return Err(SshError::AgentUnavailable);
        }
        let output = process::run("ssh-add", &["-l"], None).await?;
        match output.status.code() {
            Some(0) => Ok(parse_listing(&String::from_utf8_lossy(&output.stdout))),
            // 1: agent reachable but holds no identities
            Some(1) => Ok(Vec::new()),
            _ => Err(SshError::AgentUnavailable),
        }
    }

    async fn add(&self, path: &Path) -> Result<(), SshError> {
        let path_str = path.to_string_lossy();
        let mut args = Vec::with_capacity(2);
        if self.apple_keychain {
            args.push("--apple-use-keychain");
        }
        args.push(path_str.as_ref());
        process::run_checked("ssh-add", &args).await?;
        tracing::info!(path = %path.display(), "added key to agent");
        Ok(())
    }

    async fn remove(&self, path: &Path) -> Result<(), SshError> {
        let path_str = path.to_string_lossy();
        process::run_checked("ssh-add", &["-d", path_str.as_ref()]).await?;
        tracing::info!(path = %path.display(), "removed key from agent");
        Ok(())
    }
}

/// Second field of each `ssh-add -l` line.
fn parse_listing(listing: &str) -> Vec<String> {
    listing
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_yields_fingerprints() {
        let listing = "256 SHA256:RXm/ruZ0eTzRXKwi1AQEDynB0VgHQ2ac9KPSFdf/YnA git-keys:github:octo:laptop (ED25519)\n\
                       4096 SHA256:ZkAslGjFiUHdGf/WUL8rQvkib4PTvQatUV0OUQSncCA dev@box (RSA)\n";
        assert_eq!(
            parse_listing(listing),
            vec![
                "SHA256:RXm/ruZ0eTzRXKwi1AQEDynB0VgHQ2ac9KPSFdf/YnA".to_string(),
                "SHA256:ZkAslGjFiUHdGf/WUL8rQvkib4PTvQatUV0OUQSncCA".to_string(),
            ]
        );
    }

    #[test]
    fn empty_listing_is_empty() {
        assert!(parse_listing("").is_empty());
    }
}
