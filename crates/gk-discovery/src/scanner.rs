//! Discovery scanner.
//!
//! Each sub-scan is independent and best-effort: a failure empties only its
//! own portion of the [`ScanResult`], is logged, and is recorded as a
//! [`StepOutcome`] so callers and tests can tell Skipped from Failed.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use gk_auth::{TokenStore, resolve_token};
use gk_core::scan::{DiscoveredKey, ScanResult, ScanStep};
use gk_core::{DeclaredConfig, PlatformKind, Session, StepOutcome};
use gk_platform::PlatformConnector;
use gk_ssh::{KeyMaterial, RoutingFile, SshAgent, SshError, fingerprint_of, public_key_path};

use crate::correlate;

/// File names in the key directory that are never key pairs.
const NON_KEY_FILES: [&str; 4] = ["known_hosts", "known_hosts.old", "config", "authorized_keys"];

/// Bit length reported for the ed25519 family without asking the collaborator.
const ED25519_BITS: u32 = 256;

#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    /// Query platform APIs for registered keys.
    pub check_remote: bool,
}

/// Runs every sub-scan against the session's paths and collaborators.
pub struct Scanner<'a> {
    pub session: &'a Session,
    pub keys: &'a dyn KeyMaterial,
    pub agent: &'a dyn SshAgent,
    pub tokens: &'a dyn TokenStore,
    pub connector: &'a dyn PlatformConnector,
}

impl Scanner<'_> {
    /// Produce a correlated snapshot. Never fails.
    ///
    /// `declared` supplies the accounts to query when checking remotes.
    pub async fn scan(&self, declared: Option<&DeclaredConfig>, options: ScanOptions) -> ScanResult {
        let mut result = ScanResult::empty(self.session.now);

        let keys_outcome = match self.scan_keys().await {
            Ok(Some(keys)) => {
                result.keys = keys;
                StepOutcome::Done
            }
            Ok(None) => StepOutcome::skipped("no key directory"),
            Err(error) => {
                tracing::warn!(%error, dir = %self.session.ssh_dir.display(), "key scan failed");
                StepOutcome::failed(error)
            }
        };
        result.record(ScanStep::Keys, keys_outcome);

        let routing_outcome = self.scan_routing(&mut result);
        result.record(ScanStep::Routing, routing_outcome);
        correlate::link_hosts(&mut result.keys, &result.hosts);

        let agent_outcome = self.scan_agent(&mut result).await;
        result.record(ScanStep::Agent, agent_outcome);

        let git_outcome = match gk_git::scan_git(&self.session.gitconfig, &self.session.home) {
            Ok(git) => {
                result.git = git;
                StepOutcome::Done
            }
            Err(error) => {
                tracing::warn!(%error, "git config scan failed");
                StepOutcome::failed(error)
            }
        };
        result.record(ScanStep::Git, git_outcome);

        if options.check_remote {
            let remote_outcome = self.scan_remote(&mut result, declared).await;
            result.record(ScanStep::Remote, remote_outcome);
        }

        tracing::info!(
            keys = result.keys.len(),
            hosts = result.hosts.len(),
            includes = result.git.includes.len(),
            "scan complete"
        );
        result
    }

    /// Key pairs in the key directory, newest first; `None` if the directory is absent.
    async fn scan_keys(&self) -> Result<Option<Vec<DiscoveredKey>>, SshError> {
        let dir = &self.session.ssh_dir;
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(error) => {
                return Err(SshError::Io {
                    path: dir.clone(),
                    source: error,
                });
            }
        };

        let mut candidates: Vec<(PathBuf, Option<DateTime<Utc>>)> = Vec::new();
        for entry in entries.filter_map(Result::ok) {
            if !entry.file_type().is_ok_and(|t| t.is_file()) {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if !is_key_candidate(&name) {
                continue;
            }
            let path = entry.path();
            if !public_key_path(&path).exists() {
                continue;
            }
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .ok()
                .map(DateTime::<Utc>::from);
            candidates.push((path, modified));
        }

        let mut keys = Vec::with_capacity(candidates.len());
        for (path, modified) in candidates {
            if let Some(key) = self.inspect(&path, modified).await {
                keys.push(key);
            }
        }
        keys.sort_by(|a, b| b.modified.cmp(&a.modified));
        Ok(Some(keys))
    }

    /// A discovered key, or `None` when the collaborator cannot read it.
    async fn inspect(&self, path: &Path, modified: Option<DateTime<Utc>>) -> Option<DiscoveredKey> {
        let fingerprint = match self.keys.fingerprint(path).await {
            Ok(fingerprint) => fingerprint,
            Err(error) => {
                tracing::debug!(path = %path.display(), %error, "not a key pair");
                return None;
            }
        };
        let public = match self.keys.public_key(path).await {
            Ok(public) => public,
            Err(error) => {
                tracing::debug!(path = %path.display(), %error, "unreadable public key");
                return None;
            }
        };

        let mut fields = public.split_whitespace();
        let key_type = fields.next().unwrap_or("unknown").to_string();
        let comment = fields.skip(1).collect::<Vec<_>>().join(" ");
        let bits = if key_type.contains("ed25519") {
            ED25519_BITS
        } else {
            self.keys.bits(path).await.unwrap_or_else(|error| {
                tracing::debug!(path = %path.display(), %error, "key size unknown");
                0
            })
        };

        Some(DiscoveredKey {
            public_key_path: public_key_path(path),
            path: path.to_path_buf(),
            key_type,
            bits,
            fingerprint,
            comment,
            modified,
            used_by: Vec::new(),
            in_agent: false,
            registered_on: Vec::new(),
        })
    }

    fn scan_routing(&self, result: &mut ScanResult) -> StepOutcome {
        let routing = RoutingFile::new(&self.session.ssh_config);
        if !routing.path().exists() {
            return StepOutcome::skipped("no routing file");
        }
        match routing.hosts(&self.session.home) {
            Ok(hosts) => {
                result.hosts = hosts;
                StepOutcome::Done
            }
            Err(error) => {
                tracing::warn!(%error, "routing file scan failed");
                StepOutcome::failed(error)
            }
        }
    }

    async fn scan_agent(&self, result: &mut ScanResult) -> StepOutcome {
        match self.agent.loaded_fingerprints().await {
            Ok(loaded) => {
                correlate::mark_agent(&mut result.keys, &loaded);
                StepOutcome::Done
            }
            Err(SshError::AgentUnavailable) => {
                tracing::debug!("no ssh agent; agent matches left empty");
                StepOutcome::skipped("no SSH agent running")
            }
            Err(error) => {
                tracing::warn!(%error, "agent query failed");
                StepOutcome::failed(error)
            }
        }
    }

    async fn scan_remote(&self, result: &mut ScanResult, declared: Option<&DeclaredConfig>) -> StepOutcome {
        let mut queried = 0_usize;
        let mut failures = Vec::new();

        for (kind, account, base_url) in remote_targets(declared) {
            let token = match resolve_token(self.tokens, kind, &account) {
                Ok(resolved) => resolved.token,
                Err(error) => {
                    tracing::debug!(%kind, %account, %error, "no token; remote check skipped");
                    continue;
                }
            };
            queried += 1;
            let listed = match self.connector.connect(kind, base_url.as_deref(), &token) {
                Ok(api) => api.list_keys().await,
                Err(error) => Err(error),
            };
            match listed {
                Ok(remote) => {
                    let fingerprints: Vec<String> = remote
                        .iter()
                        .filter_map(|key| fingerprint_of(&key.key).ok())
                        .collect();
                    let matched = correlate::mark_remote(&mut result.keys, kind, &fingerprints);
                    tracing::info!(%kind, %account, remote = remote.len(), matched, "checked remote keys");
                }
                Err(error) => {
                    tracing::warn!(%kind, %account, %error, "listing remote keys failed");
                    failures.push(format!("{kind}/{account}: {error}"));
                }
            }
        }

        if queried == 0 {
            StepOutcome::skipped("no platform tokens available")
        } else if failures.len() == queried {
            StepOutcome::failed(failures.join("; "))
        } else {
            StepOutcome::Done
        }
    }
}

/// Skip `.pub`, known non-key files, and dotfiles.
fn is_key_candidate(name: &str) -> bool {
    !name.ends_with(".pub") && !name.starts_with('.') && !NON_KEY_FILES.contains(&name)
}

/// Accounts to query: every declared platform, or each platform's
/// `default` account when nothing is declared.
fn remote_targets(declared: Option<&DeclaredConfig>) -> Vec<(PlatformKind, String, Option<String>)> {
    let mut targets: Vec<(PlatformKind, String, Option<String>)> = Vec::new();
    if let Some(config) = declared {
        for persona in &config.personas {
            for platform in &persona.platforms {
                let target = (platform.kind, platform.account.clone(), platform.base_url.clone());
                if !targets.contains(&target) {
                    targets.push(target);
                }
            }
        }
    }
    if targets.is_empty() {
        targets = PlatformKind::ALL
            .into_iter()
            .map(|kind| (kind, gk_auth::DEFAULT_ACCOUNT.to_string(), None))
            .collect();
    }
    targets
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("id_ed25519", true)]
    #[case("git-keys-github-octo-ed25519", true)]
    #[case("id_ed25519.pub", false)]
    #[case("known_hosts", false)]
    #[case("known_hosts.old", false)]
    #[case("config", false)]
    #[case("authorized_keys", false)]
    #[case(".DS_Store", false)]
    fn key_candidates(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_key_candidate(name), expected);
    }

    #[test]
    fn remote_targets_fall_back_to_default_accounts() {
        let targets = remote_targets(None);
        assert_eq!(targets.len(), 2);
        assert!(targets.iter().all(|(_, account, _)| account == "default"));
    }
}
