//! Ephemeral, scan-scoped entities.
//!
//! Nothing here is persisted except inside an immutable backup snapshot.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::PlatformKind;
use crate::outcome::StepOutcome;

/// A key pair found in the key directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredKey {
    pub path: PathBuf,
    pub public_key_path: PathBuf,
    /// Algorithm as named in the public key (`ssh-ed25519`, `ssh-rsa`, ...).
    pub key_type: String,
    pub bits: u32,
    pub fingerprint: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
    /// Routing aliases whose identity file is this key.
    #[serde(default)]
    pub used_by: Vec<String>,
    #[serde(default)]
    pub in_agent: bool,
    /// Platforms where the public key is registered (only filled on remote scans).
    #[serde(default)]
    pub registered_on: Vec<PlatformKind>,
}

impl DiscoveredKey {
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// A routing-file host entry that names an identity file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshConfigHost {
    pub alias: String,
    pub hostname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    pub identity_file: PathBuf,
}

/// `user.name` / `user.email` pair from a git config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitIdentity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl GitIdentity {
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref().filter(|e| !e.is_empty())
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }
}

/// A platform inferred from repository remotes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredPlatform {
    pub kind: PlatformKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub repo_count: u32,
    /// First path segment of each remote (org / group), for display only.
    #[serde(default)]
    pub groups: Vec<String>,
}

/// An `[includeIf "gitdir:..."]` stanza of the global git config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitInclude {
    /// Directory pattern after `gitdir:`.
    pub condition: String,
    /// Included config file.
    pub path: PathBuf,
    #[serde(default)]
    pub identity: GitIdentity,
    #[serde(default)]
    pub platforms: Vec<DiscoveredPlatform>,
}

/// Git identity evidence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitScan {
    #[serde(default)]
    pub global: GitIdentity,
    #[serde(default)]
    pub includes: Vec<GitInclude>,
}

/// Named sub-scans, reported individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStep {
    Keys,
    Routing,
    Agent,
    Git,
    Remote,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStepReport {
    pub step: ScanStep,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

/// The full correlated snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    pub scanned_at: DateTime<Utc>,
    #[serde(default)]
    pub keys: Vec<DiscoveredKey>,
    #[serde(default)]
    pub hosts: Vec<SshConfigHost>,
    #[serde(default)]
    pub git: GitScan,
    #[serde(default)]
    pub steps: Vec<ScanStepReport>,
}

impl ScanResult {
    #[must_use]
    pub const fn empty(scanned_at: DateTime<Utc>) -> Self {
        Self {
            scanned_at,
            keys: Vec::new(),
            hosts: Vec::new(),
            git: GitScan {
                global: GitIdentity {
                    name: None,
                    email: None,
                },
                includes: Vec::new(),
            },
            steps: Vec::new(),
        }
    }

    /// Outcome recorded for `step`, if it ran.
    #[must_use]
    pub fn outcome(&self, step: ScanStep) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|report| report.step == step)
            .map(|report| &report.outcome)
    }

    pub fn record(&mut self, step: ScanStep, outcome: StepOutcome) {
        self.steps.push(ScanStepReport { step, outcome });
    }
}
