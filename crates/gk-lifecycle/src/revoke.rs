//! Revocation saga.
//!
//! Targets never include keys that are already revoked. A failed remote
//! deletion leaves that key untouched and does not stop the others.

use std::path::PathBuf;

use gk_core::naming::same_fingerprint;
use gk_core::{DeclaredConfig, KeyStatus, StepOutcome};
use gk_platform::PlatformError;
use gk_ssh::public_key_path;
use serde::Serialize;

use crate::error::LifecycleError;
use crate::select::{PairLabel, Selection};
use crate::toolkit::Toolkit;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevokeTarget {
    Pairs(Selection),
    Fingerprint(String),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RevokeOptions {
    /// Also delete the private and public key files.
    pub delete_local: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRemoval {
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevokedKey {
    #[serde(flatten)]
    pub pair: PairLabel,
    pub fingerprint: String,
    pub remote: StepOutcome,
    /// Marked revoked in the declared model.
    pub revoked: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileRemoval>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RevocationReport {
    pub keys: Vec<RevokedKey>,
}

impl RevocationReport {
    #[must_use]
    pub fn revoked(&self) -> usize {
        self.keys.iter().filter(|k| k.revoked).count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.keys.len() - self.revoked()
    }

    /// The declared model must be saved.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.revoked() > 0
    }

    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.failed() > 0
    }
}

/// `(persona, platform, key)` indices of every non-revoked target.
///
/// # Errors
///
/// [`LifecycleError::FingerprintNotFound`] when no declared key carries the
/// fingerprint, or a selection error.
pub fn revocation_targets(
    config: &DeclaredConfig,
    target: &RevokeTarget,
) -> Result<Vec<(usize, usize, usize)>, LifecycleError> {
    let pairs = match target {
        RevokeTarget::Pairs(selection) => selection.resolve(config)?,
        RevokeTarget::Fingerprint(fingerprint) => {
            if !config.has_fingerprint(fingerprint) {
                return Err(LifecycleError::FingerprintNotFound(fingerprint.clone()));
            }
            crate::select::pairs(config).collect()
        }
    };

    let mut targets = Vec::new();
    for pair in pairs {
        let platform = &config.personas[pair.persona].platforms[pair.platform];
        for (ki, key) in platform.keys.iter().enumerate() {
            if key.status == KeyStatus::Revoked {
                continue;
            }
            if let RevokeTarget::Fingerprint(fingerprint) = target
                && !same_fingerprint(&key.fingerprint, fingerprint)
            {
                continue;
            }
            targets.push((pair.persona, pair.platform, ki));
        }
    }
    Ok(targets)
}

/// Revoke every target. `config` is updated in place; the caller persists
/// it when [`RevocationReport::changed`].
///
/// # Errors
///
/// Only target resolution errors, raised before anything is touched.
pub async fn revoke(
    toolkit: &Toolkit<'_>,
    config: &mut DeclaredConfig,
    target: &RevokeTarget,
    options: RevokeOptions,
) -> Result<RevocationReport, LifecycleError> {
    let targets = revocation_targets(config, target)?;
    let mut report = RevocationReport::default();

    for (pi, qi, ki) in targets {
        let persona = &config.personas[pi];
        let platform = &persona.platforms[qi];
        let key = &platform.keys[ki];
        let label = PairLabel::of(persona, platform);

        let remote = match key.remote_id.as_deref() {
            None => StepOutcome::skipped("not registered remotely"),
            Some(id) => match toolkit.connect(platform) {
                Err(error) => StepOutcome::failed(error),
                Ok(api) => match api.delete_key(id).await {
                    Ok(()) => StepOutcome::Done,
                    Err(PlatformError::NotFound(_)) => {
                        tracing::info!(pair = %label, remote_id = id, "remote key already gone");
                        StepOutcome::Done
                    }
                    Err(error) => StepOutcome::failed(error),
                },
            },
        };
        let revoked = !remote.is_failed();
        let fingerprint = key.fingerprint.clone();
        let local = (!key.local_path.trim().is_empty())
            .then(|| toolkit.session.resolve_key_path(&key.local_path));

        if !revoked {
            tracing::warn!(pair = %label, %fingerprint, %remote, "revocation failed; key left active");
            report.keys.push(RevokedKey {
                pair: label,
                fingerprint,
                remote,
                revoked,
                files: Vec::new(),
            });
            continue;
        }

        config.personas[pi].platforms[qi].keys[ki].status = KeyStatus::Revoked;
        tracing::info!(pair = %label, %fingerprint, "key revoked");

        let files = match local {
            Some(path) if options.delete_local => delete_files(&path),
            _ => Vec::new(),
        };
        report.keys.push(RevokedKey {
            pair: label,
            fingerprint,
            remote,
            revoked,
            files,
        });
    }
    Ok(report)
}

/// Delete each file of the pair, reporting every file separately.
fn delete_files(private: &std::path::Path) -> Vec<FileRemoval> {
    [private.to_path_buf(), public_key_path(private)]
        .into_iter()
        .map(|path| {
            let outcome = match std::fs::remove_file(&path) {
                Ok(()) => StepOutcome::Done,
                Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                    StepOutcome::skipped("not present")
                }
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "could not delete key file");
                    StepOutcome::failed(error)
                }
            };
            FileRemoval { path, outcome }
        })
        .collect()
}
