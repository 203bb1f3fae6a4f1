//! Teardown before a rebuild.
//!
//! Every step is best-effort and reported on its own; a failure in one
//! never stops the next. The backup snapshot is the caller's job and must
//! happen first.

use std::path::PathBuf;

use gk_config::DeclaredConfigStore;
use gk_core::{DeclaredConfig, KeyStatus, PlatformKind, StepOutcome};
use gk_platform::PlatformError;
use gk_ssh::public_key_path;
use serde::Serialize;

use crate::select::PairLabel;
use crate::toolkit::Toolkit;

/// Token accounts always cleared, besides every declared account.
pub const WELL_KNOWN_ACCOUNTS: [&str; 3] = [gk_auth::DEFAULT_ACCOUNT, "personal", "work"];

#[derive(Debug, Clone, Copy, Default)]
pub struct CleanupOptions {
    /// Leave registered keys on the platforms.
    pub keep_remote: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Labeled<T> {
    pub subject: T,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenSlot {
    pub platform: PlatformKind,
    pub account: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub remote: Vec<Labeled<PairLabel>>,
    pub routing_blocks_removed: usize,
    pub routing: Option<StepOutcome>,
    pub key_files: Vec<Labeled<PathBuf>>,
    pub config: Option<StepOutcome>,
    pub tokens: Vec<Labeled<TokenSlot>>,
}

impl CleanupReport {
    #[must_use]
    pub fn failures(&self) -> usize {
        let singles = [&self.routing, &self.config]
            .into_iter()
            .flatten()
            .filter(|o| o.is_failed())
            .count();
        singles
            + self.remote.iter().filter(|l| l.outcome.is_failed()).count()
            + self.key_files.iter().filter(|l| l.outcome.is_failed()).count()
            + self.tokens.iter().filter(|l| l.outcome.is_failed()).count()
    }
}

/// Tear down everything git-keys created for `declared`.
pub async fn cleanup(
    toolkit: &Toolkit<'_>,
    declared: Option<&DeclaredConfig>,
    store: &DeclaredConfigStore,
    options: CleanupOptions,
) -> CleanupReport {
    let mut report = CleanupReport::default();

    if let Some(config) = declared {
        if options.keep_remote {
            tracing::info!("keeping remote keys");
        } else {
            report.remote = revoke_remote(toolkit, config).await;
        }
    }

    report.routing = Some(match toolkit.routing().remove_all_managed_blocks() {
        Ok(removed) => {
            report.routing_blocks_removed = removed;
            StepOutcome::Done
        }
        Err(error) => {
            tracing::warn!(%error, "could not remove managed routing blocks");
            StepOutcome::failed(error)
        }
    });

    if let Some(config) = declared {
        report.key_files = delete_key_files(toolkit, config);
    }

    report.config = Some(if store.exists() {
        match store.remove() {
            Ok(()) => StepOutcome::Done,
            Err(error) => {
                tracing::warn!(%error, "could not remove declared config");
                StepOutcome::failed(error)
            }
        }
    } else {
        StepOutcome::skipped("no declared config")
    });

    report.tokens = clear_tokens(toolkit, declared);
    report
}

async fn revoke_remote(toolkit: &Toolkit<'_>, config: &DeclaredConfig) -> Vec<Labeled<PairLabel>> {
    let mut outcomes = Vec::new();
    for (persona, platform, key) in config.keys() {
        if key.status == KeyStatus::Revoked {
            continue;
        }
        let Some(id) = key.remote_id.as_deref() else {
            continue;
        };
        let outcome = match toolkit.connect(platform) {
            Err(error) => StepOutcome::failed(error),
            Ok(api) => match api.delete_key(id).await {
                Ok(()) | Err(PlatformError::NotFound(_)) => StepOutcome::Done,
                Err(error) => StepOutcome::failed(error),
            },
        };
        if let StepOutcome::Failed { reason } = &outcome {
            tracing::warn!(persona = %persona.name, platform = %platform.kind, remote_id = id, %reason, "remote key not revoked");
        }
        outcomes.push(Labeled {
            subject: PairLabel::of(persona, platform),
            outcome,
        });
    }
    outcomes
}

fn delete_key_files(toolkit: &Toolkit<'_>, config: &DeclaredConfig) -> Vec<Labeled<PathBuf>> {
    let mut outcomes = Vec::new();
    for (_, _, key) in config.keys() {
        if key.local_path.trim().is_empty() {
            continue;
        }
        let private = toolkit.session.resolve_key_path(&key.local_path);
        for path in [private.clone(), public_key_path(&private)] {
            if outcomes.iter().any(|o: &Labeled<PathBuf>| o.subject == path) {
                continue;
            }
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
            outcomes.push(Labeled {
                subject: path,
                outcome,
            });
        }
    }
    outcomes
}

fn clear_tokens(toolkit: &Toolkit<'_>, declared: Option<&DeclaredConfig>) -> Vec<Labeled<TokenSlot>> {
    let mut accounts: Vec<String> = WELL_KNOWN_ACCOUNTS.iter().map(ToString::to_string).collect();
    if let Some(config) = declared {
        for platform in config.personas.iter().flat_map(|p| &p.platforms) {
            if !accounts.contains(&platform.account) {
                accounts.push(platform.account.clone());
            }
        }
    }

    let mut outcomes = Vec::new();
    for kind in PlatformKind::ALL {
        for account in &accounts {
            let outcome = match toolkit.tokens.delete(kind, account) {
                Ok(true) => StepOutcome::Done,
                Ok(false) => continue,
                Err(error) => {
                    tracing::warn!(%kind, %account, %error, "could not clear token");
                    StepOutcome::failed(error)
                }
            };
            outcomes.push(Labeled {
                subject: TokenSlot {
                    platform: kind,
                    account: account.clone(),
                },
                outcome,
            });
        }
    }
    outcomes
}
