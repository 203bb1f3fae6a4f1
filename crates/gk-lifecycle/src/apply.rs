//! Provisioning: bring the machine in line with the declared model.
//!
//! For each pair without an active key a key is generated (or an existing
//! file at the managed name is adopted), routing is written for every pair,
//! and active keys without a remote id are uploaded. Uploads are
//! best-effort: a missing token only leaves the key unregistered.

use std::path::PathBuf;

use gk_core::naming::{key_comment, key_file_name, routing_block_id, upload_title};
use gk_core::{DeclaredConfig, KeyConfig, StepOutcome};
use serde::Serialize;

use crate::select::{PairLabel, pairs};
use crate::toolkit::{Toolkit, routing_entry};

/// Suffix of the routing-file copy taken before the first write.
pub const ROUTING_BACKUP_SUFFIX: &str = "git-keys.bak";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlannedAction {
    GenerateKey { path: PathBuf },
    AdoptKey { path: PathBuf },
    WriteRouting { block: String, identity_file: PathBuf },
    UploadKey { fingerprint: Option<String> },
    /// The active key's file is gone; `validate` reports it too.
    MissingKeyFile { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairPlan {
    #[serde(flatten)]
    pub pair: PairLabel,
    pub actions: Vec<PlannedAction>,
}

/// What `apply` would do, without touching anything.
#[must_use]
pub fn plan(toolkit: &Toolkit<'_>, config: &DeclaredConfig) -> Vec<PairPlan> {
    let session = toolkit.session;
    pairs(config)
        .map(|pair| {
            let persona = &config.personas[pair.persona];
            let platform = &persona.platforms[pair.platform];
            let block = routing_block_id(&persona.name, platform.kind, &platform.account);
            let mut actions = Vec::new();

            match platform.active_key() {
                None => {
                    let path = session.ssh_dir.join(key_file_name(
                        platform.kind,
                        &platform.account,
                        config.defaults.key_type,
                    ));
                    if toolkit.keys.exists(&path) {
                        actions.push(PlannedAction::AdoptKey { path: path.clone() });
                    } else {
                        actions.push(PlannedAction::GenerateKey { path: path.clone() });
                    }
                    actions.push(PlannedAction::WriteRouting {
                        block,
                        identity_file: path,
                    });
                    actions.push(PlannedAction::UploadKey { fingerprint: None });
                }
                Some(key) => {
                    let path = session.resolve_key_path(&key.local_path);
                    if !toolkit.keys.exists(&path) {
                        actions.push(PlannedAction::MissingKeyFile { path: path.clone() });
                    }
                    actions.push(PlannedAction::WriteRouting {
                        block,
                        identity_file: path,
                    });
                    if key.remote_id.is_none() {
                        actions.push(PlannedAction::UploadKey {
                            fingerprint: Some(key.fingerprint.clone()),
                        });
                    }
                }
            }
            PairPlan {
                pair: PairLabel::of(persona, platform),
                actions,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairApply {
    #[serde(flatten)]
    pub pair: PairLabel,
    pub key: StepOutcome,
    pub routing: StepOutcome,
    pub upload: StepOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_backup: Option<PathBuf>,
    pub pairs: Vec<PairApply>,
    /// Keys added or remote ids recorded.
    pub changed: bool,
}

impl ApplyReport {
    /// A pair whose key could not be provisioned or routed.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.pairs
            .iter()
            .any(|p| p.key.is_failed() || p.routing.is_failed())
    }
}

/// Provision every pair. `config` is updated in place; the caller persists
/// it when [`ApplyReport::changed`].
pub async fn apply(toolkit: &Toolkit<'_>, config: &mut DeclaredConfig) -> ApplyReport {
    let session = toolkit.session;
    let routing = toolkit.routing();
    let mut report = ApplyReport {
        routing_backup: routing.backup(ROUTING_BACKUP_SUFFIX).unwrap_or_else(|error| {
            tracing::warn!(%error, "could not back up routing file");
            None
        }),
        ..ApplyReport::default()
    };
    let key_type = config.defaults.key_type;
    let months = match config.defaults.key_expiration_months {
        0 => crate::rotate::FALLBACK_EXPIRATION_MONTHS,
        months => months,
    };

    for pair in pairs(config).collect::<Vec<_>>() {
        let persona = config.personas[pair.persona].clone();
        let platform = &mut config.personas[pair.persona].platforms[pair.platform];
        let label = PairLabel::of(&persona, platform);
        tracing::info!(pair = %label, "applying");

        // key
        let (index, key_outcome) = match platform.active_key_index() {
            Some(index) => {
                if platform.active_count() > 1 {
                    tracing::warn!(pair = %label, active = platform.active_count(), "several active keys; using the first");
                }
                (Some(index), StepOutcome::skipped("active key present"))
            }
            None => {
                let name = key_file_name(platform.kind, &platform.account, key_type);
                let path = session.ssh_dir.join(&name);
                let provisioned = if toolkit.keys.exists(&path) {
                    tracing::info!(path = %path.display(), "adopting existing key file");
                    toolkit.keys.fingerprint(&path).await
                } else {
                    let comment = key_comment(platform.kind, &platform.account, &session.machine_name);
                    match toolkit.keys.generate(key_type, &comment, &path).await {
                        Ok(()) => toolkit.keys.fingerprint(&path).await,
                        Err(error) => Err(error),
                    }
                };
                match provisioned {
                    Ok(fingerprint) => {
                        platform
                            .keys
                            .push(KeyConfig::active(key_type, fingerprint, name, session.now, months));
                        report.changed = true;
                        (Some(platform.keys.len() - 1), StepOutcome::Done)
                    }
                    Err(error) => {
                        tracing::warn!(pair = %label, %error, "could not provision key");
                        (None, StepOutcome::failed(error))
                    }
                }
            }
        };

        let Some(index) = index else {
            report.pairs.push(PairApply {
                pair: label,
                key: key_outcome,
                routing: StepOutcome::skipped("no key"),
                upload: StepOutcome::skipped("no key"),
            });
            continue;
        };
        let key_path = session.resolve_key_path(&platform.keys[index].local_path);

        // routing
        let block = routing_block_id(&persona.name, platform.kind, &platform.account);
        let routing_outcome = match routing.upsert(&block, &[routing_entry(&persona, platform, key_path.clone())]) {
            Ok(()) => StepOutcome::Done,
            Err(error) => {
                tracing::warn!(pair = %label, %error, "could not write routing block");
                StepOutcome::failed(error)
            }
        };

        // upload
        let upload_outcome = if platform.keys[index].remote_id.is_some() {
            StepOutcome::skipped("already registered")
        } else {
            match upload(toolkit, platform, &key_path).await {
                Ok(id) => {
                    platform.keys[index].remote_id = Some(id);
                    report.changed = true;
                    StepOutcome::Done
                }
                Err(error) => {
                    tracing::warn!(pair = %label, %error, "key not uploaded");
                    StepOutcome::failed(error)
                }
            }
        };

        report.pairs.push(PairApply {
            pair: label,
            key: key_outcome,
            routing: routing_outcome,
            upload: upload_outcome,
        });
    }
    report
}

async fn upload(
    toolkit: &Toolkit<'_>,
    platform: &gk_core::Platform,
    key_path: &std::path::Path,
) -> Result<String, crate::error::LifecycleError> {
    let api = toolkit.connect(platform)?;
    let public_key = toolkit.keys.public_key(key_path).await?;
    let title = upload_title(&platform.account, &toolkit.session.machine_name, None);
    Ok(api.add_key(&title, &public_key).await?)
}
