//! Rotation saga.
//!
//! Per selected pair, in order:
//!
//! ```text
//! 1 generate   new pair at {key}-new                      fatal
//! 2 upload     account token, else `default` token        fatal
//! 3 route      managed block -> temporary path            fatal
//! 4 validate   ssh -T against the platform host           warning
//! 5 revoke     old remote id                              warning
//! 6 archive    old files -> archive/{file}.old-DATE       warning
//! 7 commit     rename to permanent name, replace config   warning
//! ```
//!
//! A fatal step deletes the new key files (and the uploaded key, once step 2
//! succeeded). Warnings never undo step 3: the new key already works.

use std::path::{Path, PathBuf};

use gk_core::naming::{key_comment, key_file_name, routing_block_id, temp_key_file_name, upload_title};
use gk_core::{DeclaredConfig, KeyConfig, KeyType, Persona, Platform, StepOutcome};
use gk_platform::PlatformApi;
use gk_ssh::{archive_key_pair, move_key_pair};
use serde::Serialize;

use crate::error::LifecycleError;
use crate::select::{PairLabel, PairRef, Selection};
use crate::toolkit::{Toolkit, routing_entry};

/// Used when the declared defaults carry a zero rotation period.
pub const FALLBACK_EXPIRATION_MONTHS: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationStep {
    Generate,
    Upload,
    Route,
    Validate,
    RevokeOld,
    ArchiveOld,
    Commit,
}

impl RotationStep {
    /// Steps whose failure aborts the pair.
    #[must_use]
    pub const fn is_fatal(self) -> bool {
        matches!(self, Self::Generate | Self::Upload | Self::Route)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub step: RotationStep,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum PairResult {
    Rotated {
        fingerprint: String,
        local_path: String,
        remote_id: String,
    },
    Skipped {
        reason: String,
    },
    Failed {
        step: RotationStep,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairReport {
    #[serde(flatten)]
    pub pair: PairLabel,
    pub steps: Vec<StepRecord>,
    pub result: PairResult,
}

impl PairReport {
    /// Non-fatal step failures.
    pub fn warnings(&self) -> impl Iterator<Item = &StepRecord> {
        self.steps
            .iter()
            .filter(|record| record.outcome.is_failed() && !record.step.is_fatal())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RotationReport {
    pub pairs: Vec<PairReport>,
}

impl RotationReport {
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.count(|r| matches!(r, PairResult::Rotated { .. }))
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|r| matches!(r, PairResult::Failed { .. }))
    }

    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|r| matches!(r, PairResult::Skipped { .. }))
    }

    /// The declared model must be saved.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.succeeded() > 0
    }

    /// Command-level failure: every attempted pair failed, or any pair
    /// failed at a fatal step. Only fatal steps fail a pair, so the second
    /// condition subsumes the first.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.failed() > 0
    }

    fn count(&self, pred: impl Fn(&PairResult) -> bool) -> usize {
        self.pairs.iter().filter(|p| pred(&p.result)).count()
    }
}

/// Pairs `rotate` would act on, for dry runs.
///
/// # Errors
///
/// See [`Selection::resolve`].
pub fn plan_rotation(
    config: &DeclaredConfig,
    selection: &Selection,
) -> Result<Vec<(PairLabel, Option<KeyConfig>)>, LifecycleError> {
    Ok(selection
        .resolve(config)?
        .into_iter()
        .map(|pair| {
            let persona = &config.personas[pair.persona];
            let platform = &persona.platforms[pair.platform];
            (PairLabel::of(persona, platform), platform.active_key().cloned())
        })
        .collect())
}

/// Rotate every selected pair. `config` is updated in place; the caller
/// persists it when [`RotationReport::changed`].
///
/// # Errors
///
/// Only selection errors; per-pair failures land in the report.
pub async fn rotate(
    toolkit: &Toolkit<'_>,
    config: &mut DeclaredConfig,
    selection: &Selection,
) -> Result<RotationReport, LifecycleError> {
    let mut report = RotationReport::default();
    for pair in selection.resolve(config)? {
        let persona = &config.personas[pair.persona];
        let platform = &persona.platforms[pair.platform];
        let label = PairLabel::of(persona, platform);

        let Some(index) = platform.active_key_index() else {
            tracing::warn!(pair = %label, "no active key; nothing to rotate");
            report.pairs.push(PairReport {
                pair: label,
                steps: Vec::new(),
                result: PairResult::Skipped {
                    reason: "no active key".into(),
                },
            });
            continue;
        };
        if platform.active_count() > 1 {
            tracing::warn!(
                pair = %label,
                active = platform.active_count(),
                "several active keys; rotating the first"
            );
        }

        tracing::info!(pair = %label, "rotating key");
        let mut saga = PairSaga {
            toolkit,
            persona: persona.clone(),
            platform: platform.clone(),
            old: platform.keys[index].clone(),
            key_type: config.defaults.key_type,
            months: match config.defaults.key_expiration_months {
                0 => FALLBACK_EXPIRATION_MONTHS,
                months => months,
            },
            steps: Vec::new(),
        };
        let outcome = saga.run().await;

        let result = match outcome {
            Ok(new_key) => {
                let result = PairResult::Rotated {
                    fingerprint: new_key.fingerprint.clone(),
                    local_path: new_key.local_path.clone(),
                    remote_id: new_key.remote_id.clone().unwrap_or_default(),
                };
                replace_key(config, pair, index, new_key);
                result
            }
            Err((step, reason)) => {
                tracing::warn!(pair = %label, ?step, %reason, "rotation failed");
                PairResult::Failed { step, reason }
            }
        };
        report.pairs.push(PairReport {
            pair: label,
            steps: saga.steps,
            result,
        });
    }

    tracing::info!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        skipped = report.skipped(),
        "rotation finished"
    );
    Ok(report)
}

fn replace_key(config: &mut DeclaredConfig, pair: PairRef, index: usize, key: KeyConfig) {
    if let Some(slot) = config
        .personas
        .get_mut(pair.persona)
        .and_then(|persona| persona.platforms.get_mut(pair.platform))
        .and_then(|platform| platform.keys.get_mut(index))
    {
        *slot = key;
    }
}

type Fatal = (RotationStep, String);

struct PairSaga<'t, 'a> {
    toolkit: &'t Toolkit<'a>,
    persona: Persona,
    platform: Platform,
    old: KeyConfig,
    key_type: KeyType,
    months: u32,
    steps: Vec<StepRecord>,
}

impl PairSaga<'_, '_> {
    fn record(&mut self, step: RotationStep, outcome: StepOutcome) {
        if let StepOutcome::Failed { reason } = &outcome {
            if step.is_fatal() {
                tracing::debug!(?step, %reason, "fatal rotation step");
            } else {
                tracing::warn!(?step, %reason, "rotation step failed; continuing");
            }
        }
        self.steps.push(StepRecord { step, outcome });
    }

    fn fatal(&mut self, step: RotationStep, error: impl std::fmt::Display) -> Fatal {
        let reason = error.to_string();
        self.record(step, StepOutcome::failed(&reason));
        (step, reason)
    }

    /// Delete the new key files; failures are logged only.
    fn discard(&self, path: &Path) {
        if let Err(error) = self.toolkit.keys.delete(path) {
            tracing::warn!(path = %path.display(), %error, "could not delete new key files");
        }
    }

    async fn run(&mut self) -> Result<KeyConfig, Fatal> {
        let session = self.toolkit.session;
        let (kind, account) = (self.platform.kind, self.platform.account.clone());
        let block_id = routing_block_id(&self.persona.name, kind, &account);
        let temp_name = temp_key_file_name(kind, &account, self.key_type);
        let temp_path = session.ssh_dir.join(&temp_name);

        // 1. generate
        if session.resolve_key_path(&self.old.local_path) == temp_path {
            return Err(self.fatal(
                RotationStep::Generate,
                format!(
                    "the active key still uses the temporary name {}; rename it first",
                    temp_path.display()
                ),
            ));
        }
        if self.toolkit.keys.exists(&temp_path) {
            tracing::warn!(path = %temp_path.display(), "removing leftover key from an interrupted rotation");
            if let Err(error) = self.toolkit.keys.delete(&temp_path) {
                return Err(self.fatal(RotationStep::Generate, error));
            }
        }
        let comment = key_comment(kind, &account, &session.machine_name);
        if let Err(error) = self
            .toolkit
            .keys
            .generate(self.key_type, &comment, &temp_path)
            .await
        {
            self.discard(&temp_path);
            return Err(self.fatal(RotationStep::Generate, error));
        }
        let (fingerprint, public_key) = match self.inspect(&temp_path).await {
            Ok(pair) => pair,
            Err(error) => {
                self.discard(&temp_path);
                return Err(self.fatal(RotationStep::Generate, error));
            }
        };
        self.record(RotationStep::Generate, StepOutcome::Done);

        // 2. upload
        let api = match self.toolkit.connect(&self.platform) {
            Ok(api) => api,
            Err(error) => {
                self.discard(&temp_path);
                return Err(self.fatal(RotationStep::Upload, error));
            }
        };
        let title = upload_title(&account, &session.machine_name, Some(session.today()));
        let remote_id = match api.add_key(&title, &public_key).await {
            Ok(id) => id,
            Err(error) => {
                self.discard(&temp_path);
                return Err(self.fatal(RotationStep::Upload, error));
            }
        };
        self.record(RotationStep::Upload, StepOutcome::Done);

        // 3. route
        let routing = self.toolkit.routing();
        let entry = routing_entry(&self.persona, &self.platform, temp_path.clone());
        if let Err(error) = routing.upsert(&block_id, &[entry]) {
            self.withdraw(api.as_ref(), &remote_id).await;
            self.discard(&temp_path);
            return Err(self.fatal(RotationStep::Route, error));
        }
        self.record(RotationStep::Route, StepOutcome::Done);

        // 4. validate
        let outcome = self.validate(&temp_path).await;
        self.record(RotationStep::Validate, outcome);

        // 5. revoke old
        let outcome = match self.old.remote_id.as_deref() {
            None => StepOutcome::skipped("old key has no remote id"),
            Some(old_id) => match api.delete_key(old_id).await {
                Ok(()) => StepOutcome::Done,
                Err(error) => StepOutcome::failed(format!(
                    "old key {old_id} is still registered, remove it manually: {error}"
                )),
            },
        };
        self.record(RotationStep::RevokeOld, outcome);

        // 6. archive old
        let outcome = self.archive_old();
        self.record(RotationStep::ArchiveOld, outcome);

        // 7. commit
        let (local_path, outcome) = self.commit(&block_id, &temp_path, &temp_name);
        self.record(RotationStep::Commit, outcome);

        let mut key = KeyConfig::active(self.key_type, fingerprint, local_path, session.now, self.months);
        key.remote_id = Some(remote_id);
        Ok(key)
    }

    async fn inspect(&self, path: &Path) -> Result<(String, String), LifecycleError> {
        let fingerprint = self.toolkit.keys.fingerprint(path).await?;
        let public_key = self.toolkit.keys.public_key(path).await?;
        Ok((fingerprint, public_key))
    }

    /// Compensation for step 2.
    async fn withdraw(&self, api: &dyn PlatformApi, remote_id: &str) {
        match api.delete_key(remote_id).await {
            Ok(()) => tracing::info!(remote_id, "withdrew uploaded key"),
            Err(error) => tracing::warn!(
                remote_id,
                %error,
                "could not withdraw uploaded key; remove it manually"
            ),
        }
    }

    async fn validate(&self, identity: &Path) -> StepOutcome {
        let Some(probe) = self.toolkit.probe else {
            return StepOutcome::skipped("connectivity check disabled");
        };
        let host = self.platform.ssh_host();
        match probe
            .probe(&host, identity, self.platform.kind.greetings())
            .await
        {
            Ok(seen) if seen.authenticated => StepOutcome::Done,
            Ok(seen) => StepOutcome::failed(format!(
                "{host} did not confirm the new key: {}",
                seen.output.trim()
            )),
            Err(error) => StepOutcome::failed(error),
        }
    }

    fn archive_old(&self) -> StepOutcome {
        if self.old.local_path.trim().is_empty() {
            return StepOutcome::skipped("old key has no local path");
        }
        let session = self.toolkit.session;
        let old_path = session.resolve_key_path(&self.old.local_path);
        if !old_path.exists() {
            return StepOutcome::skipped(format!("{} is already gone", old_path.display()));
        }
        match archive_key_pair(&old_path, &session.archive_dir, session.today()) {
            Ok(_) => StepOutcome::Done,
            Err(error) => StepOutcome::failed(error),
        }
    }

    /// Promote the temporary pair. On failure the key stays at its
    /// temporary path, which routing already points at.
    fn commit(&self, block_id: &str, temp_path: &Path, temp_name: &str) -> (String, StepOutcome) {
        let session = self.toolkit.session;
        let permanent_name = key_file_name(self.platform.kind, &self.platform.account, self.key_type);
        let permanent_path: PathBuf = session.ssh_dir.join(&permanent_name);

        if let Err(error) = move_key_pair(temp_path, &permanent_path) {
            return (
                temp_name.to_string(),
                StepOutcome::failed(format!("kept temporary key name: {error}")),
            );
        }

        let entry = routing_entry(&self.persona, &self.platform, permanent_path.clone());
        match self.toolkit.routing().upsert(block_id, &[entry]) {
            Ok(()) => (permanent_name, StepOutcome::Done),
            Err(error) => match move_key_pair(&permanent_path, temp_path) {
                Ok(()) => (
                    temp_name.to_string(),
                    StepOutcome::failed(format!("kept temporary key name: {error}")),
                ),
                Err(undo) => {
                    tracing::error!(
                        path = %permanent_path.display(),
                        %undo,
                        "routing still references the temporary key path"
                    );
                    (
                        permanent_name,
                        StepOutcome::failed(format!("routing not updated to permanent path: {error}")),
                    )
                }
            },
        }
    }
}
