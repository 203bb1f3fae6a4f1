use anyhow::bail;
use chrono::{DateTime, Utc};
use gk_lifecycle::rotate::{PairReport, PairResult};
use gk_lifecycle::{PairLabel, plan_rotation, rotate};
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::RotateArgs;
use crate::context::AppContext;
use crate::output::output;
use crate::progress::{PairMark, Progress, tally};

#[derive(Debug, Serialize)]
struct PlannedRotation {
    #[serde(flatten)]
    pair: PairLabel,
    fingerprint: Option<String>,
    expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct RotateResponse<'a> {
    succeeded: usize,
    failed: usize,
    skipped: usize,
    pairs: &'a [PairReport],
}

/// Handle `git-keys rotate`.
pub async fn handle(args: &RotateArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let selection = args.selection.to_selection();
    let mut config = ctx.declared()?;

    if args.dry_run {
        let planned: Vec<PlannedRotation> = plan_rotation(&config, &selection)?
            .into_iter()
            .map(|(pair, key)| PlannedRotation {
                pair,
                fingerprint: key.as_ref().map(|k| k.fingerprint.clone()),
                expires_at: key.map(|k| k.expires_at),
            })
            .collect();
        return output(&planned, flags.format);
    }

    let progress = Progress::spinner("Rotating keys");
    let report = rotate(&ctx.toolkit(), &mut config, &selection).await?;
    if report.changed() {
        ctx.save(&config)?;
    }

    for pair in &report.pairs {
        for warning in pair.warnings() {
            tracing::warn!(pair = %pair.pair, step = ?warning.step, "rotation step failed after the new key was routed");
        }
        let (mark, detail) = match &pair.result {
            PairResult::Rotated { fingerprint, .. } => (PairMark::Done, fingerprint.as_str()),
            PairResult::Skipped { reason } => (PairMark::Skipped, reason.as_str()),
            PairResult::Failed { reason, .. } => (PairMark::Failed, reason.as_str()),
        };
        progress.pair(mark, &pair.pair, detail);
    }
    let summary = tally("Rotated", report.succeeded(), report.pairs.len());
    if report.is_failure() {
        progress.finish_err(&summary);
    } else {
        progress.finish_ok(&summary);
    }

    output(
        &RotateResponse {
            succeeded: report.succeeded(),
            failed: report.failed(),
            skipped: report.skipped(),
            pairs: &report.pairs,
        },
        flags.format,
    )?;

    if report.is_failure() {
        bail!("{} pair(s) failed to rotate", report.failed());
    }
    Ok(())
}
