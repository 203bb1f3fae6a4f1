use anyhow::bail;
use gk_core::StepOutcome;
use gk_lifecycle::revoke::RevokedKey;
use gk_lifecycle::{RevokeOptions, RevokeTarget, revoke};
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::RevokeArgs;
use crate::context::AppContext;
use crate::output::output;
use crate::progress::{PairMark, Progress, tally};

#[derive(Debug, Serialize)]
struct RevokeResponse<'a> {
    revoked: usize,
    failed: usize,
    keys: &'a [RevokedKey],
}

/// Handle `git-keys revoke`.
pub async fn handle(args: &RevokeArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let target = match &args.fingerprint {
        Some(fingerprint) => RevokeTarget::Fingerprint(fingerprint.clone()),
        None => RevokeTarget::Pairs(args.selection.to_selection()),
    };
    let mut config = ctx.declared()?;

    let progress = Progress::spinner("Revoking keys");
    let report = revoke(
        &ctx.toolkit(),
        &mut config,
        &target,
        RevokeOptions {
            delete_local: args.delete_local,
        },
    )
    .await?;
    if report.changed() {
        ctx.save(&config)?;
    }
    for key in &report.keys {
        match &key.remote {
            StepOutcome::Failed { reason } => progress.pair(PairMark::Failed, &key.pair, reason),
            StepOutcome::Done | StepOutcome::Skipped { .. } => {
                progress.pair(PairMark::Done, &key.pair, &key.fingerprint);
            }
        }
    }
    let summary = tally("Revoked", report.revoked(), report.keys.len());
    if report.is_failure() {
        progress.finish_err(&summary);
    } else {
        progress.finish_ok(&summary);
    }

    output(
        &RevokeResponse {
            revoked: report.revoked(),
            failed: report.failed(),
            keys: &report.keys,
        },
        flags.format,
    )?;

    if report.is_failure() {
        bail!("{} key(s) could not be revoked", report.failed());
    }
    Ok(())
}
