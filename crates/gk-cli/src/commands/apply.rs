use anyhow::bail;
use gk_lifecycle::apply;

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;
use crate::progress::Progress;

/// Handle `git-keys apply`.
pub async fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let mut config = ctx.declared()?;

    let progress = Progress::spinner("Provisioning keys and routing");
    let report = apply(&ctx.toolkit(), &mut config).await;
    if report.changed {
        ctx.save(&config)?;
    }

    if report.is_failure() {
        progress.finish_err("Provisioning incomplete");
    } else {
        progress.finish_ok("Provisioned");
    }
    output(&report, flags.format)?;

    if report.is_failure() {
        bail!("at least one pair could not be provisioned");
    }
    Ok(())
}
