use anyhow::Context;
use gk_lifecycle::setup_git;

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

/// Handle `git-keys setup-git`.
pub fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let config = ctx.declared()?;
    let report = setup_git(&ctx.session, &config).context("failed to write git identities")?;
    if report.identity_files.is_empty() {
        tracing::warn!("no platform declares a git_dir; nothing written");
    }
    output(&report, flags.format)
}
