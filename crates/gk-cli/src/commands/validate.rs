use anyhow::bail;
use gk_lifecycle::health::{self, Issue};
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ValidateArgs;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct ValidateResponse {
    valid: bool,
    fixed: usize,
    issues: Vec<Issue>,
}

/// Handle `git-keys validate`. Fails while unfixed issues remain.
pub async fn handle(args: &ValidateArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let config = ctx.declared()?;
    let issues = health::validate(&ctx.session, &ctx.keys, &config, args.fix).await;

    let fixed = issues.iter().filter(|issue| issue.fixed).count();
    let open = issues.len() - fixed;
    output(
        &ValidateResponse {
            valid: open == 0,
            fixed,
            issues,
        },
        flags.format,
    )?;

    if open > 0 {
        bail!("{open} issue(s) found");
    }
    Ok(())
}
