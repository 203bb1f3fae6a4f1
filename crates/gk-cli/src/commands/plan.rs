use gk_lifecycle::plan;

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

/// Handle `git-keys plan`.
pub fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let config = ctx.declared()?;
    output(&plan(&ctx.toolkit(), &config), flags.format)
}
