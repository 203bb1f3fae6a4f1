use anyhow::Context;
use gk_discovery::ScanOptions;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ScanArgs;
use crate::context::AppContext;
use crate::output::output;
use crate::progress::Progress;

/// Handle `git-keys scan`.
pub async fn handle(args: &ScanArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let declared = ctx
        .store
        .load_optional()
        .context("failed to load the declared config")?;

    let progress = Progress::spinner("Scanning SSH and git setup");
    let result = ctx
        .scanner()
        .scan(
            declared.as_ref(),
            ScanOptions {
                check_remote: args.check_remote,
            },
        )
        .await;
    progress.finish_clear();

    output(&result, flags.format)
}
