use gk_discovery::{ScanOptions, recommend};

use crate::cli::GlobalFlags;
use crate::commands::shared::declared_lenient;
use crate::context::AppContext;
use crate::output::output;
use crate::progress::Progress;

/// Handle `git-keys recommend`.
pub async fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let declared = declared_lenient(ctx);

    let progress = Progress::spinner("Scanning SSH and git setup");
    let scan = ctx
        .scanner()
        .scan(declared.as_ref(), ScanOptions::default())
        .await;
    progress.finish_clear();

    output(&recommend(&scan, declared.as_ref()), flags.format)
}
