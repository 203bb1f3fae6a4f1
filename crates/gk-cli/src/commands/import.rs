use std::path::PathBuf;

use anyhow::Context;
use gk_discovery::{ScanOptions, merge_personas, recommend};
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::WizardArgs;
use crate::commands::shared::fresh_config;
use crate::context::AppContext;
use crate::output::output;
use crate::progress::Progress;
use crate::prompt;

#[derive(Debug, Serialize)]
struct ImportResponse {
    path: PathBuf,
    suggested: usize,
    personas_added: usize,
    platforms_added: usize,
}

/// Handle `git-keys import`.
///
/// Suggestions always come from the scan, so personas found on disk are
/// merged into an existing declared config.
pub async fn handle(args: &WizardArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let declared = ctx
        .store
        .load_optional()
        .context("failed to load the declared config")?;

    let progress = Progress::spinner("Scanning SSH and git setup");
    let scan = ctx
        .scanner()
        .scan(
            declared.as_ref(),
            ScanOptions {
                check_remote: args.check_remote,
            },
        )
        .await;
    progress.finish_clear();

    let mapping = recommend(&scan, None);
    let accepted = if mapping.personas.is_empty() {
        tracing::warn!("no git identity found; nothing to import");
        Vec::new()
    } else {
        prompt::run_wizard(&mapping, args.yes)?
    };

    let mut config = match declared {
        Some(config) => config,
        None => fresh_config(ctx, gk_config::machine::detect()),
    };
    let (personas_added, platforms_added) = merge_personas(&mut config, accepted);
    if personas_added + platforms_added > 0 {
        ctx.save(&config)?;
    }

    output(
        &ImportResponse {
            path: ctx.store.path().to_path_buf(),
            suggested: mapping.personas.len(),
            personas_added,
            platforms_added,
        },
        flags.format,
    )
}
