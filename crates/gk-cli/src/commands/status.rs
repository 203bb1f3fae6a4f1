use gk_lifecycle::health::{self, KeyStatusRow};
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct StatusResponse {
    machine: String,
    expiring_soon: usize,
    keys: Vec<KeyStatusRow>,
}

/// Handle `git-keys status`.
pub fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let config = ctx.declared()?;
    let keys = health::status(
        &config,
        ctx.session.now,
        ctx.settings.keys.expiring_soon_days,
    );
    let expiring_soon = keys.iter().filter(|row| row.expiring_soon).count();
    if expiring_soon > 0 {
        tracing::info!(count = expiring_soon, "keys expiring soon; run `git-keys rotate`");
    }

    output(
        &StatusResponse {
            machine: config.machine.name,
            expiring_soon,
            keys,
        },
        flags.format,
    )
}
