use anyhow::Context;
use gk_auth::TokenStore;
use gk_core::PlatformKind;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::TokenDeleteArgs;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct TokenDeleteResponse {
    platform: PlatformKind,
    account: String,
    deleted: bool,
}

pub fn run(args: &TokenDeleteArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let deleted = ctx
        .tokens
        .delete(args.platform, &args.account)
        .with_context(|| format!("failed to delete the {} token for {}", args.platform, args.account))?;
    if !deleted {
        tracing::info!(platform = %args.platform, account = %args.account, "no token stored");
    }

    output(
        &TokenDeleteResponse {
            platform: args.platform,
            account: args.account.clone(),
            deleted,
        },
        flags.format,
    )
}
