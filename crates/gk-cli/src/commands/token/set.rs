use anyhow::{Context, bail};
use gk_auth::TokenStore;
use gk_core::PlatformKind;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::TokenSetArgs;
use crate::context::AppContext;
use crate::output::output;
use crate::prompt;

#[derive(Debug, Serialize)]
struct TokenSetResponse {
    platform: PlatformKind,
    account: String,
    service: String,
    stored: bool,
}

pub fn run(args: &TokenSetArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let token = match &args.token {
        Some(token) => token.trim().to_string(),
        None => prompt::read_secret(&format!("{} token for {}", args.platform, args.account))?,
    };
    if token.is_empty() {
        bail!("empty token; nothing stored");
    }

    ctx.tokens
        .set(args.platform, &args.account, &token)
        .with_context(|| format!("failed to store the {} token for {}", args.platform, args.account))?;

    output(
        &TokenSetResponse {
            platform: args.platform,
            account: args.account.clone(),
            service: ctx.tokens.service(args.platform),
            stored: true,
        },
        flags.format,
    )
}
