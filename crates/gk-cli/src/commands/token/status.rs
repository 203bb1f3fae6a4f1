use gk_core::PlatformKind;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::TokenStatusArgs;
use crate::commands::shared::declared_lenient;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct TokenRow {
    platform: PlatformKind,
    account: String,
    source: &'static str,
}

/// One row per platform for `default` and every declared account.
pub fn run(args: &TokenStatusArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let declared = declared_lenient(ctx);
    let mut rows = Vec::new();

    for kind in PlatformKind::ALL {
        if args.platform.is_some_and(|only| only != kind) {
            continue;
        }
        let mut accounts = vec![gk_auth::DEFAULT_ACCOUNT.to_string()];
        for platform in declared
            .iter()
            .flat_map(|config| &config.personas)
            .flat_map(|persona| &persona.platforms)
            .filter(|platform| platform.kind == kind)
        {
            if !accounts.contains(&platform.account) {
                accounts.push(platform.account.clone());
            }
        }

        for account in accounts {
            rows.push(TokenRow {
                platform: kind,
                source: ctx.tokens.source(kind, &account).unwrap_or("missing"),
                account,
            });
        }
    }

    output(&rows, flags.format)
}
