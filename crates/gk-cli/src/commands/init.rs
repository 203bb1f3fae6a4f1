use std::path::PathBuf;

use anyhow::bail;
use gk_core::{Machine, Persona, Platform, PlatformKind};
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::InitArgs;
use crate::commands::shared::fresh_config;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct InitResponse {
    path: PathBuf,
    machine: Machine,
    persona: String,
    platform: PlatformKind,
    account: String,
}

/// Handle `git-keys init`.
pub fn handle(args: &InitArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    if ctx.store.exists() && !args.force {
        bail!(
            "{} already exists; pass --force to replace it",
            ctx.store.path().display()
        );
    }

    let machine = gk_config::machine::detect();
    tracing::debug!(id = %machine.id, name = %machine.name, os = %machine.os, "detected machine");

    let mut config = fresh_config(ctx, machine);
    let mut platform = Platform::new(args.platform, args.account.clone(), args.base_url.clone());
    platform.git_dir.clone_from(&args.git_dir);
    config.personas.push(Persona {
        name: args.persona.clone(),
        email: args.email.clone(),
        platforms: vec![platform],
    });
    ctx.save(&config)?;

    output(
        &InitResponse {
            path: ctx.store.path().to_path_buf(),
            machine: config.machine,
            persona: args.persona.clone(),
            platform: args.platform,
            account: args.account.clone(),
        },
        flags.format,
    )
}
