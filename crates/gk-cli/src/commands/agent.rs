use std::path::PathBuf;

use anyhow::bail;
use gk_core::{DeclaredConfig, StepOutcome};
use gk_lifecycle::PairLabel;
use gk_ssh::SshAgent;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::{AgentArgs, AgentCommands};
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct AgentRow {
    #[serde(flatten)]
    pair: PairLabel,
    path: PathBuf,
    #[serde(flatten)]
    outcome: StepOutcome,
}

/// Handle `git-keys agent`.
pub async fn handle(action: &AgentCommands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let (args, adding) = match action {
        AgentCommands::Add(args) => (args, true),
        AgentCommands::Remove(args) => (args, false),
    };
    let config = ctx.declared()?;
    let targets = active_keys(ctx, &config, args)?;

    let mut rows = Vec::with_capacity(targets.len());
    for (pair, path) in targets {
        let result = if adding {
            ctx.agent.add(&path).await
        } else {
            ctx.agent.remove(&path).await
        };
        let outcome = match result {
            Ok(()) => StepOutcome::Done,
            Err(error) => {
                tracing::warn!(%pair, path = %path.display(), %error, "agent update failed");
                StepOutcome::failed(error)
            }
        };
        rows.push(AgentRow { pair, path, outcome });
    }

    output(&rows, flags.format)?;
    let failed = rows.iter().filter(|row| row.outcome.is_failed()).count();
    if failed > 0 {
        bail!("{failed} key(s) not updated in the agent");
    }
    Ok(())
}

fn active_keys(
    ctx: &AppContext,
    config: &DeclaredConfig,
    args: &AgentArgs,
) -> anyhow::Result<Vec<(PairLabel, PathBuf)>> {
    if let Some(name) = &args.persona
        && config.persona(name).is_none()
    {
        bail!("persona {name} is not declared");
    }
    Ok(config
        .keys()
        .filter(|(persona, _, key)| {
            key.is_active() && args.persona.as_ref().is_none_or(|name| &persona.name == name)
        })
        .map(|(persona, platform, key)| {
            (
                PairLabel::of(persona, platform),
                ctx.session.resolve_key_path(&key.local_path),
            )
        })
        .collect())
}
