use std::path::PathBuf;

use anyhow::{Context, bail};
use chrono::{DateTime, Utc};
use gk_discovery::backup::{TIMESTAMP_FORMAT, copy_aside};
use serde::Serialize;

use crate::cli::root_commands::RestoreArgs;
use crate::cli::{GlobalFlags, OutputFormat};
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct SnapshotSummary {
    name: String,
    timestamp: DateTime<Utc>,
    ssh_config_path: PathBuf,
    has_declared_config: bool,
    keys_scanned: usize,
    suggested_personas: Vec<String>,
}

#[derive(Debug, Serialize)]
struct RestoreResponse {
    restored_from: String,
    path: PathBuf,
    previous: Option<PathBuf>,
    personas: usize,
}

/// Handle `git-keys restore`.
pub fn handle(args: &RestoreArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let Some(name) = &args.name else {
        let backups = ctx.backups.list().context("failed to list backups")?;
        return output(&backups, flags.format);
    };
    let snapshot = ctx
        .backups
        .read(name)
        .with_context(|| format!("failed to read backup {name}"))?;

    if !args.apply {
        if flags.format == OutputFormat::Json {
            return output(&snapshot, flags.format);
        }
        return output(
            &SnapshotSummary {
                name: name.clone(),
                timestamp: snapshot.timestamp,
                ssh_config_path: snapshot.ssh_config_path,
                has_declared_config: snapshot.old_config.is_some(),
                keys_scanned: snapshot.scan_result.keys.len(),
                suggested_personas: snapshot
                    .recommended_mapping
                    .personas
                    .into_iter()
                    .map(|p| p.name)
                    .collect(),
            },
            flags.format,
        );
    }

    let Some(config) = snapshot.old_config else {
        bail!("backup {name} holds no declared config");
    };
    let stamp = ctx.session.now.format(TIMESTAMP_FORMAT).to_string();
    let previous = copy_aside(ctx.store.path(), &stamp)
        .context("failed to copy the current declared config aside")?;
    ctx.save(&config)?;
    tracing::info!(backup = %name, "declared config restored; run `git-keys apply` to provision keys");

    output(
        &RestoreResponse {
            restored_from: name.clone(),
            path: ctx.store.path().to_path_buf(),
            previous,
            personas: config.personas.len(),
        },
        flags.format,
    )
}
