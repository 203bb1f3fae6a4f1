use std::path::PathBuf;

use anyhow::{Context, bail};
use gk_core::{DeclaredConfig, KeyStatus};
use gk_discovery::backup::{TIMESTAMP_FORMAT, copy_aside};
use gk_discovery::{ScanOptions, Snapshot, merge_personas, recommend};
use gk_lifecycle::{ApplyReport, CleanupOptions, CleanupReport, PairLabel, apply, cleanup};
use gk_ssh::public_key_path;
use gk_ssh::routing::managed_block_ids;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::RebuildArgs;
use crate::commands::shared::{declared_lenient, fresh_config};
use crate::context::AppContext;
use crate::output::output;
use crate::progress::Progress;
use crate::prompt;

#[derive(Debug, Serialize)]
struct RebuildPreview {
    backup_dir: Option<PathBuf>,
    routing_blocks: Vec<String>,
    key_files: Vec<PathBuf>,
    remote_keys: Vec<PairLabel>,
    config_file: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct RebuildResponse {
    backup: Option<PathBuf>,
    routing_copy: Option<PathBuf>,
    config_copy: Option<PathBuf>,
    cleanup_failures: usize,
    cleanup: CleanupReport,
    personas: usize,
    apply: Option<ApplyReport>,
}

/// Handle `git-keys rebuild`.
///
/// Order matters: the snapshot and the side copies are written before
/// anything is removed, and a failed snapshot stops the rebuild.
pub async fn handle(args: &RebuildArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let declared = declared_lenient(ctx);
    if args.dry_run {
        return output(&preview(ctx, declared.as_ref(), args)?, flags.format);
    }

    let now = ctx.session.now;
    let stamp = now.format(TIMESTAMP_FORMAT).to_string();

    let progress = Progress::spinner("Scanning current setup");
    let scan = ctx
        .scanner()
        .scan(declared.as_ref(), ScanOptions::default())
        .await;
    let mapping = recommend(&scan, declared.as_ref());

    let backup = if args.skip_backup {
        tracing::warn!("skipping the backup snapshot");
        None
    } else {
        let snapshot = Snapshot {
            timestamp: now,
            old_config: declared.clone(),
            scan_result: scan,
            ssh_config_path: ctx.paths.ssh_config.clone(),
            recommended_mapping: mapping.clone(),
        };
        Some(
            ctx.backups
                .write(&snapshot)
                .context("failed to write the backup snapshot; nothing was removed")?,
        )
    };
    let routing_copy = copy_aside(&ctx.paths.ssh_config, &stamp)
        .context("failed to copy the SSH config aside; nothing was removed")?;
    let config_copy = copy_aside(ctx.store.path(), &stamp)
        .context("failed to copy the declared config aside; nothing was removed")?;

    progress.set_message("Removing managed keys, routing, and tokens");
    let toolkit = ctx.toolkit();
    let cleanup_report = cleanup(
        &toolkit,
        declared.as_ref(),
        &ctx.store,
        CleanupOptions {
            keep_remote: args.keep_remote,
        },
    )
    .await;
    let cleanup_failures = cleanup_report.failures();
    if cleanup_failures > 0 {
        progress.finish_err("Cleanup incomplete");
    } else {
        progress.finish_clear();
    }

    let accepted = if mapping.personas.is_empty() {
        tracing::warn!("nothing to re-create: no personas declared or discovered");
        Vec::new()
    } else {
        prompt::run_wizard(&mapping, args.yes).with_context(|| match &backup {
            Some(path) => format!(
                "rebuild stopped after cleanup; `git-keys restore {} --apply` brings the old config back",
                path.display()
            ),
            None => "rebuild stopped after cleanup".to_string(),
        })?
    };

    let mut response = RebuildResponse {
        backup,
        routing_copy,
        config_copy,
        cleanup_failures,
        cleanup: cleanup_report,
        personas: 0,
        apply: None,
    };

    if !accepted.is_empty() {
        let mut config = match &declared {
            Some(old) => {
                let mut config = DeclaredConfig::new(old.machine.clone());
                config.defaults = old.defaults.clone();
                config
            }
            None => fresh_config(ctx, gk_config::machine::detect()),
        };
        merge_personas(&mut config, accepted);
        ctx.save(&config)?;

        let progress = Progress::spinner("Provisioning keys and routing");
        let report = apply(&toolkit, &mut config).await;
        if report.changed {
            ctx.save(&config)?;
        }
        progress.finish_clear();
        response.personas = config.personas.len();
        response.apply = Some(report);
    }

    output(&response, flags.format)?;

    let apply_failed = response.apply.as_ref().is_some_and(ApplyReport::is_failure);
    if cleanup_failures > 0 || apply_failed {
        bail!("rebuild finished with failures");
    }
    Ok(())
}

fn preview(
    ctx: &AppContext,
    declared: Option<&DeclaredConfig>,
    args: &RebuildArgs,
) -> anyhow::Result<RebuildPreview> {
    let routing = ctx.toolkit().routing().read()?;
    let mut preview = RebuildPreview {
        backup_dir: (!args.skip_backup).then(|| ctx.backups.dir().to_path_buf()),
        routing_blocks: managed_block_ids(&routing),
        key_files: Vec::new(),
        remote_keys: Vec::new(),
        config_file: ctx.store.exists().then(|| ctx.store.path().to_path_buf()),
    };

    for (persona, platform, key) in declared.into_iter().flat_map(|config| config.keys()) {
        if !key.local_path.trim().is_empty() {
            let private = ctx.session.resolve_key_path(&key.local_path);
            preview.key_files.push(public_key_path(&private));
            preview.key_files.push(private);
        }
        if !args.keep_remote && key.status != KeyStatus::Revoked && key.remote_id.is_some() {
            preview.remote_keys.push(PairLabel::of(persona, platform));
        }
    }
    preview.key_files.sort();
    preview.key_files.dedup();
    Ok(preview)
}
