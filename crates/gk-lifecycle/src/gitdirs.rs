//! Directory-scoped git identities: one identity file per platform with a
//! directory pattern, all wired from a managed `includeIf` block.

use std::path::PathBuf;

use gk_core::{DeclaredConfig, Session};
use gk_git::GitConfigFile;
use gk_git::includes::{IncludeEntry, identity_file_name, normalize_git_dir, render_identity_file};
use serde::Serialize;

use crate::error::LifecycleError;
use crate::select::PairLabel;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GitSetupReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<PathBuf>,
    pub identity_files: Vec<PathBuf>,
    /// Pairs with no directory pattern.
    pub unscoped: Vec<PairLabel>,
}

/// Write identity files and the includes block for every platform with a
/// `git_dir`. Nothing is written when no platform has one.
///
/// # Errors
///
/// Fails on the first file that cannot be written.
pub fn setup_git(session: &Session, config: &DeclaredConfig) -> Result<GitSetupReport, LifecycleError> {
    let mut report = GitSetupReport::default();
    let mut entries = Vec::new();

    for persona in &config.personas {
        for platform in &persona.platforms {
            let Some(pattern) = platform.git_dir.as_deref().filter(|p| !p.trim().is_empty()) else {
                report.unscoped.push(PairLabel::of(persona, platform));
                continue;
            };
            let path = GitConfigFile::write_identity_file(
                &session.home,
                &identity_file_name(persona, platform),
                &render_identity_file(persona, platform),
            )?;
            entries.push(IncludeEntry {
                git_dir: normalize_git_dir(pattern),
                path: path.clone(),
            });
            report.identity_files.push(path);
        }
    }

    if entries.is_empty() {
        tracing::info!("no platform has a directory pattern; git config untouched");
        return Ok(report);
    }
    let gitconfig = GitConfigFile::new(&session.gitconfig);
    report.backup = gitconfig.backup()?;
    gitconfig.apply_includes(&entries)?;
    Ok(report)
}
