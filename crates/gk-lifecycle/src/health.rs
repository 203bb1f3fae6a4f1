//! Read-mostly reports over the declared model: `status` and `validate`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use gk_core::naming::same_fingerprint;
use gk_core::{DeclaredConfig, KeyStatus, Session};
use gk_ssh::KeyMaterial;
use serde::Serialize;

use crate::select::PairLabel;

/// Default window for flagging active keys as expiring soon.
pub const EXPIRING_SOON_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyStatusRow {
    #[serde(flatten)]
    pub pair: PairLabel,
    pub fingerprint: String,
    pub status: KeyStatus,
    pub local_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub days_left: i64,
    pub expiring_soon: bool,
}

/// One row per declared key; active keys expiring within `soon_days` are flagged.
#[must_use]
pub fn status(config: &DeclaredConfig, now: DateTime<Utc>, soon_days: i64) -> Vec<KeyStatusRow> {
    config
        .keys()
        .map(|(persona, platform, key)| KeyStatusRow {
            pair: PairLabel::of(persona, platform),
            fingerprint: key.fingerprint.clone(),
            status: key.status,
            local_path: key.local_path.clone(),
            remote_id: key.remote_id.clone(),
            expires_at: key.expires_at,
            days_left: key.days_until_expiry(now),
            expiring_soon: key.is_active() && key.expires_within(now, soon_days),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueKind {
    DuplicatePersona,
    DuplicateFingerprint,
    MultipleActiveKeys { count: usize },
    MissingKeyFile { path: PathBuf },
    InsecurePermissions { path: PathBuf, mode: u32 },
    FingerprintDrift { on_disk: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub subject: String,
    #[serde(flatten)]
    pub kind: IssueKind,
    /// Repaired by `--fix`.
    pub fixed: bool,
}

impl Issue {
    fn new(subject: impl Into<String>, kind: IssueKind) -> Self {
        Self {
            subject: subject.into(),
            kind,
            fixed: false,
        }
    }
}

/// Check the declared model against itself and the key directory.
///
/// With `fix`, private keys readable by others are narrowed to `0600`.
pub async fn validate(
    session: &Session,
    keys: &dyn KeyMaterial,
    config: &DeclaredConfig,
    fix: bool,
) -> Vec<Issue> {
    let mut issues = Vec::new();

    for (index, persona) in config.personas.iter().enumerate() {
        if config.personas[..index].iter().any(|p| p.name == persona.name) {
            issues.push(Issue::new(&persona.name, IssueKind::DuplicatePersona));
        }
        for platform in &persona.platforms {
            let count = platform.active_count();
            if count > 1 {
                issues.push(Issue::new(
                    PairLabel::of(persona, platform).to_string(),
                    IssueKind::MultipleActiveKeys { count },
                ));
            }
        }
    }

    let all: Vec<_> = config.keys().collect();
    for (index, (_, _, key)) in all.iter().enumerate() {
        if all[..index]
            .iter()
            .any(|(_, _, earlier)| same_fingerprint(&earlier.fingerprint, &key.fingerprint))
        {
            issues.push(Issue::new(&key.fingerprint, IssueKind::DuplicateFingerprint));
        }
    }

    for (persona, platform, key) in config.keys() {
        if key.status != KeyStatus::Active || key.local_path.trim().is_empty() {
            continue;
        }
        let subject = PairLabel::of(persona, platform).to_string();
        let path = session.resolve_key_path(&key.local_path);
        if !keys.exists(&path) {
            issues.push(Issue::new(subject, IssueKind::MissingKeyFile { path }));
            continue;
        }

        if let Some(mode) = loose_mode(&path) {
            let mut issue = Issue::new(&subject, IssueKind::InsecurePermissions { path: path.clone(), mode });
            if fix {
                match restrict(&path) {
                    Ok(()) => issue.fixed = true,
                    Err(error) => tracing::warn!(path = %path.display(), %error, "could not fix permissions"),
                }
            }
            issues.push(issue);
        }

        match keys.fingerprint(&path).await {
            Ok(on_disk) if !same_fingerprint(&on_disk, &key.fingerprint) => {
                issues.push(Issue::new(subject, IssueKind::FingerprintDrift { on_disk }));
            }
            Ok(_) => {}
            Err(error) => tracing::debug!(path = %path.display(), %error, "fingerprint unreadable"),
        }
    }

    tracing::info!(issues = issues.len(), "validation finished");
    issues
}

/// Permission bits when group or others have any access.
#[cfg(unix)]
fn loose_mode(path: &Path) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    let mode = std::fs::metadata(path).ok()?.permissions().mode() & 0o777;
    (mode & 0o077 != 0).then_some(mode)
}

#[cfg(not(unix))]
fn loose_mode(_path: &Path) -> Option<u32> {
    None
}

#[cfg(unix)]
fn restrict(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use gk_core::{KeyConfig, KeyType, Machine, Persona, Platform, PlatformKind};
    use pretty_assertions::assert_eq;

    #[test]
    fn expiring_soon_flags_only_active_keys() {
        let now = Utc.with_ymd_and_hms(2026, 4, 2, 8, 30, 0).unwrap();
        let mut platform = Platform::new(PlatformKind::GitHub, "octo".into(), None);
        let mut soon = KeyConfig::active(KeyType::Ed25519, "SHA256:a".into(), "a".into(), now, 6);
        soon.expires_at = now + Duration::days(12);
        let mut revoked = soon.clone();
        revoked.fingerprint = "SHA256:b".into();
        revoked.status = KeyStatus::Revoked;
        let later = KeyConfig::active(KeyType::Ed25519, "SHA256:c".into(), "c".into(), now, 6);
        platform.keys = vec![soon, revoked, later];

        let mut config = DeclaredConfig::new(Machine {
            id: "m".into(),
            name: "laptop".into(),
            os: "linux".into(),
            os_version: None,
        });
        config.personas.push(Persona {
            name: "personal".into(),
            email: "octo@example.com".into(),
            platforms: vec![platform],
        });

        let rows = status(&config, now, EXPIRING_SOON_DAYS);
        let flags: Vec<(i64, bool)> = rows.iter().map(|r| (r.days_left, r.expiring_soon)).collect();
        assert_eq!(flags, vec![(12, true), (12, false), (183, false)]);
    }
}
