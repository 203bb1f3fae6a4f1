//! Immutable backup snapshots taken before destructive operations.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use gk_core::DeclaredConfig;
use gk_core::recommend::RecommendedMapping;
use gk_core::scan::ScanResult;
use serde::{Deserialize, Serialize};

use crate::error::DiscoveryError;

const PREFIX: &str = "backup-";
const EXTENSION: &str = ".json";

/// `YYYY-MM-DD-HHMMSS`, shared by snapshot names and `.pre-rebuild-*` copies.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H%M%S";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_config: Option<DeclaredConfig>,
    pub scan_result: ScanResult,
    pub ssh_config_path: PathBuf,
    pub recommended_mapping: RecommendedMapping,
}

/// A snapshot file as listed, without reading its contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupEntry {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
}

/// Directory of snapshot files.
#[derive(Debug, Clone)]
pub struct BackupStore {
    dir: PathBuf,
}

impl BackupStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `snapshot` under a name derived from its timestamp. An existing
    /// file is never overwritten; a `-n` counter is appended instead.
    ///
    /// # Errors
    ///
    /// Fails when the directory or file cannot be written.
    pub fn write(&self, snapshot: &Snapshot) -> Result<PathBuf, DiscoveryError> {
        fs::create_dir_all(&self.dir).map_err(|e| DiscoveryError::io(&self.dir, e))?;
        let stamp = snapshot.timestamp.format(TIMESTAMP_FORMAT).to_string();

        let mut path = self.dir.join(format!("{PREFIX}{stamp}{EXTENSION}"));
        let mut counter = 1_u32;
        while path.exists() {
            counter += 1;
            path = self.dir.join(format!("{PREFIX}{stamp}-{counter}{EXTENSION}"));
        }

        let body = serde_json::to_string_pretty(snapshot)?;
        fs::write(&path, body).map_err(|e| DiscoveryError::io(&path, e))?;
        set_owner_only(&path)?;
        tracing::info!(path = %path.display(), "wrote backup snapshot");
        Ok(path)
    }

    /// Snapshot files, newest first. A missing directory lists nothing.
    ///
    /// # Errors
    ///
    /// Fails when the directory exists but cannot be read.
    pub fn list(&self) -> Result<Vec<BackupEntry>, DiscoveryError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(DiscoveryError::io(&self.dir, error)),
        };
        let mut backups: Vec<BackupEntry> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                sort_key(&name)?;
                let size = entry.metadata().map(|m| m.len()).unwrap_or_default();
                Some(BackupEntry {
                    path: entry.path(),
                    name,
                    size,
                })
            })
            .collect();
        backups.sort_by(|a, b| sort_key(&b.name).cmp(&sort_key(&a.name)));
        Ok(backups)
    }

    /// Read a snapshot by file name (with or without `.json`) or by path.
    ///
    /// # Errors
    ///
    /// [`DiscoveryError::BackupNotFound`] when nothing matches; otherwise a
    /// read or decode failure.
    pub fn read(&self, name: &str) -> Result<Snapshot, DiscoveryError> {
        let path = self.resolve(name)?;
        let text = fs::read_to_string(&path).map_err(|e| DiscoveryError::io(&path, e))?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Newest snapshot, if any.
    ///
    /// # Errors
    ///
    /// Fails when listing or reading fails.
    pub fn latest(&self) -> Result<Option<(BackupEntry, Snapshot)>, DiscoveryError> {
        let Some(entry) = self.list()?.into_iter().next() else {
            return Ok(None);
        };
        let snapshot = self.read(&entry.name)?;
        Ok(Some((entry, snapshot)))
    }

    fn resolve(&self, name: &str) -> Result<PathBuf, DiscoveryError> {
        let candidates = [
            PathBuf::from(name),
            self.dir.join(name),
            self.dir.join(format!("{name}{EXTENSION}")),
        ];
        candidates
            .into_iter()
            .find(|path| path.is_file())
            .ok_or_else(|| DiscoveryError::BackupNotFound(name.to_string()))
    }
}

/// `(timestamp, counter)` for `backup-{timestamp}[-n].json`.
fn sort_key(name: &str) -> Option<(String, u32)> {
    let stem = name.strip_prefix(PREFIX)?.strip_suffix(EXTENSION)?;
    // `YYYY-MM-DD-HHMMSS` is 17 characters
    let (stamp, rest) = stem.split_at_checked(17)?;
    let counter = match rest.strip_prefix('-') {
        Some(n) => n.parse().ok()?,
        None if rest.is_empty() => 1,
        None => return None,
    };
    Some((stamp.to_string(), counter))
}

/// Copy `path` to `{path}.pre-rebuild-{stamp}` with owner-only permissions.
///
/// Returns `None` when `path` does not exist.
///
/// # Errors
///
/// Fails when the copy cannot be written.
pub fn copy_aside(path: &Path, stamp: &str) -> Result<Option<PathBuf>, DiscoveryError> {
    if !path.exists() {
        return Ok(None);
    }
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".pre-rebuild-{stamp}"));
    let target = PathBuf::from(name);
    fs::copy(path, &target).map_err(|e| DiscoveryError::io(&target, e))?;
    set_owner_only(&target)?;
    Ok(Some(target))
}

#[cfg(unix)]
fn set_owner_only(path: &Path) -> Result<(), DiscoveryError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .map_err(|e| DiscoveryError::io(path, e))
}

#[cfg(not(unix))]
fn set_owner_only(_path: &Path) -> Result<(), DiscoveryError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn snapshot(at: DateTime<Utc>) -> Snapshot {
        Snapshot {
            timestamp: at,
            old_config: None,
            scan_result: ScanResult::empty(at),
            ssh_config_path: PathBuf::from("/h/.ssh/config"),
            recommended_mapping: RecommendedMapping::default(),
        }
    }

    #[test]
    fn same_second_snapshots_get_unique_names() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let store = BackupStore::new(tmp.path().join("backups"));
        let at = Utc.with_ymd_and_hms(2026, 5, 1, 9, 30, 5).unwrap();

        let first = store.write(&snapshot(at)).expect("first");
        let second = store.write(&snapshot(at)).expect("second");
        assert!(first.ends_with("backup-2026-05-01-093005.json"));
        assert!(second.ends_with("backup-2026-05-01-093005-2.json"));

        let earlier = Utc.with_ymd_and_hms(2026, 4, 30, 23, 0, 0).unwrap();
        store.write(&snapshot(earlier)).expect("earlier");

        let names: Vec<String> = store.list().expect("list").into_iter().map(|e| e.name).collect();
        assert_eq!(
            names,
            vec![
                "backup-2026-05-01-093005-2.json".to_string(),
                "backup-2026-05-01-093005.json".to_string(),
                "backup-2026-04-30-230000.json".to_string(),
            ]
        );
    }

    #[test]
    fn read_by_stem_and_latest() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let store = BackupStore::new(tmp.path());
        let at = Utc.with_ymd_and_hms(2026, 5, 1, 9, 30, 5).unwrap();
        store.write(&snapshot(at)).expect("write");

        let read = store.read("backup-2026-05-01-093005").expect("read");
        assert_eq!(read, snapshot(at));
        let (entry, latest) = store.latest().expect("latest").expect("some");
        assert_eq!(entry.name, "backup-2026-05-01-093005.json");
        assert_eq!(latest.timestamp, at);

        assert!(matches!(
            store.read("backup-1999-01-01-000000"),
            Err(DiscoveryError::BackupNotFound(_))
        ));
    }

    #[test]
    fn foreign_files_are_not_listed() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        fs::write(tmp.path().join("notes.txt"), "x").expect("write");
        fs::write(tmp.path().join("backup-latest.json"), "{}").expect("write");
        assert!(BackupStore::new(tmp.path()).list().expect("list").is_empty());
    }

    #[test]
    fn copy_aside_skips_missing_files() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let config = tmp.path().join("config");
        assert!(copy_aside(&config, "2026-05-01-093005").expect("copy").is_none());
        fs::write(&config, "Host x\n").expect("write");
        let copy = copy_aside(&config, "2026-05-01-093005").expect("copy").expect("some");
        assert_eq!(fs::read_to_string(copy).expect("read"), "Host x\n");
    }
}
