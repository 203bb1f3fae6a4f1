//! Repository walk and remote URL classification.

use std::path::{Path, PathBuf};

use gk_core::PlatformKind;
use ignore::WalkBuilder;
use gk_core::scan::DiscoveredPlatform;

use crate::error::GitError;

/// Directories below the include root that are still searched for repositories.
pub const MAX_WALK_DEPTH: usize = 2;

/// What a single remote URL says about its platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteInfo {
    pub kind: PlatformKind,
    pub base_url: Option<String>,
    /// First path segment (user, org, or group); may be empty.
    pub group: String,
}

/// Classify `git@host:group/repo`, `ssh://[user@]host[:port]/group/repo`,
/// and `http(s)://host/group/repo` remotes.
///
/// Persona-routed aliases (`github.com.work`) classify as their canonical host.
#[must_use]
pub fn classify_remote(url: &str) -> Option<RemoteInfo> {
    let url = url.trim();
    let (host, path) = if let Some(rest) = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .or_else(|| url.strip_prefix("ssh://"))
    {
        let rest = rest.split_once('@').map_or(rest, |(_, rest)| rest);
        let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));
        let host = authority.split(':').next().unwrap_or(authority);
        (host, path)
    } else if let Some((user_host, path)) = url.split_once(':') {
        // scp-like: [user@]host:path
        if user_host.contains('/') {
            return None;
        }
        let host = user_host.split_once('@').map_or(user_host, |(_, host)| host);
        (host, path)
    } else {
        return None;
    };

    if host.is_empty() {
        return None;
    }
    let kind = PlatformKind::classify_host(host)?;
    let canonical = kind.spec().canonical_host;
    let host = if host.starts_with(&format!("{canonical}.")) {
        canonical
    } else {
        host
    };
    let base_url = match kind {
        PlatformKind::GitHub => None,
        PlatformKind::GitLab => kind.base_url_for_host(host),
    };
    let group = path
        .trim_start_matches('/')
        .split('/')
        .next()
        .unwrap_or_default()
        .to_string();
    Some(RemoteInfo {
        kind,
        base_url,
        group,
    })
}

/// Remote URLs of the repository at `dir`, read without global config.
///
/// # Errors
///
/// Fails when `dir` cannot be opened as a repository.
pub fn remote_urls(dir: &Path) -> Result<Vec<String>, GitError> {
    let repo = gix::open_opts(dir, gix::open::Options::isolated())
        .map_err(|_| GitError::NotGitRepo(dir.to_path_buf()))?;
    let mut urls = Vec::new();
    for name in repo.remote_names() {
        let remote = match repo.find_remote(name.as_ref()) {
            Ok(remote) => remote,
            Err(error) => {
                tracing::debug!(dir = %dir.display(), %error, "skipping unreadable remote");
                continue;
            }
        };
        if let Some(url) = remote.url(gix::remote::Direction::Fetch) {
            urls.push(url.to_bstring().to_string());
        }
    }
    Ok(urls)
}

/// Repository work trees under `root`, at most [`MAX_WALK_DEPTH`] levels down.
///
/// Hidden and ignored directories are walked too; only `.git` itself is skipped.
#[must_use]
pub fn find_repositories(root: &Path) -> Vec<PathBuf> {
    let walker = WalkBuilder::new(root)
        .max_depth(Some(MAX_WALK_DEPTH))
        .standard_filters(false)
        .hidden(false)
        .git_ignore(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(|entry| entry.file_name() != ".git")
        .build();

    walker
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(error) => {
                tracing::debug!(root = %root.display(), %error, "unreadable entry skipped");
                None
            }
        })
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_dir()))
        .filter(|entry| entry.path().join(".git").exists())
        .map(ignore::DirEntry::into_path)
        .collect()
}

/// Platforms used by the repositories under `root`, deduplicated by
/// `(kind, base_url)` in first-seen order.
///
/// Each repository counts once per platform no matter how many remotes
/// point there.
#[must_use]
pub fn discover_platforms(root: &Path) -> Vec<DiscoveredPlatform> {
    let mut platforms: Vec<DiscoveredPlatform> = Vec::new();
    for repo in find_repositories(root) {
        let urls = match remote_urls(&repo) {
            Ok(urls) => urls,
            Err(error) => {
                tracing::debug!(repo = %repo.display(), %error, "skipping repository");
                continue;
            }
        };
        let mut counted: Vec<(PlatformKind, Option<String>)> = Vec::new();
        for info in urls.iter().filter_map(|url| classify_remote(url)) {
            let index = platforms
                .iter()
                .position(|p| p.kind == info.kind && p.base_url == info.base_url)
                .unwrap_or_else(|| {
                    platforms.push(DiscoveredPlatform {
                        kind: info.kind,
                        base_url: info.base_url.clone(),
                        repo_count: 0,
                        groups: Vec::new(),
                    });
                    platforms.len() - 1
                });
            let platform = &mut platforms[index];
            let identity = (info.kind, info.base_url.clone());
            if !counted.contains(&identity) {
                platform.repo_count += 1;
                counted.push(identity);
            }
            if !info.group.is_empty() && !platform.groups.contains(&info.group) {
                platform.groups.push(info.group);
            }
        }
    }
    platforms
}

/// Filesystem root named by an include condition (`~/work/`, `~/work/**`).
#[must_use]
pub fn condition_root(condition: &str, home: &Path) -> PathBuf {
    let trimmed = condition
        .trim()
        .trim_start_matches("gitdir:")
        .trim_end_matches("**")
        .trim_end_matches('/');
    if trimmed.is_empty() || trimmed == "~" {
        return home.to_path_buf();
    }
    crate::identity::expand_home(trimmed, home)
}
