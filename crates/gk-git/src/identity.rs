//! `[user]` identity and `[includeIf "gitdir:..."]` stanzas of git config files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use gk_core::scan::GitIdentity;
use regex::Regex;

use crate::error::GitError;

static INCLUDE_IF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[includeIf "gitdir:([^"]+)"\]\s+path\s*=\s*(.+)"#)
        .expect("includeIf regex is valid")
});

/// `user.name` and `user.email` from config text. Later values win, as in git.
#[must_use]
pub fn parse_identity(text: &str) -> GitIdentity {
    let mut identity = GitIdentity::default();
    let mut in_user = false;
    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if line.starts_with('[') {
            in_user = line
                .trim_start_matches('[')
                .trim_end_matches(']')
                .trim()
                .eq_ignore_ascii_case("user");
            continue;
        }
        if !in_user {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"').to_string();
        match key.trim().to_ascii_lowercase().as_str() {
            "name" => identity.name = Some(value),
            "email" => identity.email = Some(value),
            _ => {}
        }
    }
    identity
}

/// Identity of a config file; a missing file has no identity.
///
/// # Errors
///
/// Fails when the file exists but cannot be read.
pub fn read_identity(path: &Path) -> Result<GitIdentity, GitError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(parse_identity(&text)),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(GitIdentity::default()),
        Err(error) => Err(GitError::io(path, error)),
    }
}

/// `(condition, path)` for each conditional include, in file order.
///
/// `~` in the include path is expanded against `home`; the condition is
/// returned as written.
#[must_use]
pub fn parse_includes(text: &str, home: &Path) -> Vec<(String, PathBuf)> {
    INCLUDE_IF
        .captures_iter(text)
        .map(|caps| {
            let condition = caps[1].trim().to_string();
            let path = expand_home(caps[2].trim().trim_matches('"'), home);
            (condition, path)
        })
        .collect()
}

/// `~` / `~/x` against `home`; anything else unchanged.
#[must_use]
pub fn expand_home(path: &str, home: &Path) -> PathBuf {
    if path == "~" {
        home.to_path_buf()
    } else if let Some(rest) = path.strip_prefix("~/") {
        home.join(rest)
    } else {
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const GLOBAL: &str = r#"
[core]
    editor = vim
[user]
    name = Octo Cat
    email = "octo@example.com"

[includeIf "gitdir:~/work/"]
    path = ~/.gitconfig-work
[includeIf "gitdir:/srv/oss/"]
	path = /etc/git/oss.inc
"#;

    #[test]
    fn user_section_only() {
        let identity = parse_identity(GLOBAL);
        assert_eq!(identity.name(), Some("Octo Cat"));
        assert_eq!(identity.email(), Some("octo@example.com"));

        let other = parse_identity("[core]\n  name = not-a-user\n");
        assert_eq!(other, GitIdentity::default());
    }

    #[test]
    fn includes_in_file_order_with_home_expansion() {
        let includes = parse_includes(GLOBAL, Path::new("/home/dev"));
        assert_eq!(
            includes,
            vec![
                ("~/work/".to_string(), PathBuf::from("/home/dev/.gitconfig-work")),
                ("/srv/oss/".to_string(), PathBuf::from("/etc/git/oss.inc")),
            ]
        );
    }

    #[test]
    fn missing_file_has_no_identity() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let identity = read_identity(&tmp.path().join("absent")).expect("read");
        assert!(identity.email().is_none());
    }
}
