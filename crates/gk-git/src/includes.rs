//! Managed conditional includes in the global git config and the
//! per-persona identity files they point at.

use std::fs;
use std::path::{Path, PathBuf};

use gk_core::naming::sanitize_persona;
use gk_core::{Persona, Platform};

use crate::error::GitError;

pub const INCLUDES_BEGIN: &str = "# BEGIN git-keys managed conditional includes";
pub const INCLUDES_END: &str = "# END git-keys managed conditional includes";

/// One `[includeIf "gitdir:..."]` stanza to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeEntry {
    pub git_dir: String,
    pub path: PathBuf,
}

/// `.gitconfig-{persona}-{platform}-{account}`
#[must_use]
pub fn identity_file_name(persona: &Persona, platform: &Platform) -> String {
    format!(
        ".gitconfig-{}-{}-{}",
        sanitize_persona(&persona.name),
        platform.kind,
        platform.account
    )
}

/// Directory patterns always end in `/` so git matches the whole tree.
#[must_use]
pub fn normalize_git_dir(pattern: &str) -> String {
    let trimmed = pattern.trim();
    if trimmed.ends_with('/') || trimmed.ends_with("**") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    }
}

/// Identity file body: `[user]` plus URL rewrites onto the persona's routed host.
#[must_use]
pub fn render_identity_file(persona: &Persona, platform: &Platform) -> String {
    let host = platform.ssh_host();
    let routed = gk_core::naming::host_alias(&host, &persona.name);
    format!(
        "# Git configuration for {name} <{email}>\n\
         # Platform: {kind}/{account}\n\
         # Managed by git-keys\n\
         \n\
         [user]\n\
         \tname = {name}\n\
         \temail = {email}\n\
         \n\
         [url \"git@{routed}:\"]\n\
         \tinsteadOf = git@{host}:\n\
         \tinsteadOf = https://{host}/\n",
        name = persona.name,
        email = persona.email,
        kind = platform.kind,
        account = platform.account,
    )
}

fn render_includes(entries: &[IncludeEntry]) -> String {
    let mut out = String::from(INCLUDES_BEGIN);
    out.push('\n');
    for entry in entries {
        out.push_str(&format!(
            "[includeIf \"gitdir:{}\"]\n\tpath = {}\n",
            entry.git_dir,
            entry.path.display()
        ));
    }
    out.push_str(INCLUDES_END);
    out.push('\n');
    out
}

fn managed_span(text: &str) -> Option<(usize, usize)> {
    let start = text.find(INCLUDES_BEGIN)?;
    let end = text[start..].find(INCLUDES_END)? + start + INCLUDES_END.len();
    Some((start, end))
}

/// Replace the managed includes block, or append one.
#[must_use]
pub fn upsert_includes(text: &str, entries: &[IncludeEntry]) -> String {
    let block = render_includes(entries);
    match managed_span(text) {
        Some((start, end)) => {
            let before = text[..start].trim_end_matches('\n');
            let after = text[end..].trim_start_matches('\n');
            let mut out = String::new();
            if !before.is_empty() {
                out.push_str(before);
                out.push_str("\n\n");
            }
            out.push_str(&block);
            out.push_str(after);
            out
        }
        None => {
            let before = text.trim_end_matches('\n');
            if before.is_empty() {
                block
            } else {
                format!("{before}\n\n{block}")
            }
        }
    }
}

/// Drop the managed includes block; `None` when there is none.
#[must_use]
pub fn remove_includes(text: &str) -> Option<String> {
    let (start, end) = managed_span(text)?;
    let before = text[..start].trim_end_matches('\n');
    let after = text[end..].trim_start_matches('\n');
    let mut out = before.to_string();
    if !out.is_empty() {
        out.push('\n');
    }
    out.push_str(after);
    Some(out)
}

/// The global git config file and the identity files beside it.
#[derive(Debug, Clone)]
pub struct GitConfigFile {
    path: PathBuf,
}

impl GitConfigFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<String, GitError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(text),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(error) => Err(GitError::io(&self.path, error)),
        }
    }

    /// Copy to `{path}.backup-git-keys` when the file exists.
    ///
    /// # Errors
    ///
    /// Fails when the copy cannot be written.
    pub fn backup(&self) -> Result<Option<PathBuf>, GitError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".backup-git-keys");
        let target = PathBuf::from(name);
        fs::copy(&self.path, &target).map_err(|e| GitError::io(&target, e))?;
        Ok(Some(target))
    }

    /// Write `body` to `dir/name`; returns the written path.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be written.
    pub fn write_identity_file(dir: &Path, name: &str, body: &str) -> Result<PathBuf, GitError> {
        let target = dir.join(name);
        fs::write(&target, body).map_err(|e| GitError::io(&target, e))?;
        tracing::debug!(path = %target.display(), "wrote identity file");
        Ok(target)
    }

    /// Replace the managed includes block.
    ///
    /// # Errors
    ///
    /// Fails on read or write errors.
    pub fn apply_includes(&self, entries: &[IncludeEntry]) -> Result<(), GitError> {
        let text = self.read()?;
        fs::write(&self.path, upsert_includes(&text, entries))
            .map_err(|e| GitError::io(&self.path, e))?;
        tracing::info!(path = %self.path.display(), count = entries.len(), "updated conditional includes");
        Ok(())
    }

    /// Remove the managed includes block; returns whether one existed.
    ///
    /// # Errors
    ///
    /// Fails on read or write errors.
    pub fn remove_includes(&self) -> Result<bool, GitError> {
        let text = self.read()?;
        let Some(out) = remove_includes(&text) else {
            return Ok(false);
        };
        fs::write(&self.path, out).map_err(|e| GitError::io(&self.path, e))?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gk_core::PlatformKind;
    use pretty_assertions::assert_eq;

    fn persona() -> Persona {
        Persona {
            name: "work".into(),
            email: "dev@acme.io".into(),
            platforms: vec![Platform::new(
                PlatformKind::GitLab,
                "dev".into(),
                Some("https://gitlab.acme.io".into()),
            )],
        }
    }

    #[test]
    fn identity_file_rewrites_to_routed_host() {
        let persona = persona();
        let body = render_identity_file(&persona, &persona.platforms[0]);
        assert!(body.contains("\temail = dev@acme.io\n"));
        assert!(body.contains("[url \"git@gitlab.acme.io.work:\"]"));
        assert!(body.contains("\tinsteadOf = https://gitlab.acme.io/\n"));
        assert_eq!(
            identity_file_name(&persona, &persona.platforms[0]),
            ".gitconfig-work-gitlab-dev"
        );
    }

    #[test]
    fn includes_block_replaced_and_removed() {
        let user = "[user]\n\tname = Octo\n";
        let entries = vec![IncludeEntry {
            git_dir: normalize_git_dir("~/work"),
            path: PathBuf::from("/home/dev/.gitconfig-work-github-octo"),
        }];
        let once = upsert_includes(user, &entries);
        assert!(once.starts_with(user));
        assert!(once.contains("[includeIf \"gitdir:~/work/\"]\n\tpath = /home/dev/.gitconfig-work-github-octo\n"));

        let twice = upsert_includes(&once, &entries);
        assert_eq!(twice, once);

        let removed = remove_includes(&twice).expect("block present");
        assert_eq!(removed, user);
        assert!(remove_includes(user).is_none());
    }

    #[test]
    fn written_includes_are_rediscovered() {
        let entries = vec![IncludeEntry {
            git_dir: "~/oss/".into(),
            path: PathBuf::from("/h/.gitconfig-oss"),
        }];
        let text = upsert_includes("", &entries);
        let found = crate::identity::parse_includes(&text, Path::new("/h"));
        assert_eq!(found, vec![("~/oss/".to_string(), PathBuf::from("/h/.gitconfig-oss"))]);
    }
}
