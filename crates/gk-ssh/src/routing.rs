//! SSH routing file: host parsing and marker-delimited managed blocks.
//!
//! Everything outside a managed block belongs to the user and is written
//! back byte-for-byte. A begin marker with no matching end marker is left
//! alone.

use std::fs;
use std::path::{Path, PathBuf};

use gk_core::scan::SshConfigHost;

use crate::error::SshError;
use crate::keys::set_mode;

pub const BLOCK_BEGIN: &str = "# BEGIN git-keys managed block - ";
pub const BLOCK_END: &str = "# END git-keys managed block";

/// One `Host` stanza inside a managed block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingEntry {
    pub alias: String,
    pub hostname: String,
    pub user: String,
    pub identity_file: PathBuf,
    /// Additional `Key value` options, written in order.
    pub extra: Vec<(String, String)>,
}

// ---------------------------------------------------------------------------
// Managed blocks (pure text)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
struct BlockSpan {
    id: String,
    start: usize,
    end: usize,
}

fn block_spans(lines: &[&str]) -> Vec<BlockSpan> {
    let mut spans = Vec::new();
    let mut open: Option<(String, usize)> = None;
    for (index, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if let Some(id) = trimmed.strip_prefix(BLOCK_BEGIN) {
            open = Some((id.trim().to_string(), index));
        } else if trimmed == BLOCK_END
            && let Some((id, start)) = open.take()
        {
            spans.push(BlockSpan {
                id,
                start,
                end: index,
            });
        }
    }
    spans
}

/// Render a managed block, markers included, without a trailing newline.
#[must_use]
pub fn render_block(id: &str, entries: &[RoutingEntry]) -> String {
    let mut out = vec![format!("{BLOCK_BEGIN}{id}")];
    for entry in entries {
        out.push(format!("Host {}", entry.alias));
        out.push(format!("    HostName {}", entry.hostname));
        out.push(format!("    User {}", entry.user));
        out.push(format!("    IdentityFile {}", entry.identity_file.display()));
        for (key, value) in &entry.extra {
            out.push(format!("    {key} {value}"));
        }
    }
    out.push(BLOCK_END.to_string());
    out.join("\n")
}

/// Ids of every complete managed block, in file order.
#[must_use]
pub fn managed_block_ids(text: &str) -> Vec<String> {
    let lines: Vec<&str> = text.lines().collect();
    block_spans(&lines).into_iter().map(|span| span.id).collect()
}

/// Replace block `id` in place, or append it when absent.
#[must_use]
pub fn upsert_block(text: &str, id: &str, entries: &[RoutingEntry]) -> String {
    let rendered = render_block(id, entries);
    let lines: Vec<&str> = text.lines().collect();

    if let Some(span) = block_spans(&lines).into_iter().find(|span| span.id == id) {
        let mut out: Vec<&str> = lines[..span.start].to_vec();
        out.extend(rendered.lines());
        out.extend(&lines[span.end + 1..]);
        return join_lines(&out);
    }

    let mut out = text.trim_end_matches('\n').to_string();
    if !out.is_empty() {
        out.push_str("\n\n");
    }
    out.push_str(&rendered);
    out.push('\n');
    out
}

/// Drop every block whose id satisfies `pred`, with one trailing blank line.
///
/// Returns the new text and the number of blocks removed.
#[must_use]
pub fn remove_blocks(text: &str, pred: impl Fn(&str) -> bool) -> (String, usize) {
    let lines: Vec<&str> = text.lines().collect();
    let doomed: Vec<BlockSpan> = block_spans(&lines)
        .into_iter()
        .filter(|span| pred(&span.id))
        .collect();
    if doomed.is_empty() {
        return (text.to_string(), 0);
    }

    let mut keep = vec![true; lines.len()];
    for span in &doomed {
        for flag in &mut keep[span.start..=span.end] {
            *flag = false;
        }
        if let Some(next) = lines.get(span.end + 1)
            && next.trim().is_empty()
        {
            keep[span.end + 1] = false;
        }
    }

    let out: Vec<&str> = lines
        .iter()
        .zip(keep)
        .filter_map(|(line, keep)| keep.then_some(*line))
        .collect();
    (join_lines(&out), doomed.len())
}

fn join_lines(lines: &[&str]) -> String {
    if lines.is_empty() {
        return String::new();
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

// ---------------------------------------------------------------------------
// Host parsing
// ---------------------------------------------------------------------------

#[derive(Default)]
struct PendingHost {
    patterns: Vec<String>,
    hostname: Option<String>,
    user: Option<String>,
    identity_file: Option<String>,
}

impl PendingHost {
    fn finish(self, home: &Path) -> Option<SshConfigHost> {
        let identity = self.identity_file?;
        let alias = self
            .patterns
            .into_iter()
            .find(|p| !p.contains(['*', '?']) && !p.starts_with('!'))?;
        Some(SshConfigHost {
            hostname: self.hostname.unwrap_or_else(|| alias.clone()),
            alias,
            user: self.user,
            identity_file: expand_home(&identity, home),
        })
    }
}

/// `Host` entries that name an identity file; wildcard-only entries are skipped.
#[must_use]
pub fn parse_hosts(text: &str, home: &Path) -> Vec<SshConfigHost> {
    let mut hosts = Vec::new();
    let mut current: Option<PendingHost> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((keyword, value)) = split_option(line) else {
            continue;
        };
        match keyword.to_ascii_lowercase().as_str() {
            "host" => {
                if let Some(done) = current.take().and_then(|h| h.finish(home)) {
                    hosts.push(done);
                }
                current = Some(PendingHost {
                    patterns: value.split_whitespace().map(str::to_string).collect(),
                    ..PendingHost::default()
                });
            }
            "match" => {
                if let Some(done) = current.take().and_then(|h| h.finish(home)) {
                    hosts.push(done);
                }
            }
            "hostname" => {
                if let Some(host) = current.as_mut() {
                    host.hostname.get_or_insert_with(|| value.to_string());
                }
            }
            "user" => {
                if let Some(host) = current.as_mut() {
                    host.user.get_or_insert_with(|| value.to_string());
                }
            }
            "identityfile" => {
                if let Some(host) = current.as_mut() {
                    host.identity_file.get_or_insert_with(|| value.to_string());
                }
            }
            _ => {}
        }
    }
    if let Some(done) = current.and_then(|h| h.finish(home)) {
        hosts.push(done);
    }
    hosts
}

/// Split `Keyword value`, `Keyword=value`, or `Keyword = "value"`.
fn split_option(line: &str) -> Option<(&str, &str)> {
    let split_at = line.find(|c: char| c.is_whitespace() || c == '=')?;
    let (keyword, rest) = line.split_at(split_at);
    let value = rest
        .trim_start_matches(|c: char| c.is_whitespace() || c == '=')
        .trim()
        .trim_matches('"');
    (!value.is_empty()).then_some((keyword, value))
}

fn expand_home(path: &str, home: &Path) -> PathBuf {
    if path == "~" {
        home.to_path_buf()
    } else if let Some(rest) = path.strip_prefix("~/") {
        home.join(rest)
    } else {
        PathBuf::from(path)
    }
}

// ---------------------------------------------------------------------------
// RoutingFile
// ---------------------------------------------------------------------------

/// Routing-config collaborator over one file.
#[derive(Debug, Clone)]
pub struct RoutingFile {
    path: PathBuf,
}

impl RoutingFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File contents; a missing file reads as empty.
    ///
    /// # Errors
    ///
    /// Fails when the file exists but cannot be read.
    pub fn read(&self) -> Result<String, SshError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(text),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(error) => Err(SshError::io(&self.path, error)),
        }
    }

    fn write(&self, text: &str) -> Result<(), SshError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| SshError::io(parent, e))?;
            set_mode(parent, 0o700)?;
        }
        fs::write(&self.path, text).map_err(|e| SshError::io(&self.path, e))?;
        set_mode(&self.path, 0o600)
    }

    /// Replace (or append) managed block `id`.
    ///
    /// # Errors
    ///
    /// Fails on read or write errors.
    pub fn upsert(&self, id: &str, entries: &[RoutingEntry]) -> Result<(), SshError> {
        let text = self.read()?;
        self.write(&upsert_block(&text, id, entries))?;
        tracing::info!(path = %self.path.display(), block = id, "updated routing block");
        Ok(())
    }

    /// Remove managed block `id`; returns whether it existed.
    ///
    /// # Errors
    ///
    /// Fails on read or write errors.
    pub fn remove_block(&self, id: &str) -> Result<bool, SshError> {
        let text = self.read()?;
        let (out, removed) = remove_blocks(&text, |candidate| candidate == id);
        if removed > 0 {
            self.write(&out)?;
        }
        Ok(removed > 0)
    }

    /// Remove every managed block; returns how many were removed.
    ///
    /// # Errors
    ///
    /// Fails on read or write errors.
    pub fn remove_all_managed_blocks(&self) -> Result<usize, SshError> {
        let text = self.read()?;
        let (out, removed) = remove_blocks(&text, |_| true);
        if removed > 0 {
            self.write(&out)?;
            tracing::info!(path = %self.path.display(), removed, "removed managed routing blocks");
        }
        Ok(removed)
    }

    /// Copy the file to `{path}.{suffix}`; `None` when there is nothing to copy.
    ///
    /// # Errors
    ///
    /// Fails when the copy cannot be written.
    pub fn backup(&self, suffix: &str) -> Result<Option<PathBuf>, SshError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let mut name = self.path.as_os_str().to_os_string();
        name.push(format!(".{suffix}"));
        let target = PathBuf::from(name);
        fs::copy(&self.path, &target).map_err(|e| SshError::io(&target, e))?;
        Ok(Some(target))
    }

    /// Parsed host entries; a missing file yields none.
    ///
    /// # Errors
    ///
    /// Fails when the file exists but cannot be read.
    pub fn hosts(&self, home: &Path) -> Result<Vec<SshConfigHost>, SshError> {
        Ok(parse_hosts(&self.read()?, home))
    }
}
