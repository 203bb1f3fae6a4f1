//! SSH tooling error types.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SshError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The program could not be started (not installed, not executable).
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    /// The program ran and exited unsuccessfully.
    #[error("{program} exited with {status}: {stderr}")]
    Command {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("{program} timed out after {secs}s")]
    Timeout { program: String, secs: u64 },

    /// No SSH agent is reachable.
    #[error("no SSH agent is running")]
    AgentUnavailable,

    /// Refusing to overwrite an existing key file.
    #[error("key file already exists: {}", .0.display())]
    KeyExists(PathBuf),

    #[error("invalid public key: {0}")]
    KeyFormat(#[from] ssh_key::Error),

    #[error("parse error: {0}")]
    Parse(String),
}

impl SshError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
