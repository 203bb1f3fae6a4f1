//! Subprocess helper shared by the `ssh-keygen`, `ssh-add`, and `ssh` wrappers.

use std::process::Output;
use std::time::Duration;

use tokio::process::Command as TokioCommand;
use tokio::time::timeout;

use crate::error::SshError;

/// Run `program` to completion and capture its output, optionally bounded.
///
/// Non-zero exit is not an error here; callers interpret the status.
pub async fn run(
    program: &str,
    args: &[&str],
    limit: Option<Duration>,
) -> Result<Output, SshError> {
    let mut command = TokioCommand::new(program);
    command.args(args).kill_on_drop(true);
    let spawn_error = |source| SshError::Spawn {
        program: program.to_string(),
        source,
    };

    match limit {
        Some(limit) => timeout(limit, command.output())
            .await
            .map_err(|_| SshError::Timeout {
                program: program.to_string(),
                secs: limit.as_secs(),
            })?
            .map_err(spawn_error),
        None => command.output().await.map_err(spawn_error),
    }
}

/// Like [`run`], but a non-zero exit becomes [`SshError::Command`].
pub async fn run_checked(program: &str, args: &[&str]) -> Result<Output, SshError> {
    let output = run(program, args, None).await?;
    if output.status.success() {
        Ok(output)
    } else {
        Err(SshError::Command {
            program: program.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}
