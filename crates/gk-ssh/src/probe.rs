//! Non-interactive `ssh -T` connectivity probe.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::SshError;
use crate::process;

/// What a probe saw. `authenticated` is decided by greeting substrings,
/// not by exit status: hosts that refuse shell access still exit non-zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub authenticated: bool,
    pub output: String,
}

#[async_trait]
pub trait HostProbe: Send + Sync {
    /// Authenticate as `git@{host}` with only `identity`.
    ///
    /// # Errors
    ///
    /// Fails when `ssh` cannot be started or the probe times out.
    async fn probe(
        &self,
        host: &str,
        identity: &Path,
        greetings: &[&str],
    ) -> Result<ProbeOutcome, SshError>;
}

/// [`HostProbe`] over the system `ssh` client.
#[derive(Debug, Clone, Copy)]
pub struct SshProbe {
    pub timeout: Duration,
}

impl SshProbe {
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl HostProbe for SshProbe {
    async fn probe(
        &self,
        host: &str,
        identity: &Path,
        greetings: &[&str],
    ) -> Result<ProbeOutcome, SshError> {
        let identity = identity.to_string_lossy();
        let target = format!("git@{host}");
        let connect_timeout = format!("ConnectTimeout={}", self.timeout.as_secs().max(1));
        let args = [
            "-T",
            "-o",
            "BatchMode=yes",
            "-o",
            "StrictHostKeyChecking=accept-new",
            "-o",
            connect_timeout.as_str(),
            "-o",
            "IdentitiesOnly=yes",
            "-i",
            identity.as_ref(),
            target.as_str(),
        ];
        let output = process::run("ssh", &args, Some(self.timeout)).await?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        let authenticated = recognizes(&text, greetings);
        tracing::debug!(host, authenticated, status = %output.status, "ssh probe finished");
        Ok(ProbeOutcome {
            authenticated,
            output: text.trim().to_string(),
        })
    }
}

/// Whether `output` carries any of the platform's greetings.
#[must_use]
pub fn recognizes(output: &str, greetings: &[&str]) -> bool {
    greetings.iter().any(|greeting| output.contains(greeting))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gk_core::PlatformKind;
    use rstest::rstest;

    #[rstest]
    #[case(
        PlatformKind::GitHub,
        "Hi octo! You've successfully authenticated, but GitHub does not provide shell access.",
        true
    )]
    #[case(PlatformKind::GitLab, "Welcome to GitLab, @octo!", true)]
    #[case(PlatformKind::GitHub, "git@github.com: Permission denied (publickey).", false)]
    #[case(PlatformKind::GitLab, "Hi octo!", false)]
    fn greetings_decide_authentication(
        #[case] kind: PlatformKind,
        #[case] output: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(recognizes(output, kind.greetings()), expected);
    }
}
