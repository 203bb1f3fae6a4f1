//! Lifecycle error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Ssh(#[from] gk_ssh::SshError),

    #[error(transparent)]
    Platform(#[from] gk_platform::PlatformError),

    #[error(transparent)]
    Auth(#[from] gk_auth::AuthError),

    #[error(transparent)]
    Git(#[from] gk_git::GitError),

    #[error(transparent)]
    Config(#[from] gk_config::ConfigError),

    /// Revocation by a fingerprint no declared key carries.
    #[error("no key found with fingerprint {0}")]
    FingerprintNotFound(String),

    #[error("no persona named '{0}' in the declared config")]
    PersonaNotFound(String),

    /// A saga was invoked without `--persona`, `--platform`, or `--all`.
    #[error("nothing selected: pass a persona, a platform, or --all")]
    EmptySelection,
}
