//! Cross-cutting error types for git-keys.
//!
//! Domain-specific errors (`SshError`, `PlatformError`, ...) live in their
//! respective crates. They converge into `anyhow` in `gk-cli`.

use thiserror::Error;

/// Errors that can be raised by any git-keys crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity lookup returned no result.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The declared model failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A platform name outside the supported set.
    #[error("unknown platform '{0}' (expected github or gitlab)")]
    UnknownPlatform(String),

    /// A key algorithm outside the supported set.
    #[error("unknown key type '{0}' (expected ed25519 or rsa)")]
    UnknownKeyType(String),
}
