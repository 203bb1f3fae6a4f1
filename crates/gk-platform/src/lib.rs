//! # gk-platform
//!
//! SSH-key API clients for git-hosting platforms.
//!
//! Every platform exposes the same contract through [`PlatformApi`]:
//! list, add, delete, and fetch the authenticated user's SSH keys. Clients
//! are built through a [`PlatformConnector`] so sagas can be exercised
//! against in-memory fakes.
//! - GitHub (`api.github.com`, or `{base}/api/v3` for Enterprise Server)
//! - GitLab (`gitlab.com`, or any self-hosted `{base}/api/v4`)

pub mod github;
pub mod gitlab;

mod error;
mod http;

pub use error::PlatformError;

use async_trait::async_trait;
use gk_core::PlatformKind;
use serde::{Deserialize, Serialize};

// ── Types ──────────────────────────────────────────────────────────

/// A public key registered on a platform account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteKey {
    pub id: String,
    pub title: String,
    /// OpenSSH public key line (`ssh-ed25519 AAAA...`), usually without comment.
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Platform-API collaborator: one instance per (platform, token).
#[async_trait]
pub trait PlatformApi: Send + Sync {
    fn kind(&self) -> PlatformKind;

    /// # Errors
    ///
    /// Returns [`PlatformError`] on transport, auth, or parse failure.
    async fn list_keys(&self) -> Result<Vec<RemoteKey>, PlatformError>;

    /// Register a public key and return its remote id.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] on transport, auth, or validation failure.
    async fn add_key(&self, title: &str, public_key: &str) -> Result<String, PlatformError>;

    /// # Errors
    ///
    /// Returns [`PlatformError::NotFound`] when the id is unknown.
    async fn delete_key(&self, id: &str) -> Result<(), PlatformError>;

    /// # Errors
    ///
    /// Returns [`PlatformError::NotFound`] when the id is unknown.
    async fn get_key(&self, id: &str) -> Result<RemoteKey, PlatformError>;
}

/// Builds [`PlatformApi`] clients.
pub trait PlatformConnector: Send + Sync {
    /// # Errors
    ///
    /// Returns [`PlatformError`] when the client cannot be constructed.
    fn connect(
        &self,
        kind: PlatformKind,
        base_url: Option<&str>,
        token: &str,
    ) -> Result<Box<dyn PlatformApi>, PlatformError>;
}

// ── Client ─────────────────────────────────────────────────────────

type Constructor = fn(reqwest::Client, Option<&str>, &str) -> Box<dyn PlatformApi>;

/// Client constructor per platform.
const CONSTRUCTORS: [(PlatformKind, Constructor); 2] = [
    (PlatformKind::GitHub, github::GitHubClient::boxed),
    (PlatformKind::GitLab, gitlab::GitLabClient::boxed),
];

/// Connector that talks to the real platforms over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    http: reqwest::Client,
}

impl HttpConnector {
    /// Create a connector with a shared HTTP client.
    ///
    /// Requests carry no client-side deadline.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Http`] if the client cannot be built.
    pub fn new() -> Result<Self, PlatformError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("git-keys/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http })
    }
}

impl PlatformConnector for HttpConnector {
    fn connect(
        &self,
        kind: PlatformKind,
        base_url: Option<&str>,
        token: &str,
    ) -> Result<Box<dyn PlatformApi>, PlatformError> {
        let base_url = base_url.map(str::trim).filter(|b| !b.is_empty());
        CONSTRUCTORS
            .iter()
            .find(|(candidate, _)| *candidate == kind)
            .map(|(_, construct)| construct(self.http.clone(), base_url, token))
            .ok_or_else(|| PlatformError::Parse(format!("no client for platform {kind}")))
    }
}
