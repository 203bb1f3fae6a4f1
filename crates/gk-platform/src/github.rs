//! GitHub `/user/keys` client.

use async_trait::async_trait;
use gk_core::PlatformKind;
use serde::Deserialize;

use crate::{PlatformApi, RemoteKey, error::PlatformError, http::check_response};

const API_VERSION: &str = "2022-11-28";

#[derive(Deserialize)]
struct GitHubKey {
    id: u64,
    #[serde(default)]
    title: String,
    key: String,
    #[serde(default)]
    created_at: Option<String>,
}

impl From<GitHubKey> for RemoteKey {
    fn from(k: GitHubKey) -> Self {
        Self {
            id: k.id.to_string(),
            title: k.title,
            key: k.key,
            created_at: k.created_at,
        }
    }
}

pub struct GitHubClient {
    http: reqwest::Client,
    api_base: String,
    token: String,
}

impl GitHubClient {
    /// `base_url` selects a GitHub Enterprise Server; `None` means github.com.
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: Option<&str>, token: &str) -> Self {
        Self {
            http,
            api_base: api_base(base_url),
            token: token.to_string(),
        }
    }

    pub(crate) fn boxed(http: reqwest::Client, base_url: Option<&str>, token: &str) -> Box<dyn PlatformApi> {
        Box::new(Self::new(http, base_url, token))
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{path}", self.api_base))
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
    }
}

fn api_base(base_url: Option<&str>) -> String {
    match base_url {
        Some(base) => format!("{}/api/v3", base.trim_end_matches('/')),
        None => PlatformKind::GitHub.spec().api_base.to_string(),
    }
}

#[async_trait]
impl PlatformApi for GitHubClient {
    fn kind(&self) -> PlatformKind {
        PlatformKind::GitHub
    }

    async fn list_keys(&self) -> Result<Vec<RemoteKey>, PlatformError> {
        let resp = check_response(
            self.request(reqwest::Method::GET, "/user/keys?per_page=100")
                .send()
                .await?,
        )
        .await?;
        let keys: Vec<GitHubKey> = resp.json().await?;
        Ok(keys.into_iter().map(RemoteKey::from).collect())
    }

    async fn add_key(&self, title: &str, public_key: &str) -> Result<String, PlatformError> {
        let body = serde_json::json!({ "title": title, "key": public_key.trim() });
        let resp = check_response(
            self.request(reqwest::Method::POST, "/user/keys")
                .json(&body)
                .send()
                .await?,
        )
        .await?;
        let created: GitHubKey = resp.json().await?;
        tracing::info!(id = created.id, title, "registered key on github");
        Ok(created.id.to_string())
    }

    async fn delete_key(&self, id: &str) -> Result<(), PlatformError> {
        check_response(
            self.request(reqwest::Method::DELETE, &format!("/user/keys/{id}"))
                .send()
                .await?,
        )
        .await?;
        tracing::info!(id, "deleted key on github");
        Ok(())
    }

    async fn get_key(&self, id: &str) -> Result<RemoteKey, PlatformError> {
        let resp = check_response(
            self.request(reqwest::Method::GET, &format!("/user/keys/{id}"))
                .send()
                .await?,
        )
        .await?;
        let key: GitHubKey = resp.json().await?;
        Ok(key.into())
    }
}
