//! GitLab `/api/v4/user/keys` client (gitlab.com or self-hosted).

use async_trait::async_trait;
use gk_core::PlatformKind;
use serde::Deserialize;

use crate::{PlatformApi, RemoteKey, error::PlatformError, http::check_response};

#[derive(Deserialize)]
struct GitLabKey {
    id: u64,
    #[serde(default)]
    title: String,
    key: String,
    #[serde(default)]
    created_at: Option<String>,
}

impl From<GitLabKey> for RemoteKey {
    fn from(k: GitLabKey) -> Self {
        Self {
            id: k.id.to_string(),
            title: k.title,
            key: k.key,
            created_at: k.created_at,
        }
    }
}

pub struct GitLabClient {
    http: reqwest::Client,
    api_base: String,
    token: String,
}

impl GitLabClient {
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
            .header("PRIVATE-TOKEN", &self.token)
    }
}

fn api_base(base_url: Option<&str>) -> String {
    let base = base_url.unwrap_or(PlatformKind::GitLab.spec().api_base);
    format!("{}/api/v4", base.trim_end_matches('/'))
}

#[async_trait]
impl PlatformApi for GitLabClient {
    fn kind(&self) -> PlatformKind {
        PlatformKind::GitLab
    }

    async fn list_keys(&self) -> Result<Vec<RemoteKey>, PlatformError> {
        let resp = check_response(
            self.request(reqwest::Method::GET, "/user/keys?per_page=100")
                .send()
                .await?,
        )
        .await?;
        let keys: Vec<GitLabKey> = resp.json().await?;
        Ok(keys.into_iter().map(RemoteKey::from).collect())
    }

    async fn add_key(&self, title: &str, public_key: &str) -> Result<String, PlatformError> {
        let body = serde_json::json!({ "title": title, "key": public_key.trim() });
        let resp = self
            .request(reqwest::Method::POST, "/user/keys")
            .json(&body)
            .send()
            .await?;
        let resp = check_response(resp).await?;
        if resp.status() != reqwest::StatusCode::CREATED {
            return Err(PlatformError::Api {
                status: resp.status().as_u16(),
                message: "expected 201 Created".into(),
            });
        }
        let created: GitLabKey = resp.json().await?;
        tracing::info!(id = created.id, title, base = %self.api_base, "registered key on gitlab");
        Ok(created.id.to_string())
    }

    async fn delete_key(&self, id: &str) -> Result<(), PlatformError> {
        check_response(
            self.request(reqwest::Method::DELETE, &format!("/user/keys/{id}"))
                .send()
                .await?,
        )
        .await?;
        tracing::info!(id, base = %self.api_base, "deleted key on gitlab");
        Ok(())
    }

    async fn get_key(&self, id: &str) -> Result<RemoteKey, PlatformError> {
        let resp = check_response(
            self.request(reqwest::Method::GET, &format!("/user/keys/{id}"))
                .send()
                .await?,
        )
        .await?;
        let key: GitLabKey = resp.json().await?;
        Ok(key.into())
    }
}
