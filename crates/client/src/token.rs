//! Bearer token acquisition with a process-wide cache.

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::config::ClientConfig;
use crate::error::ClientError;

pub const TOKEN_PATH: &str = "/api/auth/token";

#[derive(Serialize)]
struct TokenRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: String,
}

/// Fetches a token on first use and reuses it until told to drop it.
#[derive(Debug)]
pub struct TokenService {
    http: reqwest::Client,
    config: ClientConfig,
    cached: RwLock<Option<String>>,
}

impl TokenService {
    pub fn new(http: reqwest::Client, config: ClientConfig) -> Self {
        Self {
            http,
            config,
            cached: RwLock::new(None),
        }
    }

    /// Cached token, or a freshly fetched one.
    pub async fn token(&self) -> Result<String, ClientError> {
        if let Some(token) = self.cached.read().await.as_ref() {
            return Ok(token.clone());
        }
        self.fetch_new_token().await
    }

    pub async fn fetch_new_token(&self) -> Result<String, ClientError> {
        let response = self
            .http
            .post(self.config.url(TOKEN_PATH))
            .json(&TokenRequest {
                username: &self.config.username,
                password: &self.config.password,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "token request rejected");
            return Err(ClientError::TokenRejected(status.as_u16()));
        }

        let body = response.text().await?;
        let token = serde_json::from_str::<TokenResponse>(&body)
            .ok()
            .map(|r| r.token)
            .filter(|t| !t.is_empty())
            .ok_or(ClientError::InvalidToken)?;

        *self.cached.write().await = Some(token.clone());
        tracing::debug!("obtained new API token");
        Ok(token)
    }

    /// Forget the cached token (after the API rejected it).
    pub async fn invalidate(&self) {
        self.cached.write().await.take();
    }

    pub async fn has_cached_token(&self) -> bool {
        self.cached.read().await.is_some()
    }
}
