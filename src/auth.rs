//! OAuth2 token providers for the catalog service.
//!
//! The catalog client only needs a bearer token; [`TokenProvider`] hides how
//! it is obtained. [`ClientCredentialsProvider`] runs the client-credentials
//! grant and caches the token until shortly before it expires.

use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::UpstreamConfig;
use crate::error::CatalogError;

/// Tokens are refreshed this long before they expire.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);
const DEFAULT_TOKEN_TIMEOUT: Duration = Duration::from_secs(15);

#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn get_token(&self) -> Result<String, CatalogError>;

    /// Drop any cached token, e.g. after the upstream answered 401.
    async fn invalidate(&self);
}

/// A fixed token, for tests and pre-issued credentials.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn get_token(&self) -> Result<String, CatalogError> {
        Ok(self.token.clone())
    }

    async fn invalidate(&self) {}
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    1800
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

pub struct ClientCredentialsProvider {
    client: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    scope: String,
    timeout: Duration,
    cached: Mutex<Option<CachedToken>>,
}

impl ClientCredentialsProvider {
    pub fn new(
        client: Client,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            client,
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scope: scope.into(),
            timeout: DEFAULT_TOKEN_TIMEOUT,
            cached: Mutex::new(None),
        }
    }

    /// Hard limit on one token request, body included.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn request_error(&self, e: reqwest::Error) -> CatalogError {
        if e.is_timeout() {
            CatalogError::Timeout(self.timeout)
        } else {
            CatalogError::from(e)
        }
    }

    /// Build from config, reading credentials from the configured env vars.
    pub fn from_config(client: Client, config: &UpstreamConfig) -> anyhow::Result<Self> {
        let client_id = std::env::var(&config.client_id_env)
            .with_context(|| format!("{} not set", config.client_id_env))?;
        let client_secret = std::env::var(&config.client_secret_env)
            .with_context(|| format!("{} not set", config.client_secret_env))?;
        Ok(Self::new(
            client,
            &config.token_url,
            client_id,
            client_secret,
            &config.scope,
        ))
    }

    async fn fetch(&self) -> Result<CachedToken, CatalogError> {
        let basic = STANDARD.encode(format!("{}:{}", self.client_id, self.client_secret));
        let response = self
            .client
            .post(&self.token_url)
            .header(reqwest::header::AUTHORIZATION, format!("Basic {}", basic))
            .form(&[("grant_type", "client_credentials"), ("scope", self.scope.as_str())])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CatalogError::Auth {
                status: status.as_u16(),
                message,
            });
        }

        let token: TokenResponse = response.json().await.map_err(|e| self.request_error(e))?;
        info!(expires_in = token.expires_in, "obtained catalog access token");
        Ok(CachedToken {
            value: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        })
    }
}

#[async_trait]
impl TokenProvider for ClientCredentialsProvider {
    async fn get_token(&self) -> Result<String, CatalogError> {
        // Holding the lock across the fetch makes concurrent callers share
        // one refresh.
        let mut cached = self.cached.lock().await;
        if let Some(t) = cached.as_ref() {
            if Instant::now() + REFRESH_MARGIN < t.expires_at {
                return Ok(t.value.clone());
            }
            debug!("catalog access token near expiry, refreshing");
        }
        let fresh = self.fetch().await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }
}
