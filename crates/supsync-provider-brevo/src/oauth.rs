// # OAuth Token Provider
//
// Exchanges a long-lived refresh token for an access token at the
// configured token endpoint. The exchanged token is cached for the
// lifetime of the provider, which matches a single sync run.
//
// ## Security Requirements
//
// - client_secret and refresh_token NEVER appear in logs or Debug
// - A 4xx from the token endpoint is a credential problem (fatal),
//   a 5xx is transient and retried by the engine

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use supsync_core::traits::AccessTokenProvider;
use supsync_core::{Error, Result};

/// HTTP timeout for the token exchange
const TOKEN_EXCHANGE_TIMEOUT_SECS: u64 = 30;

/// Token provider performing an OAuth refresh-token exchange
pub struct OAuthTokenProvider {
    token_url: String,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    client: reqwest::Client,
    /// Exchanged token, filled on first use
    cached: tokio::sync::Mutex<Option<String>>,
}

// Secrets never appear in Debug output.
impl std::fmt::Debug for OAuthTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthTokenProvider")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<REDACTED>")
            .field("refresh_token", &"<REDACTED>")
            .finish()
    }
}

/// Successful token-endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl OAuthTokenProvider {
    /// Create a provider for a complete credential block
    pub fn new(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Result<Self> {
        let token_url = token_url.into();
        let client_id = client_id.into();
        let client_secret = client_secret.into();
        let refresh_token = refresh_token.into();

        if client_id.is_empty() || client_secret.is_empty() || refresh_token.is_empty() {
            return Err(Error::config(
                "OAuth credentials require client_id, client_secret and refresh_token",
            ));
        }
        if token_url.is_empty() {
            return Err(Error::config("OAuth token_url cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(TOKEN_EXCHANGE_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            token_url,
            client_id,
            client_secret,
            refresh_token,
            client,
            cached: tokio::sync::Mutex::new(None),
        })
    }

    /// Perform the refresh-token exchange
    async fn exchange(&self) -> Result<String> {
        tracing::debug!(token_url = %self.token_url, "exchanging refresh token");

        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", self.refresh_token.as_str()),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    Error::transient(format!("Token exchange failed: {}", e))
                } else {
                    Error::auth(format!("Token exchange failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(if status.is_server_error() {
                Error::transient(format!("Token endpoint returned {}", status))
            } else {
                Error::auth(format!(
                    "Token endpoint rejected the credentials (status {})",
                    status
                ))
            });
        }

        let body: TokenResponse = response.json().await.map_err(|e| {
            Error::auth(format!("Failed to decode token response: {}", e))
        })?;
        if body.access_token.is_empty() {
            return Err(Error::auth("Token endpoint returned an empty access token"));
        }
        Ok(body.access_token)
    }
}

#[async_trait]
impl AccessTokenProvider for OAuthTokenProvider {
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }
        let token = self.exchange().await?;
        *cached = Some(token.clone());
        Ok(token)
    }
}
