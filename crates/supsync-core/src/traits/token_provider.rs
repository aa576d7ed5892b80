// # Access Token Provider Trait
//
// Abstracts how the API credential is obtained, so a static `#api_token`
// and an OAuth refresh-token exchange look the same to the API client.
//
// ## Implementations
//
// - `StaticTokenProvider` (here): wraps a configured API key
// - `OAuthTokenProvider` (`supsync-provider-brevo`): exchanges a
//   refresh token at the token endpoint, since it needs an HTTP client

use crate::error::{Error, Result};
use async_trait::async_trait;

/// Trait for access-token acquisition
///
/// `access_token` may perform network I/O (OAuth exchange) and is
/// called at most once per fetched stream; failures map to
/// `Error::Authentication` for credential problems and
/// `Error::Transient` for connectivity.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Produce a token valid for the upcoming requests
    async fn access_token(&self) -> Result<String>;
}

/// Token provider backed by a configured static API key
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    /// Create a provider for a non-empty API key
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.is_empty() {
            return Err(Error::config("API token cannot be empty"));
        }
        Ok(Self { token })
    }
}

// The secret never appears in Debug output.
impl std::fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenProvider")
            .field("token", &"<REDACTED>")
            .finish()
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String> {
        Ok(self.token.clone())
    }
}
