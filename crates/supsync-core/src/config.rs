//! Configuration types for the sync connector
//!
//! This module defines all configuration structures used throughout the crate.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main sync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// API authentication
    pub auth: AuthConfig,

    /// Fetch the transactional blocked-contacts stream
    #[serde(default)]
    pub transactional: bool,

    /// Fetch the marketing contacts stream
    #[serde(default)]
    pub marketing: bool,

    /// Optional date-range filter forwarded to the API
    #[serde(default)]
    pub date_range: DateRange,

    /// Directory the output tables are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Minimum merged/prior row-count ratio below which a fetch is
    /// treated as suspect and the prior table is kept
    #[serde(default = "default_retention_floor")]
    pub retention_floor: f64,

    /// Retry settings for the fetch phase
    #[serde(default)]
    pub retry: RetryConfig,
}

impl SyncConfig {
    /// Create a configuration with defaults and the given auth
    pub fn new(auth: AuthConfig) -> Self {
        Self {
            auth,
            transactional: false,
            marketing: false,
            date_range: DateRange::default(),
            output_dir: default_output_dir(),
            retention_floor: default_retention_floor(),
            retry: RetryConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if !self.transactional && !self.marketing {
            return Err(crate::Error::config(
                "No stream enabled: set transactional and/or marketing",
            ));
        }

        self.auth.validate()?;
        self.date_range.validate()?;
        self.retry.validate()?;

        if !(self.retention_floor > 0.0 && self.retention_floor <= 1.0) {
            return Err(crate::Error::config(format!(
                "retention_floor must be in (0, 1], got {}",
                self.retention_floor
            )));
        }

        Ok(())
    }
}

/// API authentication configuration
///
/// Either a static API key or an OAuth refresh-token credential block
/// that is exchanged for a bearer token at run start.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    /// Static API key
    ApiKey {
        /// The `api-key` header secret
        api_token: String,
    },

    /// OAuth refresh-token credentials
    OAuth {
        /// OAuth client id
        client_id: String,
        /// OAuth client secret
        client_secret: String,
        /// Long-lived refresh token
        refresh_token: String,
        /// Token endpoint URL
        token_url: String,
    },
}

// Manual Debug keeps credential material out of logs.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthConfig::ApiKey { .. } => f
                .debug_struct("ApiKey")
                .field("api_token", &"<REDACTED>")
                .finish(),
            AuthConfig::OAuth {
                client_id,
                token_url,
                ..
            } => f
                .debug_struct("OAuth")
                .field("client_id", client_id)
                .field("client_secret", &"<REDACTED>")
                .field("refresh_token", &"<REDACTED>")
                .field("token_url", token_url)
                .finish(),
        }
    }
}

impl AuthConfig {
    /// Validate the auth configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            AuthConfig::ApiKey { api_token } => {
                if api_token.is_empty() {
                    return Err(crate::Error::config("API token cannot be empty"));
                }
                Ok(())
            }
            AuthConfig::OAuth {
                client_id,
                client_secret,
                refresh_token,
                token_url,
            } => {
                if client_id.is_empty()
                    || client_secret.is_empty()
                    || refresh_token.is_empty()
                {
                    return Err(crate::Error::config(
                        "OAuth credentials require client_id, client_secret and refresh_token",
                    ));
                }
                if !token_url.starts_with("https://") && !token_url.starts_with("http://") {
                    return Err(crate::Error::config(format!(
                        "OAuth token_url must be an HTTP(S) URL, got: {}",
                        token_url
                    )));
                }
                Ok(())
            }
        }
    }
}

/// Optional date-range filter, applied as query parameters understood
/// by the upstream API
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// Inclusive lower bound
    pub start: Option<NaiveDate>,
    /// Inclusive upper bound
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// A range with both bounds set
    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// True when neither bound is set
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Validate the range
    pub fn validate(&self) -> Result<(), crate::Error> {
        if let (Some(start), Some(end)) = (self.start, self.end)
            && start > end
        {
            return Err(crate::Error::config(format!(
                "date range start {} is after end {}",
                start, end
            )));
        }
        Ok(())
    }
}

/// Retry settings for the fetch phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts for a fetch, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay for exponential backoff (doubles each retry, capped)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl RetryConfig {
    /// Validate the retry settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.max_attempts == 0 {
            return Err(crate::Error::config("retry max_attempts must be at least 1"));
        }
        if self.max_attempts > 10 {
            return Err(crate::Error::config(format!(
                "retry max_attempts must be at most 10, got {}",
                self.max_attempts
            )));
        }
        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data/out/tables")
}

fn default_retention_floor() -> f64 {
    0.90
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}
