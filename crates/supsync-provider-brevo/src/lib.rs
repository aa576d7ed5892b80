// # Brevo Contact Source
//
// This crate provides the Brevo (Sendinblue) implementation of the
// `ContactSource` trait for the suppression-list sync connector.
//
// ## Implementation Notes
//
// - One paginated fetch per engine call (no retry, no backoff - owned
//   by SyncEngine)
// - HTTP timeout configured (30 seconds by default)
// - Specific error classification for HTTP status codes
//   (401/403, 429, 5xx)
// - Marketing fetch stops at the configured record cap
// - ❌ NO retry logic (intentionally omitted - owned by SyncEngine)
// - ❌ NO caching across calls (state owned by TableStore)
// - ❌ NO background tasks
//
// ## Security Requirements
//
// - The API credential NEVER appears in logs or Debug output
// - The client MUST fail fast if the credential is empty
//
// ## API Reference
//
// - Brevo API v3: https://developers.brevo.com/reference
// - Blocked contacts: GET `/smtp/blockedContacts?limit=&offset=&sort=desc`
// - All contacts:     GET `/contacts?limit=&offset=&sort=desc`

pub mod oauth;

pub use oauth::OAuthTokenProvider;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use supsync_core::config::DateRange;
use supsync_core::records::{RawBlockedContact, RawMarketingContact};
use supsync_core::traits::{AccessTokenProvider, ContactSource, FetchOutcome};
use supsync_core::{Error, Result};

/// Brevo API base URL
const BREVO_API_BASE: &str = "https://api.brevo.com/v3";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Page size for the transactional blocked-contacts endpoint
const DEFAULT_TRANSACTIONAL_PAGE_SIZE: usize = 100;

/// Page size for the marketing contacts endpoint
const DEFAULT_MARKETING_PAGE_SIZE: usize = 1000;

/// Default record cap for the marketing stream
const DEFAULT_MARKETING_CAP: usize = 30_000;

/// Brevo client configuration
///
/// Page sizes match the endpoint maximums so a full sync needs as few
/// round trips as possible.
#[derive(Debug, Clone)]
pub struct BrevoConfig {
    /// API base URL, overridable for tests against a local server
    pub api_url: String,
    /// Per-request HTTP timeout
    pub timeout_secs: u64,
    /// Page size for `/smtp/blockedContacts`
    pub transactional_page_size: usize,
    /// Page size for `/contacts`
    pub marketing_page_size: usize,
    /// Record cap for the marketing stream
    pub marketing_cap: usize,
    /// Optional record cap for the transactional stream (unbounded
    /// when unset)
    pub transactional_cap: Option<usize>,
}

impl Default for BrevoConfig {
    fn default() -> Self {
        Self {
            api_url: BREVO_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            transactional_page_size: DEFAULT_TRANSACTIONAL_PAGE_SIZE,
            marketing_page_size: DEFAULT_MARKETING_PAGE_SIZE,
            marketing_cap: DEFAULT_MARKETING_CAP,
            transactional_cap: None,
        }
    }
}

impl BrevoConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_url.is_empty() {
            return Err(Error::config("Brevo API URL cannot be empty"));
        }
        if self.transactional_page_size == 0 || self.marketing_page_size == 0 {
            return Err(Error::config("Brevo page sizes must be at least 1"));
        }
        if self.marketing_cap == 0 {
            return Err(Error::config("Brevo marketing cap must be at least 1"));
        }
        Ok(())
    }
}

/// Brevo contact source
///
/// Stateless and single-shot: every fetch walks the pagination from
/// offset 0 and returns the full record set or an error. The
/// credential is pulled from the injected token provider per fetch,
/// so refreshed OAuth tokens are picked up without rebuilding the
/// client.
pub struct BrevoClient {
    config: BrevoConfig,
    token_provider: Arc<dyn AccessTokenProvider>,
    client: reqwest::Client,
}

// Custom Debug implementation so the credential path stays opaque
impl std::fmt::Debug for BrevoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrevoClient")
            .field("api_url", &self.config.api_url)
            .field("token_provider", &"<REDACTED>")
            .finish()
    }
}

/// Envelope for paginated contact responses
///
/// Both endpoints wrap their records in a `contacts` array next to a
/// total `count`.
#[derive(Debug, Deserialize)]
struct ContactsPage<T> {
    #[serde(default = "Vec::new")]
    contacts: Vec<T>,
    #[serde(default)]
    count: Option<u64>,
}

impl BrevoClient {
    /// Create a new Brevo client
    pub fn new(config: BrevoConfig, token_provider: Arc<dyn AccessTokenProvider>) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            token_provider,
            client,
        })
    }

    /// Fetch one page of records
    async fn fetch_page<T: DeserializeOwned>(
        &self,
        path: &str,
        limit: usize,
        offset: usize,
        extra_params: &[(&str, String)],
    ) -> Result<ContactsPage<T>> {
        let token = self.token_provider.access_token().await?;
        let url = format!("{}/{}", self.config.api_url.trim_end_matches('/'), path);

        let mut request = self
            .client
            .get(&url)
            .header("api-key", token)
            .header("accept", "application/json")
            .query(&[
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
                ("sort", "desc".to_string()),
            ]);
        for (key, value) in extra_params {
            request = request.query(&[(key, value)]);
        }

        let response = request.send().await.map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(classify_status(status.as_u16(), path, &body));
        }

        let page: ContactsPage<T> = response.json().await.map_err(|e| {
            Error::api(format!("Failed to decode {} response: {}", path, e))
        })?;
        Ok(page)
    }

    /// Walk the pagination for one endpoint
    ///
    /// Stops on the first short page (upstream exhausted) or when the
    /// cap is reached, whichever comes first.
    async fn fetch_all<T: DeserializeOwned>(
        &self,
        path: &str,
        page_size: usize,
        cap: Option<usize>,
        extra_params: &[(&str, String)],
    ) -> Result<FetchOutcome<T>> {
        let mut records: Vec<T> = Vec::new();
        let mut offset = 0usize;

        loop {
            let page: ContactsPage<T> = self
                .fetch_page(path, page_size, offset, extra_params)
                .await?;
            let page_len = page.contacts.len();
            records.extend(page.contacts);

            tracing::debug!(
                path,
                offset,
                page_len,
                total = records.len(),
                upstream_count = page.count,
                "fetched page"
            );

            if let Some(truncated) = finish_fetch(&mut records, page_len, page_size, cap) {
                return Ok(if truncated {
                    FetchOutcome::truncated(records)
                } else {
                    FetchOutcome::complete(records)
                });
            }
            offset += page_size;
        }
    }
}

/// Decide whether pagination stops after the page just consumed.
///
/// The cap is checked before the short-page exit: a final short page can
/// still carry the total past the cap, and the overshoot must be trimmed
/// and flagged rather than returned as a complete fetch. Returns
/// `Some(truncated)` when the walk is done, `None` to keep paging.
fn finish_fetch<T>(
    records: &mut Vec<T>,
    page_len: usize,
    page_size: usize,
    cap: Option<usize>,
) -> Option<bool> {
    if let Some(cap) = cap
        && records.len() >= cap
    {
        let cut = records.len() > cap || page_len == page_size;
        records.truncate(cap);
        return Some(cut);
    }
    if page_len < page_size {
        return Some(false);
    }
    None
}

#[async_trait]
impl ContactSource for BrevoClient {
    async fn fetch_transactional(
        &self,
        range: &DateRange,
    ) -> Result<FetchOutcome<RawBlockedContact>> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(start) = range.start {
            params.push(("startDate", start.format("%Y-%m-%d").to_string()));
        }
        if let Some(end) = range.end {
            params.push(("endDate", end.format("%Y-%m-%d").to_string()));
        }

        self.fetch_all(
            "smtp/blockedContacts",
            self.config.transactional_page_size,
            self.config.transactional_cap,
            &params,
        )
        .await
    }

    async fn fetch_marketing(
        &self,
        range: &DateRange,
    ) -> Result<FetchOutcome<RawMarketingContact>> {
        // The contacts endpoint filters on modification time only
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(start) = range.start {
            params.push((
                "modifiedSince",
                format!("{}T00:00:00.000Z", start.format("%Y-%m-%d")),
            ));
        }

        self.fetch_all(
            "contacts",
            self.config.marketing_page_size,
            Some(self.config.marketing_cap),
            &params,
        )
        .await
    }

    fn source_name(&self) -> &'static str {
        "brevo"
    }
}

/// Map an HTTP error status onto the error taxonomy
///
/// 401/403 are credential problems and abort the run; 429 and 5xx are
/// handed back as retriable so the engine can back off.
fn classify_status(status: u16, path: &str, body: &str) -> Error {
    match status {
        401 | 403 => Error::auth(format!(
            "Brevo rejected the credential on {} (status {})",
            path, status
        )),
        429 => Error::rate_limited(format!("Brevo rate limit on {} (status 429)", path)),
        500..=599 => Error::transient(format!(
            "Brevo server error on {} (status {}): {}",
            path, status, body
        )),
        _ => Error::api(format!(
            "Unexpected Brevo status {} on {}: {}",
            status, path, body
        )),
    }
}

/// Map a transport-level failure onto the error taxonomy
fn classify_transport(err: reqwest::Error) -> Error {
    if err.is_timeout() || err.is_connect() {
        Error::transient(format!("Brevo request failed: {}", err))
    } else {
        Error::api(format!("Brevo request failed: {}", err))
    }
}
