// # Contact Source Trait
//
// Defines the interface for fetching raw contact records from the
// upstream email-marketing API.
//
// ## Implementations
//
// - Brevo: `supsync-provider-brevo` crate
//
// ## Responsibility boundary
//
// Sources are single-shot: one call performs the paginated fetch for
// one stream and either returns the complete record set or an error.
// Sources must NOT implement retry or backoff (owned by `SyncEngine`
// via `RetryPolicy`), must not cache across calls, and must not touch
// the table store. Errors are classified so the engine can decide:
// `Authentication` aborts the run, `RateLimited`/`Transient` are
// retried with backoff.

use crate::config::DateRange;
use crate::error::Result;
use crate::records::{RawBlockedContact, RawMarketingContact};
use async_trait::async_trait;

/// Result of fetching one stream
#[derive(Debug, Clone)]
pub struct FetchOutcome<T> {
    /// Records in upstream order
    pub records: Vec<T>,
    /// True when the configured record cap cut the stream before the
    /// upstream ran out of records
    pub truncated: bool,
}

impl<T> FetchOutcome<T> {
    /// A complete (untruncated) fetch
    pub fn complete(records: Vec<T>) -> Self {
        Self {
            records,
            truncated: false,
        }
    }

    /// A fetch cut short by the record cap
    pub fn truncated(records: Vec<T>) -> Self {
        Self {
            records,
            truncated: true,
        }
    }
}

/// Trait for upstream contact-source implementations
///
/// Implementations must be thread-safe and usable across async tasks.
/// The date range restricts which records are requested, applied as
/// query parameters the upstream API understands; an unbounded range
/// fetches everything.
#[async_trait]
pub trait ContactSource: Send + Sync {
    /// Fetch all blocked contacts from the transactional stream.
    ///
    /// Unbounded by default; implementations may honor a configured
    /// cap, reporting truncation through the outcome.
    async fn fetch_transactional(
        &self,
        range: &DateRange,
    ) -> Result<FetchOutcome<RawBlockedContact>>;

    /// Fetch marketing contacts, stopping at the configured record cap
    /// (30,000 by default) even if more exist upstream.
    async fn fetch_marketing(
        &self,
        range: &DateRange,
    ) -> Result<FetchOutcome<RawMarketingContact>>;

    /// Source name for logging/debugging (e.g. "brevo")
    fn source_name(&self) -> &'static str;
}
