//! Test doubles and common utilities for architecture contract tests
//!
//! This module provides minimal test doubles that verify architectural
//! constraints without implementing real functionality.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use supsync_core::config::{AuthConfig, SyncConfig};
use supsync_core::error::Result;
use supsync_core::records::{RawBlockedContact, RawMarketingContact, TransactionalContact};
use supsync_core::traits::{ContactSource, FetchOutcome};

/// Shared call counters for a [`ScriptedSource`]
///
/// Cloned before the source is moved into the engine so the test can
/// still observe how often each stream was fetched.
#[derive(Clone)]
pub struct SourceCounters {
    transactional: Arc<AtomicUsize>,
    marketing: Arc<AtomicUsize>,
}

impl SourceCounters {
    pub fn transactional_calls(&self) -> usize {
        self.transactional.load(Ordering::SeqCst)
    }

    pub fn marketing_calls(&self) -> usize {
        self.marketing.load(Ordering::SeqCst)
    }
}

/// A ContactSource that replays a scripted sequence of fetch results
///
/// Each fetch pops the next queued result for that stream, letting
/// tests script failures followed by success. Popping an empty queue
/// is a test bug and fails loudly.
pub struct ScriptedSource {
    transactional: std::sync::Mutex<VecDeque<Result<FetchOutcome<RawBlockedContact>>>>,
    marketing: std::sync::Mutex<VecDeque<Result<FetchOutcome<RawMarketingContact>>>>,
    counters: SourceCounters,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self {
            transactional: std::sync::Mutex::new(VecDeque::new()),
            marketing: std::sync::Mutex::new(VecDeque::new()),
            counters: SourceCounters {
                transactional: Arc::new(AtomicUsize::new(0)),
                marketing: Arc::new(AtomicUsize::new(0)),
            },
        }
    }

    /// Queue the next transactional fetch result
    pub fn push_transactional(&self, result: Result<FetchOutcome<RawBlockedContact>>) {
        self.transactional.lock().unwrap().push_back(result);
    }

    /// Queue the next marketing fetch result
    pub fn push_marketing(&self, result: Result<FetchOutcome<RawMarketingContact>>) {
        self.marketing.lock().unwrap().push_back(result);
    }

    /// Counters handle that stays valid after the source is boxed
    pub fn counters(&self) -> SourceCounters {
        self.counters.clone()
    }
}

#[async_trait::async_trait]
impl ContactSource for ScriptedSource {
    async fn fetch_transactional(
        &self,
        _range: &supsync_core::config::DateRange,
    ) -> Result<FetchOutcome<RawBlockedContact>> {
        self.counters.transactional.fetch_add(1, Ordering::SeqCst);
        self.transactional
            .lock()
            .unwrap()
            .pop_front()
            .expect("transactional script exhausted")
    }

    async fn fetch_marketing(
        &self,
        _range: &supsync_core::config::DateRange,
    ) -> Result<FetchOutcome<RawMarketingContact>> {
        self.counters.marketing.fetch_add(1, Ordering::SeqCst);
        self.marketing
            .lock()
            .unwrap()
            .pop_front()
            .expect("marketing script exhausted")
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// A raw blocked contact with the given email and fixed metadata
pub fn raw_blocked(email: &str) -> RawBlockedContact {
    serde_json::from_value(serde_json::json!({
        "email": email,
        "reason": {"code": "hardBounce", "message": "mailbox not found"},
        "blockedAt": "2024-03-01T08:00:00Z",
        "senderEmail": "news@sender.example"
    }))
    .expect("valid blocked contact fixture")
}

/// A raw marketing contact with the given id and email
pub fn raw_marketing(id: i64, email: &str) -> RawMarketingContact {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "email": email,
        "emailBlacklisted": true,
        "smsBlacklisted": false,
        "createdAt": "2024-01-01T00:00:00Z",
        "modifiedAt": "2024-02-01T00:00:00Z"
    }))
    .expect("valid marketing contact fixture")
}

/// A projected transactional row, for seeding prior tables
pub fn transactional_row(email: &str) -> TransactionalContact {
    TransactionalContact {
        email: email.to_string(),
        reason_message: "mailbox not found".to_string(),
        reason_code: "hardBounce".to_string(),
        blocked_at: "2024-03-01T08:00:00Z".to_string(),
        sender_email: "news@sender.example".to_string(),
    }
}

/// Helper to create a minimal SyncConfig for testing
///
/// Both streams disabled; tests enable what they exercise. Backoff is
/// shortened so retry tests stay fast.
pub fn minimal_config() -> SyncConfig {
    let mut config = SyncConfig::new(AuthConfig::ApiKey {
        api_token: "xkeysib-test".to_string(),
    });
    config.retry.max_attempts = 3;
    config.retry.base_delay_ms = 1;
    config
}
