//! Contract: a suspect fetch never replaces the prior table
//!
//! Verifies the retention guard end to end: when a fetch returns far
//! fewer records than the prior table holds, the engine keeps the
//! prior table unchanged and reports the fallback.

mod common;

use common::{ScriptedSource, minimal_config, raw_marketing, transactional_row};
use supsync_core::engine::SyncEngine;
use supsync_core::merge::MergeDecision;
use supsync_core::records::MarketingContact;
use supsync_core::store::MemoryTableStore;
use supsync_core::traits::FetchOutcome;

fn marketing_row(id: i64, email: &str) -> MarketingContact {
    MarketingContact {
        id,
        email: email.to_string(),
        email_blacklisted: true,
        sms_blacklisted: false,
        created_at: "2024-01-01T00:00:00Z".to_string(),
        modified_at: "2024-02-01T00:00:00Z".to_string(),
        blacklisted_timestamp: Some("2024-02-01T00:00:00Z".to_string()),
    }
}

#[tokio::test]
async fn suspect_marketing_fetch_keeps_the_prior_table() {
    let prior: Vec<MarketingContact> = (0..10)
        .map(|i| marketing_row(i, &format!("c{i}@example.com")))
        .collect();

    let store = MemoryTableStore::new();
    store.seed_marketing(prior.clone(), true).await;

    // 2 fetched against 10 prior: ratio 0.2, well below the 0.9 floor
    let source = ScriptedSource::new();
    source.push_marketing(Ok(FetchOutcome::complete(vec![
        raw_marketing(0, "c0@example.com"),
        raw_marketing(1, "c1@example.com"),
    ])));

    let mut config = minimal_config();
    config.marketing = true;

    let engine = SyncEngine::new(Box::new(source), Box::new(store.clone()), config)
        .expect("valid config");
    let report = engine.run().await.expect("fallback is not an error");

    let stream = report.marketing.expect("stream ran");
    match stream.decision {
        MergeDecision::FellBack { retention } => {
            assert!((retention - 0.2).abs() < 1e-9);
        }
        other => panic!("expected fallback, got {other:?}"),
    }

    // The stored table is byte-for-byte the prior one
    let table = store.marketing_table().await.expect("table present");
    assert_eq!(table, prior);
}

#[tokio::test]
async fn suspect_transactional_fetch_keeps_the_prior_table() {
    let prior: Vec<_> = (0..10)
        .map(|i| transactional_row(&format!("b{i}@example.com")))
        .collect();

    let store = MemoryTableStore::new();
    store.seed_transactional(prior.clone()).await;

    let source = ScriptedSource::new();
    source.push_transactional(Ok(FetchOutcome::complete(vec![])));

    let mut config = minimal_config();
    config.transactional = true;

    let engine = SyncEngine::new(Box::new(source), Box::new(store.clone()), config)
        .expect("valid config");
    let report = engine.run().await.expect("fallback is not an error");

    let stream = report.transactional.expect("stream ran");
    assert!(matches!(stream.decision, MergeDecision::FellBack { .. }));
    assert_eq!(stream.rows_written, prior.len());

    let table = store.transactional_table().await.expect("table present");
    assert_eq!(table, prior);
}

#[tokio::test]
async fn first_run_is_accepted_regardless_of_size() {
    let store = MemoryTableStore::new();

    let source = ScriptedSource::new();
    source.push_marketing(Ok(FetchOutcome::complete(vec![raw_marketing(
        1,
        "only@example.com",
    )])));

    let mut config = minimal_config();
    config.marketing = true;

    let engine = SyncEngine::new(Box::new(source), Box::new(store.clone()), config)
        .expect("valid config");
    let report = engine.run().await.expect("run succeeds");

    let stream = report.marketing.expect("stream ran");
    assert_eq!(stream.decision, MergeDecision::FirstRun);

    let table = store.marketing_table().await.expect("table written");
    assert_eq!(table.len(), 1);
    // First run stamps the run timestamp on every row
    assert!(table[0].blacklisted_timestamp.is_some());
}
