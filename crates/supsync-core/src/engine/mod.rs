//! Core sync engine
//!
//! The SyncEngine is responsible for:
//! - Fetching each enabled stream via ContactSource (with retry)
//! - Projecting raw records onto the output columns
//! - Merging with the prior table via the merge engine
//! - Persisting the chosen tables via TableStore
//!
//! ## Pipeline
//!
//! ```text
//! ┌───────────────┐    ┌───────────┐    ┌──────────────┐    ┌────────────┐
//! │ ContactSource │───▶│ Projector │───▶│ Merge Engine │───▶│ TableStore │
//! └───────────────┘    └───────────┘    └──────────────┘    └────────────┘
//!        ▲                                     ▲
//!        │ RetryPolicy (engine-owned)          │ prior table (TableStore)
//! ```
//!
//! Single-threaded and sequential, one pass per invocation. All
//! enabled streams are fetched and merged before anything is written,
//! so a failure anywhere in the run leaves every prior output file
//! untouched.

use crate::config::SyncConfig;
use crate::error::Result;
use crate::merge::{self, MergeDecision};
use crate::project;
use crate::records::{MarketingContact, TransactionalContact};
use crate::retry::RetryPolicy;
use crate::traits::{ContactSource, TableStore};
use chrono::{SecondsFormat, Utc};
use tracing::{info, warn};

/// Outcome of one stream within a run
#[derive(Debug, Clone, PartialEq)]
pub struct StreamReport {
    /// Raw records fetched from the API
    pub fetched: usize,
    /// Whether the record cap cut the fetch short
    pub truncated: bool,
    /// How the merge resolved
    pub decision: MergeDecision,
    /// Rows in the written table
    pub rows_written: usize,
}

/// Outcome of a whole run; `None` for streams that were not enabled
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub transactional: Option<StreamReport>,
    pub marketing: Option<StreamReport>,
}

/// A merged table waiting for the write phase
struct StreamPlan<T> {
    table: Vec<T>,
    report: StreamReport,
}

/// Core sync engine
///
/// Orchestrates fetch → project → merge → write for the enabled
/// streams. Components are injected, constructed once per run and
/// released at run end; the engine holds no state between runs beyond
/// what the table store persists.
pub struct SyncEngine {
    source: Box<dyn ContactSource>,
    store: Box<dyn TableStore>,
    config: SyncConfig,
    retry: RetryPolicy,
}

impl SyncEngine {
    /// Create a new engine, validating the configuration
    pub fn new(
        source: Box<dyn ContactSource>,
        store: Box<dyn TableStore>,
        config: SyncConfig,
    ) -> Result<Self> {
        config.validate()?;
        let retry = RetryPolicy::from_config(&config.retry);
        Ok(Self {
            source,
            store,
            config,
            retry,
        })
    }

    /// Execute one run
    ///
    /// The run timestamp is captured once here so every row stamped in
    /// this run carries the same value. Writes happen only after every
    /// enabled stream has fetched and merged successfully.
    pub async fn run(&self) -> Result<SyncReport> {
        let run_timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        info!(
            source = self.source.source_name(),
            run_timestamp = %run_timestamp,
            transactional = self.config.transactional,
            marketing = self.config.marketing,
            "starting sync run"
        );

        let transactional = if self.config.transactional {
            Some(self.prepare_transactional().await?)
        } else {
            info!("transactional stream not enabled, skipping");
            None
        };

        let marketing = if self.config.marketing {
            Some(self.prepare_marketing(&run_timestamp).await?)
        } else {
            info!("marketing stream not enabled, skipping");
            None
        };

        // Write phase: every fetch succeeded, tables may be persisted.
        let mut report = SyncReport::default();

        if let Some(plan) = transactional {
            self.store.write_transactional(&plan.table).await?;
            log_stream("transactional", &plan.report);
            report.transactional = Some(plan.report);
        }

        if let Some(plan) = marketing {
            self.store.write_marketing(&plan.table).await?;
            log_stream("marketing", &plan.report);
            report.marketing = Some(plan.report);
        }

        Ok(report)
    }

    async fn prepare_transactional(&self) -> Result<StreamPlan<TransactionalContact>> {
        let range = self.config.date_range;
        let outcome = self
            .retry
            .run("fetch transactional blocked contacts", || {
                self.source.fetch_transactional(&range)
            })
            .await?;

        let fetched = outcome.records.len();
        if outcome.truncated {
            warn!(fetched, "transactional fetch stopped at the record cap");
        }

        let new = project::project_transactional_batch(outcome.records);
        let old = self.store.load_transactional().await?;
        let merged = merge::merge_transactional(old, new, self.config.retention_floor);

        Ok(StreamPlan {
            report: StreamReport {
                fetched,
                truncated: outcome.truncated,
                decision: merged.decision,
                rows_written: merged.table.len(),
            },
            table: merged.table,
        })
    }

    async fn prepare_marketing(&self, run_timestamp: &str) -> Result<StreamPlan<MarketingContact>> {
        let range = self.config.date_range;
        let outcome = self
            .retry
            .run("fetch marketing contacts", || {
                self.source.fetch_marketing(&range)
            })
            .await?;

        let fetched = outcome.records.len();
        if outcome.truncated {
            warn!(fetched, "marketing fetch stopped at the record cap");
        }

        let new = project::project_marketing_batch(outcome.records);
        let old = self.store.load_marketing().await?;
        let merged =
            merge::merge_marketing(old, new, run_timestamp, self.config.retention_floor);

        Ok(StreamPlan {
            report: StreamReport {
                fetched,
                truncated: outcome.truncated,
                decision: merged.decision,
                rows_written: merged.table.len(),
            },
            table: merged.table,
        })
    }
}

fn log_stream(stream: &str, report: &StreamReport) {
    info!(
        stream,
        fetched = report.fetched,
        rows_written = report.rows_written,
        decision = ?report.decision,
        "table written"
    );
}
