//! Merge engine
//!
//! Combines a freshly fetched, projected table with the previous run's
//! output, keyed by `email`:
//!
//! 1. No prior table: output is the new table; marketing rows are
//!    stamped with the run timestamp.
//! 2. Prior table present: row-wise union in which new fields win for
//!    overlapping emails and prior-only rows are retained, preserving
//!    contacts the API no longer returns in the current page window.
//!    Marketing timestamps are carried forward for every email that
//!    existed before and assigned only to emails new this run; a prior
//!    table that lacked the column entirely is backfilled whole.
//! 3. Retention guard: a keyed union can only grow, so shrinkage shows
//!    up in the fetch itself. When the freshly fetched row count drops
//!    below the configured fraction of the prior table the response is
//!    treated as suspect (partial upstream fetch) and the prior table
//!    is kept unchanged. That path is a logged warning, never an error.
//!
//! Row order is deterministic: prior rows keep their order (overlaps
//! updated in place), new-only rows append in fetch order.

use crate::records::{MarketingContact, TransactionalContact};
use std::collections::HashMap;
use tracing::{debug, warn};

/// How the merge resolved
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MergeDecision {
    /// No prior table existed; the new table was taken as-is
    FirstRun,
    /// Merged table accepted
    Accepted {
        /// merged rows / prior rows
        retention: f64,
    },
    /// Merged table discarded, prior table kept unchanged
    FellBack {
        /// merged rows / prior rows, below the floor
        retention: f64,
    },
}

impl MergeDecision {
    /// True unless the retention guard rejected the fetch
    pub fn accepted(&self) -> bool {
        !matches!(self, MergeDecision::FellBack { .. })
    }
}

/// Result of merging one table
#[derive(Debug, Clone)]
pub struct MergeOutcome<T> {
    /// The chosen output table
    pub table: Vec<T>,
    pub decision: MergeDecision,
}

/// A previously persisted marketing table
#[derive(Debug, Clone)]
pub struct PriorMarketingTable {
    pub rows: Vec<MarketingContact>,
    /// Whether the file carried a `blacklisted_timestamp` column.
    /// When it did not, the merge backfills every row with the run
    /// timestamp.
    pub had_timestamp_column: bool,
}

/// Merge the transactional table (no derived timestamp column)
pub fn merge_transactional(
    old: Option<Vec<TransactionalContact>>,
    new: Vec<TransactionalContact>,
    retention_floor: f64,
) -> MergeOutcome<TransactionalContact> {
    let Some(old_rows) = old else {
        return MergeOutcome {
            table: new,
            decision: MergeDecision::FirstRun,
        };
    };

    let index: HashMap<String, usize> = old_rows
        .iter()
        .enumerate()
        .map(|(i, row)| (row.email.clone(), i))
        .collect();

    let fetched = new.len();
    let mut merged = old_rows.clone();
    for row in new {
        match index.get(&row.email) {
            Some(&i) => merged[i] = row,
            None => merged.push(row),
        }
    }

    resolve("transactional", old_rows, merged, fetched, retention_floor)
}

/// Merge the marketing table, reconciling `blacklisted_timestamp`
///
/// `run_timestamp` is the single timestamp captured at run start; it is
/// assigned to every email seen as blacklisted for the first time and
/// used for the whole-column backfill when the prior table lacked the
/// column.
pub fn merge_marketing(
    old: Option<PriorMarketingTable>,
    new: Vec<MarketingContact>,
    run_timestamp: &str,
    retention_floor: f64,
) -> MergeOutcome<MarketingContact> {
    let Some(prior) = old else {
        return MergeOutcome {
            table: stamp_all(new, run_timestamp),
            decision: MergeDecision::FirstRun,
        };
    };

    let old_rows = prior.rows;
    let index: HashMap<String, usize> = old_rows
        .iter()
        .enumerate()
        .map(|(i, row)| (row.email.clone(), i))
        .collect();

    let mut merged = old_rows.clone();
    if !prior.had_timestamp_column {
        debug!("prior marketing table lacked the timestamp column, backfilling all rows");
        for row in &mut merged {
            row.blacklisted_timestamp = Some(run_timestamp.to_string());
        }
    }

    let fetched = new.len();
    for mut row in new {
        match index.get(&row.email) {
            Some(&i) => {
                // New fields win; the first-seen timestamp never moves.
                row.blacklisted_timestamp = merged[i].blacklisted_timestamp.clone();
                merged[i] = row;
            }
            None => {
                row.blacklisted_timestamp = Some(run_timestamp.to_string());
                merged.push(row);
            }
        }
    }

    resolve("marketing", old_rows, merged, fetched, retention_floor)
}

/// Apply the retention guard and pick the output table
///
/// The union never loses rows, so the guard looks at the fetched count:
/// a fetch far smaller than the prior table means the upstream page
/// window came back incomplete and merging it would only mint bogus
/// first-seen timestamps on the next full fetch.
fn resolve<T>(
    stream: &str,
    old_rows: Vec<T>,
    merged: Vec<T>,
    fetched: usize,
    retention_floor: f64,
) -> MergeOutcome<T> {
    if old_rows.is_empty() {
        return MergeOutcome {
            table: merged,
            decision: MergeDecision::Accepted { retention: 1.0 },
        };
    }

    let fetch_ratio = fetched as f64 / old_rows.len() as f64;
    if fetch_ratio < retention_floor {
        warn!(
            stream,
            fetch_ratio,
            retention_floor,
            prior_rows = old_rows.len(),
            fetched_rows = fetched,
            "fetch looks partial, keeping prior table unchanged"
        );
        return MergeOutcome {
            table: old_rows,
            decision: MergeDecision::FellBack {
                retention: fetch_ratio,
            },
        };
    }

    let retention = merged.len() as f64 / old_rows.len() as f64;
    MergeOutcome {
        table: merged,
        decision: MergeDecision::Accepted { retention },
    }
}

fn stamp_all(mut rows: Vec<MarketingContact>, run_timestamp: &str) -> Vec<MarketingContact> {
    for row in &mut rows {
        row.blacklisted_timestamp = Some(run_timestamp.to_string());
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    const RUN_TS: &str = "2024-06-01T12:00:00+00:00";
    const OLD_TS: &str = "2023-01-01T00:00:00+00:00";
    const FLOOR: f64 = 0.90;

    fn marketing(id: i64, email: &str, ts: Option<&str>) -> MarketingContact {
        MarketingContact {
            id,
            email: email.to_string(),
            email_blacklisted: true,
            sms_blacklisted: false,
            created_at: "2023-01-01T00:00:00Z".to_string(),
            modified_at: "2023-06-01T00:00:00Z".to_string(),
            blacklisted_timestamp: ts.map(String::from),
        }
    }

    fn transactional(email: &str, code: &str) -> TransactionalContact {
        TransactionalContact {
            email: email.to_string(),
            reason_message: "blocked".to_string(),
            reason_code: code.to_string(),
            blocked_at: "2024-01-01T00:00:00Z".to_string(),
            sender_email: "news@sender.example".to_string(),
        }
    }

    fn prior(rows: Vec<MarketingContact>) -> Option<PriorMarketingTable> {
        Some(PriorMarketingTable {
            rows,
            had_timestamp_column: true,
        })
    }

    #[test]
    fn first_run_stamps_every_marketing_row() {
        let new = vec![marketing(1, "a@x.com", None), marketing(2, "b@x.com", None)];
        let outcome = merge_marketing(None, new, RUN_TS, FLOOR);

        assert_eq!(outcome.decision, MergeDecision::FirstRun);
        assert_eq!(outcome.table.len(), 2);
        for row in &outcome.table {
            assert_eq!(row.blacklisted_timestamp.as_deref(), Some(RUN_TS));
        }
    }

    #[test]
    fn first_run_transactional_passes_through() {
        let new = vec![transactional("a@x.com", "hardBounce")];
        let outcome = merge_transactional(None, new.clone(), FLOOR);
        assert_eq!(outcome.decision, MergeDecision::FirstRun);
        assert_eq!(outcome.table, new);
    }

    #[test]
    fn disjoint_emails_union_keeps_everything() {
        let old = vec![marketing(1, "a@x.com", Some(OLD_TS)), marketing(2, "b@x.com", Some(OLD_TS))];
        let new = vec![marketing(3, "c@x.com", None), marketing(4, "d@x.com", None)];

        let outcome = merge_marketing(prior(old.clone()), new, RUN_TS, FLOOR);
        assert!(outcome.decision.accepted());
        assert_eq!(outcome.table.len(), 4);
        // Prior rows unchanged and first, new rows stamped and appended.
        assert_eq!(outcome.table[0], old[0]);
        assert_eq!(outcome.table[1], old[1]);
        assert_eq!(outcome.table[2].blacklisted_timestamp.as_deref(), Some(RUN_TS));
        assert_eq!(outcome.table[3].blacklisted_timestamp.as_deref(), Some(RUN_TS));
    }

    #[test]
    fn identical_emails_take_new_fields_and_old_timestamp() {
        let old = vec![marketing(1, "a@x.com", Some(OLD_TS))];
        let mut incoming = marketing(1, "a@x.com", None);
        incoming.sms_blacklisted = true;
        incoming.modified_at = "2024-05-01T00:00:00Z".to_string();

        let outcome = merge_marketing(prior(old), vec![incoming.clone()], RUN_TS, FLOOR);
        assert!(outcome.decision.accepted());
        assert_eq!(outcome.table.len(), 1);

        let merged = &outcome.table[0];
        assert!(merged.sms_blacklisted);
        assert_eq!(merged.modified_at, incoming.modified_at);
        // Except the timestamp, which keeps the first-seen value.
        assert_eq!(merged.blacklisted_timestamp.as_deref(), Some(OLD_TS));
    }

    #[test]
    fn transactional_new_wins_on_collision() {
        let old = vec![transactional("a@x.com", "softBounce"), transactional("b@x.com", "spam")];
        let new = vec![
            transactional("a@x.com", "hardBounce"),
            transactional("c@x.com", "unsubscribed"),
        ];

        let outcome = merge_transactional(Some(old), new, FLOOR);
        assert!(outcome.decision.accepted());
        assert_eq!(outcome.table.len(), 3);
        assert_eq!(outcome.table[0].reason_code, "hardBounce");
        assert_eq!(outcome.table[1].reason_code, "spam");
        assert_eq!(outcome.table[2].email, "c@x.com");
    }

    #[test]
    fn overlap_scenario_105_rows() {
        // prior: 100 rows; new: 95 rows, 90 overlapping + 5 new.
        let old: Vec<_> = (0..100)
            .map(|i| marketing(i, &format!("u{}@x.com", i), Some(OLD_TS)))
            .collect();
        let new: Vec<_> = (0..90)
            .map(|i| marketing(i, &format!("u{}@x.com", i), None))
            .chain((100..105).map(|i| marketing(i, &format!("u{}@x.com", i), None)))
            .collect();

        let outcome = merge_marketing(prior(old), new, RUN_TS, FLOOR);
        match outcome.decision {
            MergeDecision::Accepted { retention } => assert!((retention - 1.05).abs() < 1e-9),
            other => panic!("expected acceptance, got {:?}", other),
        }
        assert_eq!(outcome.table.len(), 105);

        let stamped_now = outcome
            .table
            .iter()
            .filter(|r| r.blacklisted_timestamp.as_deref() == Some(RUN_TS))
            .count();
        let carried = outcome
            .table
            .iter()
            .filter(|r| r.blacklisted_timestamp.as_deref() == Some(OLD_TS))
            .count();
        assert_eq!(stamped_now, 5);
        assert_eq!(carried, 100);
    }

    #[test]
    fn severe_truncation_falls_back_to_old() {
        let old: Vec<_> = (0..1000)
            .map(|i| marketing(i, &format!("u{}@x.com", i), Some(OLD_TS)))
            .collect();
        let new: Vec<_> = (0..200)
            .map(|i| marketing(i, &format!("u{}@x.com", i), None))
            .collect();

        let outcome = merge_marketing(prior(old.clone()), new, RUN_TS, FLOOR);
        match outcome.decision {
            MergeDecision::FellBack { retention } => assert!((retention - 0.2).abs() < 1e-9),
            other => panic!("expected fallback, got {:?}", other),
        }
        // Output equals old exactly.
        assert_eq!(outcome.table, old);
    }

    #[test]
    fn fallback_applies_to_transactional_too() {
        let old: Vec<_> = (0..100)
            .map(|i| transactional(&format!("u{}@x.com", i), "spam"))
            .collect();
        let new = vec![transactional("u0@x.com", "hardBounce")];

        let outcome = merge_transactional(Some(old.clone()), new, FLOOR);
        assert!(!outcome.decision.accepted());
        assert_eq!(outcome.table, old);
    }

    #[test]
    fn missing_column_backfills_whole_table() {
        let old = vec![marketing(1, "a@x.com", None), marketing(2, "b@x.com", None)];
        let new = vec![marketing(1, "a@x.com", None), marketing(3, "c@x.com", None)];

        let outcome = merge_marketing(
            Some(PriorMarketingTable {
                rows: old,
                had_timestamp_column: false,
            }),
            new,
            RUN_TS,
            FLOOR,
        );

        assert!(outcome.decision.accepted());
        assert_eq!(outcome.table.len(), 3);
        for row in &outcome.table {
            assert_eq!(row.blacklisted_timestamp.as_deref(), Some(RUN_TS));
        }
    }

    #[test]
    fn empty_prior_table_never_falls_back() {
        let outcome = merge_marketing(
            prior(Vec::new()),
            vec![marketing(1, "a@x.com", None)],
            RUN_TS,
            FLOOR,
        );
        assert_eq!(outcome.decision, MergeDecision::Accepted { retention: 1.0 });
        assert_eq!(outcome.table.len(), 1);
        assert_eq!(outcome.table[0].blacklisted_timestamp.as_deref(), Some(RUN_TS));
    }

    #[test]
    fn fetch_exactly_at_floor_is_accepted() {
        let old: Vec<_> = (0..10)
            .map(|i| transactional(&format!("u{}@x.com", i), "spam"))
            .collect();
        // 9 fetched against 10 prior rows sits exactly on the 0.9
        // floor, which is not below it.
        let new = old[..9].to_vec();
        let outcome = merge_transactional(Some(old), new, FLOOR);
        assert!(outcome.decision.accepted());
        assert_eq!(outcome.table.len(), 10);
    }

    #[test]
    fn fetch_just_below_floor_falls_back() {
        let old: Vec<_> = (0..100)
            .map(|i| transactional(&format!("u{}@x.com", i), "spam"))
            .collect();
        let new = old[..89].to_vec();
        let outcome = merge_transactional(Some(old.clone()), new, FLOOR);
        assert!(!outcome.decision.accepted());
        assert_eq!(outcome.table, old);
    }
}
