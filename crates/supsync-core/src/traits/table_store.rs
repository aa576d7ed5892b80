// # Table Store Trait
//
// Defines the interface for reading the prior run's output tables and
// persisting the current run's.
//
// ## Purpose
//
// The output file doubles as next run's prior-state input: the store
// loads it (if present) before the merge and writes the chosen table
// after. Loading a structurally incompatible file fails with
// `Error::SchemaMismatch` before any merge runs; a marketing file
// merely missing the `blacklisted_timestamp` column is NOT a mismatch
// (that is the documented whole-column backfill case).
//
// ## Implementations
//
// - CSV files: `crate::store::CsvTableStore`
// - In-memory: `crate::store::MemoryTableStore` (tests, harnesses)

use crate::error::Result;
use crate::merge::PriorMarketingTable;
use crate::records::{MarketingContact, TransactionalContact};
use async_trait::async_trait;

/// Trait for table persistence implementations
///
/// Writes must be atomic at the table level: a failed run never leaves
/// a partially written file, preserving the last good output for the
/// next run. Re-writing the same in-memory table must produce
/// byte-identical output.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Load the prior transactional table, `Ok(None)` when absent
    async fn load_transactional(&self) -> Result<Option<Vec<TransactionalContact>>>;

    /// Load the prior marketing table, `Ok(None)` when absent
    async fn load_marketing(&self) -> Result<Option<PriorMarketingTable>>;

    /// Persist the final transactional table
    async fn write_transactional(&self, rows: &[TransactionalContact]) -> Result<()>;

    /// Persist the final marketing table
    async fn write_marketing(&self, rows: &[MarketingContact]) -> Result<()>;
}
