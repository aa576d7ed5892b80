// # Memory Table Store
//
// In-memory implementation of TableStore.
//
// ## Purpose
//
// Keeps tables in memory with no persistence. Useful for tests and
// embedding: prior tables can be seeded, written output inspected.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::merge::PriorMarketingTable;
use crate::records::{MarketingContact, TransactionalContact};
use crate::traits::table_store::TableStore;

/// In-memory table store
#[derive(Debug, Clone, Default)]
pub struct MemoryTableStore {
    transactional: Arc<RwLock<Option<Vec<TransactionalContact>>>>,
    marketing: Arc<RwLock<Option<PriorMarketingTable>>>,
}

impl MemoryTableStore {
    /// Create an empty store (no prior tables)
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a prior transactional table
    pub async fn seed_transactional(&self, rows: Vec<TransactionalContact>) {
        *self.transactional.write().await = Some(rows);
    }

    /// Seed a prior marketing table
    pub async fn seed_marketing(&self, rows: Vec<MarketingContact>, had_timestamp_column: bool) {
        *self.marketing.write().await = Some(PriorMarketingTable {
            rows,
            had_timestamp_column,
        });
    }

    /// The most recently written transactional table, if any
    pub async fn transactional_table(&self) -> Option<Vec<TransactionalContact>> {
        self.transactional.read().await.clone()
    }

    /// The most recently written marketing table, if any
    pub async fn marketing_table(&self) -> Option<Vec<MarketingContact>> {
        self.marketing.read().await.as_ref().map(|t| t.rows.clone())
    }
}

#[async_trait]
impl TableStore for MemoryTableStore {
    async fn load_transactional(&self) -> Result<Option<Vec<TransactionalContact>>> {
        Ok(self.transactional.read().await.clone())
    }

    async fn load_marketing(&self) -> Result<Option<PriorMarketingTable>> {
        Ok(self.marketing.read().await.clone())
    }

    async fn write_transactional(&self, rows: &[TransactionalContact]) -> Result<()> {
        *self.transactional.write().await = Some(rows.to_vec());
        Ok(())
    }

    async fn write_marketing(&self, rows: &[MarketingContact]) -> Result<()> {
        *self.marketing.write().await = Some(PriorMarketingTable {
            rows: rows.to_vec(),
            had_timestamp_column: true,
        });
        Ok(())
    }
}
