// # supsync-core
//
// Core library for the contact suppression sync system.
//
// ## Architecture Overview
//
// This library provides the core functionality for syncing suppression
// and contact data from an email platform into CSV tables:
// - **ContactSource**: Trait for fetching raw transactional/marketing records
// - **TableStore**: Trait for loading and persisting the output tables
// - **AccessTokenProvider**: Trait for supplying API credentials
// - **SyncEngine**: Core engine that orchestrates fetch → project → merge → write
// - **merge**: Incremental union merge with the retention safety guard
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from implementations
// 2. **Engine-Owned Retry**: Sources are single-shot; all retry lives here
// 3. **Library-First**: All core functionality can be used as a library
// 4. **No Partial Output**: Tables are written atomically or not at all

pub mod config;
pub mod engine;
pub mod error;
pub mod merge;
pub mod project;
pub mod records;
pub mod retry;
pub mod store;
pub mod traits;

// Re-export core types for convenience
pub use config::{AuthConfig, DateRange, RetryConfig, SyncConfig};
pub use engine::{StreamReport, SyncEngine, SyncReport};
pub use error::{Error, Result};
pub use merge::{MergeDecision, MergeOutcome, PriorMarketingTable};
pub use records::{
    BlockReason, MarketingContact, RawBlockedContact, RawMarketingContact, TransactionalContact,
};
pub use retry::RetryPolicy;
pub use store::{CsvTableStore, MemoryTableStore};
pub use traits::{
    AccessTokenProvider, ContactSource, FetchOutcome, StaticTokenProvider, TableStore,
};
