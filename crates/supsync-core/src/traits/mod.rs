//! Core traits for the sync connector
//!
//! This module defines the abstract interfaces the engine orchestrates.
//!
//! - [`ContactSource`]: fetch raw contact records from the upstream API
//! - [`AccessTokenProvider`]: supply the bearer/API token used by a source
//! - [`TableStore`]: read the prior output tables and persist new ones

pub mod contact_source;
pub mod table_store;
pub mod token_provider;

pub use contact_source::{ContactSource, FetchOutcome};
pub use table_store::TableStore;
pub use token_provider::{AccessTokenProvider, StaticTokenProvider};
