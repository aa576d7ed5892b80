// # Table Store Implementations
//
// This module provides implementations of the TableStore trait for
// different persistence strategies.

pub mod csv;
pub mod memory;

pub use self::csv::CsvTableStore;
pub use memory::MemoryTableStore;
