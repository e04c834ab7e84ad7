//! Storage layer for stockguard
//!
//! This crate implements the persistence boundary:
//! - StockStore: load/save by identity under plain, exclusive and
//!   version-checked disciplines
//! - InMemoryStockStore: DashMap-backed implementation with per-row locks
//!   and optional simulated latency

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod memory;
pub mod traits;

pub use memory::InMemoryStockStore;
pub use traits::{ReadHandle, ReadMode, RowLock, StockStore, WriteMode};
