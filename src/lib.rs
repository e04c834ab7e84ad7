//! stockguard - four concurrency disciplines for a shared inventory counter
//!
//! Concurrent decrements of one stock record can be serialized in several
//! ways. This crate puts four of them behind one `apply(id, delta)` contract
//! so they can be measured side by side:
//!
//! | Strategy | Coordination | Contention shows up as |
//! |----------|--------------|------------------------|
//! | `Unsynchronized` | none | lost updates |
//! | `Optimistic` | version check | retries |
//! | `Pessimistic` | exclusive row lock | waiting |
//! | `Distributed` | leased external mutex | waiting, bounded by the wait window |
//!
//! # Quick Start
//!
//! ```
//! use stockguard::{Inventory, NewStockRecord, StockConfig, Strategy};
//!
//! let inventory = Inventory::open(StockConfig::default())?;
//! let record = inventory.create_record(NewStockRecord::new("SKU-1", "widget", 100, 3))?;
//!
//! let result = inventory.run_concurrency_test_with(Strategy::Pessimistic, record.id, -1, 5)?;
//! assert_eq!(result.succeeded, 3);
//! assert_eq!(result.final_quantity, 0);
//! # Ok::<(), stockguard::StockError>(())
//! ```

pub use stockguard_concurrency::{
    DistributedLockStockUpdater, DistributedMutex, InMemoryLeaseLock, LeaseGuard, LockHolder,
    LockSettings, MetricsSnapshot, OptimisticStockUpdater, PessimisticStockUpdater, RetryConfig,
    StockUpdater, UnsynchronizedStockUpdater,
};
pub use stockguard_core::{
    NewStockRecord, RecordRef, RecordUpdate, StockError, StockId, StockRecord, StockResult,
    Strategy,
};
pub use stockguard_engine::{
    build_updater, seed_demo_records, ConcurrencyTestHarness, HarnessConfig, Inventory,
    StockConfig, StoreSettings, TestResult, CONFIG_FILE_NAME,
};
pub use stockguard_storage::{InMemoryStockStore, ReadHandle, ReadMode, StockStore, WriteMode};
