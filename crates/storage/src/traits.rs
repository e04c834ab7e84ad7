//! Persistence boundary
//!
//! `StockStore` is the single source of truth for quantity. Updaters reach it
//! through three read modes:
//!
//! | ReadMode | Blocks | Matching save |
//! |----------|--------|---------------|
//! | Plain | never | `WriteMode::Plain` (last writer wins) |
//! | Exclusive | other `Exclusive` readers of the same id | `WriteMode::Plain` |
//! | VersionedWrite | never | `WriteMode::VersionChecked` (fails on stale version) |
//!
//! An exclusive read returns a [`ReadHandle`] owning the row lock. The lock
//! is released when the handle is dropped, so every exit path of the caller
//! (success, `?`, panic unwind) releases it.

use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex};
use std::sync::Arc;
use stockguard_core::{NewStockRecord, StockId, StockRecord, StockResult};

/// How a record is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// No coordination
    Plain,
    /// Hold the row's exclusive lock until the handle is dropped
    Exclusive,
    /// Capture the version for a later version-checked save
    VersionedWrite,
}

impl ReadMode {
    /// Write mode a save following this read must use
    pub fn write_mode(&self) -> WriteMode {
        match self {
            ReadMode::VersionedWrite => WriteMode::VersionChecked,
            ReadMode::Plain | ReadMode::Exclusive => WriteMode::Plain,
        }
    }
}

/// How a record is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Overwrite unconditionally
    Plain,
    /// Succeed only if the stored version equals `record.version`
    VersionChecked,
}

/// Exclusive hold on one row
///
/// Dropping it releases the row for the next exclusive reader.
pub struct RowLock {
    _guard: ArcMutexGuard<RawMutex, ()>,
}

impl RowLock {
    /// Block until the row mutex is free, then hold it.
    pub fn acquire(row_mutex: &Arc<Mutex<()>>) -> Self {
        RowLock {
            _guard: row_mutex.lock_arc(),
        }
    }
}

impl std::fmt::Debug for RowLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RowLock")
    }
}

/// Result of a `load`
#[derive(Debug)]
pub struct ReadHandle {
    record: StockRecord,
    mode: ReadMode,
    row_lock: Option<RowLock>,
}

impl ReadHandle {
    /// Handle for a non-exclusive read
    pub fn unlocked(record: StockRecord, mode: ReadMode) -> Self {
        ReadHandle {
            record,
            mode,
            row_lock: None,
        }
    }

    /// Handle owning a row lock
    pub fn locked(record: StockRecord, row_lock: RowLock) -> Self {
        ReadHandle {
            record,
            mode: ReadMode::Exclusive,
            row_lock: Some(row_lock),
        }
    }

    /// The record as read
    pub fn record(&self) -> &StockRecord {
        &self.record
    }

    /// Consume the handle, releasing any row lock.
    pub fn into_record(self) -> StockRecord {
        self.record
    }

    /// Mode the record was read with
    pub fn mode(&self) -> ReadMode {
        self.mode
    }

    /// Write mode a save following this read must use
    pub fn write_mode(&self) -> WriteMode {
        self.mode.write_mode()
    }

    /// Whether this handle holds the row lock
    pub fn holds_row_lock(&self) -> bool {
        self.row_lock.is_some()
    }
}

/// Persistence boundary for stock records
///
/// Implementations must be safe to share across worker threads.
pub trait StockStore: Send + Sync {
    /// Create a record. Fails with `DuplicateKey` if the SKU exists.
    fn insert(&self, new: NewStockRecord) -> StockResult<StockRecord>;

    /// Read a record by id under `mode`.
    fn load(&self, id: StockId, mode: ReadMode) -> StockResult<ReadHandle>;

    /// Read a record by SKU (plain mode).
    fn find_by_sku(&self, sku: &str) -> StockResult<StockRecord>;

    /// All records ordered by id.
    fn list(&self) -> StockResult<Vec<StockRecord>>;

    /// Commit `record`'s mutable fields and return the committed record.
    ///
    /// The stored version is bumped by one and `updated_at` refreshed. With
    /// `WriteMode::VersionChecked`, a stored version different from
    /// `record.version` fails with `VersionConflict` and mutates nothing.
    fn save(&self, record: &StockRecord, mode: WriteMode) -> StockResult<StockRecord>;

    /// Remove a record, freeing its SKU.
    fn delete(&self, id: StockId) -> StockResult<()>;

    /// Convenience: plain read returning the record.
    fn get(&self, id: StockId) -> StockResult<StockRecord> {
        self.load(id, ReadMode::Plain).map(ReadHandle::into_record)
    }
}
