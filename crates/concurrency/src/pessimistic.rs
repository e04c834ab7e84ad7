//! Pessimistic updater: exclusive row lock across read-modify-write
//!
//! Contention shows up as waiting time, not retries. The row lock lives in
//! the `ReadHandle`, so it is released on every exit path when the handle
//! goes out of scope. There is no acquisition timeout: a stuck holder stalls
//! every contender on that id.

use crate::metrics::{MetricsSnapshot, UpdaterMetrics};
use crate::StockUpdater;
use std::sync::Arc;
use stockguard_core::{StockId, StockRecord, StockResult, Strategy};
use stockguard_storage::{ReadMode, StockStore};
use tracing::debug;

/// Read-modify-write under the store's exclusive row lock
pub struct PessimisticStockUpdater<S: StockStore + ?Sized> {
    store: Arc<S>,
    metrics: UpdaterMetrics,
}

impl<S: StockStore + ?Sized> PessimisticStockUpdater<S> {
    /// Create an updater over `store`
    pub fn new(store: Arc<S>) -> Self {
        PessimisticStockUpdater {
            store,
            metrics: UpdaterMetrics::new(),
        }
    }

    fn locked_adjust(&self, id: StockId, delta: i64) -> StockResult<StockRecord> {
        self.metrics.record_attempt();
        let handle = self.store.load(id, ReadMode::Exclusive)?;
        let quantity = handle.record().adjusted_quantity(delta)?;
        let committed = self
            .store
            .save(&handle.record().with_quantity(quantity), handle.write_mode())?;
        drop(handle);
        debug!(target: "stockguard::pessimistic", id = %id, delta, quantity, "Adjustment committed");
        Ok(committed)
    }
}

impl<S: StockStore + ?Sized> StockUpdater for PessimisticStockUpdater<S> {
    fn strategy(&self) -> Strategy {
        Strategy::Pessimistic
    }

    fn apply(&self, id: StockId, delta: i64) -> StockResult<StockRecord> {
        let result = self.locked_adjust(id, delta);
        match &result {
            Ok(_) => self.metrics.record_commit(),
            Err(e) => self.metrics.record_failure(e),
        }
        result
    }

    fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
