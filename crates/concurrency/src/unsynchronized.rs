//! Unsynchronized baseline
//!
//! Plain read, compute, deliberate pause, plain write. No coordination of
//! any kind, so concurrent callers overwrite each other's decrements. This
//! exists only to demonstrate lost updates and must never back real traffic.

use crate::metrics::{MetricsSnapshot, UpdaterMetrics};
use crate::StockUpdater;
use std::sync::Arc;
use std::time::Duration;
use stockguard_core::{StockId, StockRecord, StockResult, Strategy};
use stockguard_storage::{ReadMode, StockStore};
use tracing::debug;

/// Default pause between read and write
pub const DEFAULT_RACE_DELAY: Duration = Duration::from_millis(10);

/// Read-modify-write without any concurrency control
pub struct UnsynchronizedStockUpdater<S: StockStore + ?Sized> {
    store: Arc<S>,
    race_delay: Duration,
    metrics: UpdaterMetrics,
}

impl<S: StockStore + ?Sized> UnsynchronizedStockUpdater<S> {
    /// Create an updater with the default 10ms race window
    pub fn new(store: Arc<S>) -> Self {
        Self::with_race_delay(store, DEFAULT_RACE_DELAY)
    }

    /// Create an updater with an explicit race window
    pub fn with_race_delay(store: Arc<S>, race_delay: Duration) -> Self {
        UnsynchronizedStockUpdater {
            store,
            race_delay,
            metrics: UpdaterMetrics::new(),
        }
    }

    fn racy_adjust(&self, id: StockId, delta: i64) -> StockResult<StockRecord> {
        self.metrics.record_attempt();
        let current = self.store.load(id, ReadMode::Plain)?.into_record();
        let quantity = current.adjusted_quantity(delta)?;
        if !self.race_delay.is_zero() {
            std::thread::sleep(self.race_delay);
        }
        let committed = self
            .store
            .save(&current.with_quantity(quantity), ReadMode::Plain.write_mode())?;
        debug!(target: "stockguard::unsynchronized", id = %id, delta, quantity, "Blind write");
        Ok(committed)
    }
}

impl<S: StockStore + ?Sized> StockUpdater for UnsynchronizedStockUpdater<S> {
    fn strategy(&self) -> Strategy {
        Strategy::Unsynchronized
    }

    fn apply(&self, id: StockId, delta: i64) -> StockResult<StockRecord> {
        let result = self.racy_adjust(id, delta);
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
