//! Optimistic updater: version-checked write with bounded retry
//!
//! Each attempt re-reads the record, so a conflict forces recomputation on
//! fresh data instead of a blind overwrite. Only `VersionConflict` is
//! retried; `InsufficientStock` and every other error end the call at once.
//!
//! ```text
//! for attempt in 0..max_attempts:
//!     load(VersionedWrite) -> compute -> save(VersionChecked)
//!     Ok            => return
//!     conflict      => sleep(delay(attempt)); continue
//!     other error   => return error
//! exhausted => LockContention
//! ```

use crate::metrics::{MetricsSnapshot, UpdaterMetrics};
use crate::retry::RetryConfig;
use crate::StockUpdater;
use std::sync::Arc;
use stockguard_core::{StockError, StockId, StockRecord, StockResult, Strategy};
use stockguard_storage::{ReadMode, StockStore};
use tracing::{debug, warn};

/// Outcome of a single optimistic attempt
enum Attempt {
    Committed(StockRecord),
    Conflict,
}

/// Version-checked read-modify-write with bounded retry
pub struct OptimisticStockUpdater<S: StockStore + ?Sized> {
    store: Arc<S>,
    retry: RetryConfig,
    metrics: UpdaterMetrics,
}

impl<S: StockStore + ?Sized> OptimisticStockUpdater<S> {
    /// Create an updater with the default retry policy
    pub fn new(store: Arc<S>) -> Self {
        Self::with_retry(store, RetryConfig::default())
    }

    /// Create an updater with an explicit retry policy
    pub fn with_retry(store: Arc<S>, retry: RetryConfig) -> Self {
        OptimisticStockUpdater {
            store,
            retry,
            metrics: UpdaterMetrics::new(),
        }
    }

    /// Retry policy in effect
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    fn attempt(&self, id: StockId, delta: i64) -> StockResult<Attempt> {
        self.metrics.record_attempt();
        let handle = self.store.load(id, ReadMode::VersionedWrite)?;
        let quantity = handle.record().adjusted_quantity(delta)?;
        let next = handle.record().with_quantity(quantity);
        match self.store.save(&next, handle.write_mode()) {
            Ok(committed) => Ok(Attempt::Committed(committed)),
            Err(e) if e.is_conflict() => {
                self.metrics.record_conflict();
                Ok(Attempt::Conflict)
            }
            Err(e) => Err(e),
        }
    }

    fn apply_with_retry(&self, id: StockId, delta: i64) -> StockResult<StockRecord> {
        let attempts = self.retry.attempts();
        for attempt in 0..attempts {
            match self.attempt(id, delta)? {
                Attempt::Committed(record) => {
                    debug!(
                        target: "stockguard::optimistic",
                        id = %id, delta, attempt, version = record.version,
                        "Adjustment committed"
                    );
                    return Ok(record);
                }
                Attempt::Conflict if attempt + 1 < attempts => {
                    debug!(target: "stockguard::optimistic", id = %id, attempt, "Version conflict, retrying");
                    std::thread::sleep(self.retry.calculate_delay(attempt));
                }
                Attempt::Conflict => {}
            }
        }
        warn!(target: "stockguard::optimistic", id = %id, attempts, "Retries exhausted");
        Err(StockError::LockContention { id, attempts })
    }
}

impl<S: StockStore + ?Sized> StockUpdater for OptimisticStockUpdater<S> {
    fn strategy(&self) -> Strategy {
        Strategy::Optimistic
    }

    fn apply(&self, id: StockId, delta: i64) -> StockResult<StockRecord> {
        let result = self.apply_with_retry(id, delta);
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
