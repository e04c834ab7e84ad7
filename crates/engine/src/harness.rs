//! Concurrency test harness
//!
//! Drives N concurrent `apply(id, delta)` calls through one updater and
//! reports what happened. This is the only place in the crate that runs
//! operations in parallel.
//!
//! # How It Works
//!
//! 1. Confirm the record exists (an unknown id fails before any worker starts)
//! 2. Spawn `min(N, max_workers)` scoped workers that pull job numbers from a
//!    shared counter until all N are claimed
//! 3. Optionally park every worker on a start barrier before its first job
//! 4. Join all workers, then read the final quantity exactly once
//!
//! Every job is counted exactly once, so `succeeded + failed == total`. A job
//! whose updater panics is counted as an `Internal` failure and the worker
//! moves on to the next job.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::time::Instant;
use stockguard_concurrency::StockUpdater;
use stockguard_core::{saturating_millis, StockError, StockId, StockResult};
use stockguard_storage::StockStore;
use tracing::{debug, info, warn};

/// Worker pool settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Upper bound on worker threads for one run
    pub max_workers: usize,
    /// Hold every worker behind a barrier until all are ready
    pub start_barrier: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        HarnessConfig {
            max_workers: 1000,
            start_barrier: false,
        }
    }
}

/// Outcome statistics for one harness run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    /// Invocations launched
    pub total: usize,
    /// Invocations that committed
    pub succeeded: usize,
    /// Invocations that returned an error
    pub failed: usize,
    /// Wall-clock time from first launch to last completion
    pub elapsed_ms: u64,
    /// Quantity read once after every invocation finished
    pub final_quantity: u32,
    /// Display text of every failure, in completion order
    pub error_messages: Vec<String>,
    /// Strategy label, e.g. `PESSIMISTIC_WRITE`
    pub strategy_label: String,
    /// Failure count per error code
    pub failures_by_kind: BTreeMap<String, usize>,
    /// Version conflicts the updater observed during this run
    pub conflicts: u64,
}

impl TestResult {
    /// Failures of one kind, by error code
    pub fn failures_of(&self, code: &str) -> usize {
        self.failures_by_kind.get(code).copied().unwrap_or(0)
    }

    /// Whether the final quantity accounts for every committed delta
    ///
    /// `initial + succeeded * delta == final`. Only meaningful when every
    /// invocation used the same delta.
    pub fn is_consistent(&self, initial: u32, delta: i64) -> bool {
        i64::from(initial) + self.succeeded as i64 * delta == i64::from(self.final_quantity)
    }
}

#[derive(Default)]
struct Outcomes {
    error_messages: Vec<String>,
    failures_by_kind: BTreeMap<String, usize>,
}

impl Outcomes {
    fn record(&mut self, err: &StockError) {
        self.error_messages.push(err.to_string());
        *self
            .failures_by_kind
            .entry(err.error_code().to_string())
            .or_insert(0) += 1;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string payload"
    }
}

/// Runs concurrent adjustment batches against a store
pub struct ConcurrencyTestHarness {
    store: Arc<dyn StockStore>,
    config: HarnessConfig,
}

impl ConcurrencyTestHarness {
    /// Harness with the default worker pool
    pub fn new(store: Arc<dyn StockStore>) -> Self {
        Self::with_config(store, HarnessConfig::default())
    }

    /// Harness with explicit pool settings
    pub fn with_config(store: Arc<dyn StockStore>, config: HarnessConfig) -> Self {
        ConcurrencyTestHarness { store, config }
    }

    /// Pool settings in effect
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Fire `concurrency` concurrent `updater.apply(id, delta)` calls.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `concurrency` is zero, `NotFound` if `id` is unknown.
    /// Failures of individual invocations are reported in the result.
    pub fn run(
        &self,
        updater: &dyn StockUpdater,
        id: StockId,
        delta: i64,
        concurrency: usize,
    ) -> StockResult<TestResult> {
        if concurrency == 0 {
            return Err(StockError::invalid_input("concurrency must be at least 1"));
        }
        self.store.get(id)?;

        let workers = concurrency.min(self.config.max_workers.max(1));
        let barrier = self.config.start_barrier.then(|| Barrier::new(workers));
        let next_job = AtomicUsize::new(0);
        let succeeded = AtomicUsize::new(0);
        let outcomes = Mutex::new(Outcomes::default());
        let before = updater.metrics();

        debug!(
            target: "stockguard::harness",
            strategy = updater.strategy().label(), id = %id, delta, concurrency, workers,
            "Launching workers"
        );
        let start = Instant::now();
        std::thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| {
                    if let Some(barrier) = &barrier {
                        barrier.wait();
                    }
                    while next_job.fetch_add(1, Ordering::Relaxed) < concurrency {
                        match catch_unwind(AssertUnwindSafe(|| updater.apply(id, delta))) {
                            Ok(Ok(_)) => {
                                succeeded.fetch_add(1, Ordering::Relaxed);
                            }
                            Ok(Err(e)) => outcomes.lock().record(&e),
                            Err(payload) => {
                                let err = StockError::internal(format!(
                                    "worker panicked: {}",
                                    panic_message(&*payload)
                                ));
                                warn!(target: "stockguard::harness", id = %id, error = %err, "Job panicked");
                                outcomes.lock().record(&err);
                            }
                        }
                    }
                });
            }
        });
        let elapsed_ms = saturating_millis(start.elapsed());

        let final_quantity = self.store.get(id)?.quantity;
        let outcomes = outcomes.into_inner();
        let succeeded = succeeded.into_inner();
        let result = TestResult {
            total: concurrency,
            succeeded,
            failed: outcomes.error_messages.len(),
            elapsed_ms,
            final_quantity,
            error_messages: outcomes.error_messages,
            strategy_label: updater.strategy().label().to_string(),
            failures_by_kind: outcomes.failures_by_kind,
            conflicts: updater.metrics().since(&before).conflicts,
        };
        info!(
            target: "stockguard::harness",
            strategy = %result.strategy_label,
            total = result.total,
            succeeded = result.succeeded,
            failed = result.failed,
            final_quantity = result.final_quantity,
            elapsed_ms = result.elapsed_ms,
            "Concurrency test finished"
        );
        Ok(result)
    }
}
