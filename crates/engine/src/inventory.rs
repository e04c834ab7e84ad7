//! Caller-facing inventory operations
//!
//! `Inventory` owns the store, the lock coordinator and one long-lived
//! updater per strategy, so updater metrics accumulate across calls.
//! The configured strategy is the default; every adjustment can also name
//! a strategy explicitly for side-by-side comparison.

use crate::config::StockConfig;
use crate::harness::{ConcurrencyTestHarness, TestResult};
use crate::seed;
use std::sync::Arc;
use stockguard_concurrency::{
    DistributedLockStockUpdater, DistributedMutex, InMemoryLeaseLock, OptimisticStockUpdater,
    PessimisticStockUpdater, StockUpdater, UnsynchronizedStockUpdater,
};
use stockguard_core::{
    NewStockRecord, RecordUpdate, StockId, StockRecord, StockResult, Strategy,
};
use stockguard_storage::{InMemoryStockStore, StockStore, WriteMode};
use tracing::{debug, info, warn};

/// Build the updater for `strategy` over `store` with the given settings.
pub fn build_updater(
    strategy: Strategy,
    store: Arc<dyn StockStore>,
    mutex: Arc<dyn DistributedMutex>,
    config: &StockConfig,
) -> Arc<dyn StockUpdater> {
    match strategy {
        Strategy::Unsynchronized => Arc::new(UnsynchronizedStockUpdater::with_race_delay(
            store,
            config.store.race_delay(),
        )),
        Strategy::Optimistic => Arc::new(OptimisticStockUpdater::with_retry(
            store,
            config.retry.clone(),
        )),
        Strategy::Pessimistic => Arc::new(PessimisticStockUpdater::new(store)),
        Strategy::Distributed => Arc::new(DistributedLockStockUpdater::with_settings(
            store,
            mutex,
            config.lock.clone(),
        )),
    }
}

/// One updater per strategy, indexed by `Strategy`
struct Updaters {
    unsynchronized: Arc<dyn StockUpdater>,
    optimistic: Arc<dyn StockUpdater>,
    pessimistic: Arc<dyn StockUpdater>,
    distributed: Arc<dyn StockUpdater>,
}

impl Updaters {
    fn build(
        store: &Arc<dyn StockStore>,
        mutex: &Arc<dyn DistributedMutex>,
        config: &StockConfig,
    ) -> Self {
        let make = |s| build_updater(s, Arc::clone(store), Arc::clone(mutex), config);
        Updaters {
            unsynchronized: make(Strategy::Unsynchronized),
            optimistic: make(Strategy::Optimistic),
            pessimistic: make(Strategy::Pessimistic),
            distributed: make(Strategy::Distributed),
        }
    }

    fn get(&self, strategy: Strategy) -> &Arc<dyn StockUpdater> {
        match strategy {
            Strategy::Unsynchronized => &self.unsynchronized,
            Strategy::Optimistic => &self.optimistic,
            Strategy::Pessimistic => &self.pessimistic,
            Strategy::Distributed => &self.distributed,
        }
    }
}

/// Stock records plus the four ways of adjusting them
pub struct Inventory {
    store: Arc<dyn StockStore>,
    mutex: Arc<dyn DistributedMutex>,
    config: StockConfig,
    strategy: Strategy,
    updaters: Updaters,
    harness: ConcurrencyTestHarness,
}

impl Inventory {
    /// In-memory inventory built from `config`.
    ///
    /// Seeds the demo records when `seed_demo_data` is set.
    pub fn open(config: StockConfig) -> StockResult<Self> {
        let store: Arc<dyn StockStore> =
            Arc::new(InMemoryStockStore::with_latency(config.store.latency()));
        let mutex: Arc<dyn DistributedMutex> = Arc::new(InMemoryLeaseLock::new());
        let inventory = Self::with_parts(store, mutex, config)?;
        if inventory.config.seed_demo_data {
            inventory.seed_demo_records()?;
        }
        Ok(inventory)
    }

    /// Inventory over an explicit store and lock coordinator.
    pub fn with_parts(
        store: Arc<dyn StockStore>,
        mutex: Arc<dyn DistributedMutex>,
        config: StockConfig,
    ) -> StockResult<Self> {
        config.validate()?;
        let strategy = config.strategy()?;
        let updaters = Updaters::build(&store, &mutex, &config);
        let harness = ConcurrencyTestHarness::with_config(Arc::clone(&store), config.harness.clone());
        debug!(target: "stockguard::inventory", strategy = strategy.label(), "Inventory opened");
        Ok(Inventory {
            store,
            mutex,
            config,
            strategy,
            updaters,
            harness,
        })
    }

    /// Default strategy
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Configuration in effect
    pub fn config(&self) -> &StockConfig {
        &self.config
    }

    /// Underlying store
    pub fn store(&self) -> &Arc<dyn StockStore> {
        &self.store
    }

    /// Lock coordinator used by the distributed strategy
    pub fn lock_coordinator(&self) -> &Arc<dyn DistributedMutex> {
        &self.mutex
    }

    /// Long-lived updater for `strategy`
    pub fn updater(&self, strategy: Strategy) -> &Arc<dyn StockUpdater> {
        self.updaters.get(strategy)
    }

    // ========================================================================
    // Records
    // ========================================================================

    /// Create a record; fails with `DuplicateKey` if the SKU exists.
    pub fn create_record(&self, new: NewStockRecord) -> StockResult<StockRecord> {
        let record = self.store.insert(new)?;
        info!(target: "stockguard::inventory", id = %record.id, sku = %record.sku, quantity = record.quantity, "Record created");
        Ok(record)
    }

    /// Record by id
    pub fn get_by_id(&self, id: StockId) -> StockResult<StockRecord> {
        self.store.get(id)
    }

    /// Record by SKU
    pub fn get_by_sku(&self, sku: &str) -> StockResult<StockRecord> {
        self.store.find_by_sku(sku)
    }

    /// All records, ordered by id
    pub fn list_all(&self) -> StockResult<Vec<StockRecord>> {
        self.store.list()
    }

    /// Replace name, price and quantity, guarded by the caller's version.
    ///
    /// A stale version fails with `VersionConflict`; it is not retried.
    pub fn update_record(&self, id: StockId, update: RecordUpdate) -> StockResult<StockRecord> {
        update.validate()?;
        let current = self.store.get(id)?;
        let next = StockRecord {
            name: update.name,
            price: update.price,
            quantity: update.quantity,
            version: update.version,
            ..current
        };
        let committed = self.store.save(&next, WriteMode::VersionChecked)?;
        info!(target: "stockguard::inventory", id = %id, version = committed.version, "Record updated");
        Ok(committed)
    }

    /// Delete a record and free its SKU
    pub fn delete_record(&self, id: StockId) -> StockResult<()> {
        self.store.delete(id)?;
        info!(target: "stockguard::inventory", id = %id, "Record deleted");
        Ok(())
    }

    /// Create the demo records that are missing and return all of them.
    pub fn seed_demo_records(&self) -> StockResult<Vec<StockRecord>> {
        seed::seed_demo_records(self.store.as_ref())
    }

    // ========================================================================
    // Adjustments
    // ========================================================================

    /// Apply `delta` with the default strategy
    pub fn adjust_quantity(&self, id: StockId, delta: i64) -> StockResult<StockRecord> {
        self.adjust_quantity_with(self.strategy, id, delta)
    }

    /// Apply `delta` with an explicit strategy
    pub fn adjust_quantity_with(
        &self,
        strategy: Strategy,
        id: StockId,
        delta: i64,
    ) -> StockResult<StockRecord> {
        let record = self.updater(strategy).apply(id, delta)?;
        info!(
            target: "stockguard::inventory",
            strategy = strategy.label(), id = %id, delta, quantity = record.quantity,
            "Quantity adjusted"
        );
        Ok(record)
    }

    /// Run the concurrency harness with the default strategy
    ///
    /// See [`Inventory::run_concurrency_test_with`] for the optimistic
    /// contender bound.
    pub fn run_concurrency_test(
        &self,
        id: StockId,
        delta: i64,
        concurrency: usize,
    ) -> StockResult<TestResult> {
        self.run_concurrency_test_with(self.strategy, id, delta, concurrency)
    }

    /// Run the concurrency harness with an explicit strategy
    ///
    /// With the optimistic strategy, "enough stock means every invocation
    /// succeeds" only holds while `concurrency <= retry.max_attempts` (10 by
    /// default). Larger runs may report `LockContention` failures even though
    /// stock remains; raise `max_attempts` to cover them.
    pub fn run_concurrency_test_with(
        &self,
        strategy: Strategy,
        id: StockId,
        delta: i64,
        concurrency: usize,
    ) -> StockResult<TestResult> {
        if strategy == Strategy::Optimistic && !self.config.retry.covers_contenders(concurrency) {
            warn!(
                target: "stockguard::inventory",
                concurrency, max_attempts = self.config.retry.max_attempts,
                "More contenders than retry attempts; some may exhaust their retries"
            );
        }
        self.harness
            .run(self.updater(strategy).as_ref(), id, delta, concurrency)
    }
}
