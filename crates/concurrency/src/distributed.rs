//! Distributed-lock updater
//!
//! Acquires a leased mutex keyed by the record id from an external
//! coordinator, then performs a plain read-modify-write. The lease is
//! re-checked just before the save: if it lapsed mid-update another holder
//! may already be inside the critical section, so the call fails with
//! `LeaseExpired` and writes nothing.
//!
//! The re-check narrows the window but does not close it: a lease that lapses
//! between the check and the save still lets a stale holder write. Closing it
//! needs a store that rejects writes carrying an older fencing token (see
//! `InMemoryLeaseLock::fencing_token`); `StockStore` takes no token, so leases
//! must stay well above the store's worst-case round trip.

use crate::lease::{DistributedMutex, LeaseGuard};
use crate::metrics::{MetricsSnapshot, UpdaterMetrics};
use crate::StockUpdater;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use stockguard_core::{
    saturating_millis, StockError, StockId, StockRecord, StockResult, Strategy,
};
use stockguard_storage::{ReadMode, StockStore};
use tracing::{debug, warn};

/// Lock key prefix; the key for id 7 is `stock:lock:7`
pub const DEFAULT_KEY_PREFIX: &str = "stock:lock:";

/// Timing and naming of distributed lock acquisitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockSettings {
    /// Longest time to wait for the lock, in milliseconds
    pub wait_ms: u64,
    /// Lease TTL after which the coordinator frees the key, in milliseconds
    pub lease_ms: u64,
    /// Prefix joined with the record id to form the lock key
    pub key_prefix: String,
}

impl Default for LockSettings {
    fn default() -> Self {
        LockSettings {
            wait_ms: 10_000,
            lease_ms: 3_000,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }
}

impl LockSettings {
    /// Set the wait window
    pub fn with_wait(mut self, wait: Duration) -> Self {
        self.wait_ms = saturating_millis(wait);
        self
    }

    /// Set the lease TTL
    pub fn with_lease(mut self, lease: Duration) -> Self {
        self.lease_ms = saturating_millis(lease);
        self
    }

    /// Wait window as a `Duration`
    pub fn wait(&self) -> Duration {
        Duration::from_millis(self.wait_ms)
    }

    /// Lease TTL as a `Duration`
    pub fn lease(&self) -> Duration {
        Duration::from_millis(self.lease_ms)
    }

    /// Lock key for a record
    pub fn lock_key(&self, id: StockId) -> String {
        format!("{}{}", self.key_prefix, id)
    }
}

/// Read-modify-write inside a leased distributed mutex
pub struct DistributedLockStockUpdater<S, M>
where
    S: StockStore + ?Sized,
    M: DistributedMutex + ?Sized,
{
    store: Arc<S>,
    mutex: Arc<M>,
    settings: LockSettings,
    metrics: UpdaterMetrics,
}

impl<S, M> DistributedLockStockUpdater<S, M>
where
    S: StockStore + ?Sized,
    M: DistributedMutex + ?Sized,
{
    /// Create an updater with default lock settings
    pub fn new(store: Arc<S>, mutex: Arc<M>) -> Self {
        Self::with_settings(store, mutex, LockSettings::default())
    }

    /// Create an updater with explicit lock settings
    pub fn with_settings(store: Arc<S>, mutex: Arc<M>, settings: LockSettings) -> Self {
        DistributedLockStockUpdater {
            store,
            mutex,
            settings,
            metrics: UpdaterMetrics::new(),
        }
    }

    /// Lock settings in effect
    pub fn settings(&self) -> &LockSettings {
        &self.settings
    }

    /// Adjust `id` while holding the lease on an explicit `key`.
    ///
    /// Callers that share a key across several records serialize them all.
    pub fn apply_with_key(&self, key: &str, id: StockId, delta: i64) -> StockResult<StockRecord> {
        let result = self.leased_adjust(key, id, delta);
        match &result {
            Ok(_) => self.metrics.record_commit(),
            Err(e) => self.metrics.record_failure(e),
        }
        result
    }

    fn leased_adjust(&self, key: &str, id: StockId, delta: i64) -> StockResult<StockRecord> {
        self.metrics.record_attempt();
        let guard = LeaseGuard::acquire(
            self.mutex.as_ref(),
            key,
            self.settings.wait(),
            self.settings.lease(),
        )?;

        let current = self.store.load(id, ReadMode::Plain)?.into_record();
        let quantity = current.adjusted_quantity(delta)?;

        if !guard.is_held() {
            warn!(target: "stockguard::distributed", key, id = %id, "Lease expired before commit");
            return Err(StockError::LeaseExpired {
                key: key.to_string(),
            });
        }
        let committed = self
            .store
            .save(&current.with_quantity(quantity), ReadMode::Plain.write_mode())?;
        debug!(target: "stockguard::distributed", key, id = %id, delta, quantity, "Adjustment committed");
        Ok(committed)
    }
}

impl<S, M> StockUpdater for DistributedLockStockUpdater<S, M>
where
    S: StockStore + ?Sized,
    M: DistributedMutex + ?Sized,
{
    fn strategy(&self) -> Strategy {
        Strategy::Distributed
    }

    fn apply(&self, id: StockId, delta: i64) -> StockResult<StockRecord> {
        let key = self.settings.lock_key(id);
        self.apply_with_key(&key, id, delta)
    }

    fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
