//! Concurrency layer for stockguard
//!
//! Four interchangeable stock updaters behind the [`StockUpdater`] trait:
//! - [`UnsynchronizedStockUpdater`]: no control at all (lost-update baseline)
//! - [`OptimisticStockUpdater`]: version-checked write, bounded retry
//! - [`PessimisticStockUpdater`]: exclusive row lock across read-modify-write
//! - [`DistributedLockStockUpdater`]: leased mutex from a [`DistributedMutex`]
//!
//! Every updater keeps its own [`UpdaterMetrics`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod distributed;
pub mod lease;
pub mod metrics;
pub mod optimistic;
pub mod pessimistic;
pub mod retry;
pub mod unsynchronized;

pub use distributed::{DistributedLockStockUpdater, LockSettings, DEFAULT_KEY_PREFIX};
pub use lease::{DistributedMutex, InMemoryLeaseLock, LeaseGuard, LockHolder};
pub use metrics::{MetricsSnapshot, UpdaterMetrics};
pub use optimistic::OptimisticStockUpdater;
pub use pessimistic::PessimisticStockUpdater;
pub use retry::RetryConfig;
pub use unsynchronized::{UnsynchronizedStockUpdater, DEFAULT_RACE_DELAY};

use stockguard_core::{StockId, StockRecord, StockResult, Strategy};

/// One way of applying a signed quantity delta to a stock record
///
/// Implementations must never leave the stored quantity negative. Whether
/// concurrent calls are serialized is up to the implementation; see
/// [`Strategy::prevents_lost_updates`].
pub trait StockUpdater: Send + Sync {
    /// Strategy this updater implements
    fn strategy(&self) -> Strategy;

    /// Apply `delta` to record `id` and return the committed record.
    fn apply(&self, id: StockId, delta: i64) -> StockResult<StockRecord>;

    /// Counters accumulated since construction
    fn metrics(&self) -> MetricsSnapshot;
}

impl<U: StockUpdater + ?Sized> StockUpdater for std::sync::Arc<U> {
    fn strategy(&self) -> Strategy {
        (**self).strategy()
    }

    fn apply(&self, id: StockId, delta: i64) -> StockResult<StockRecord> {
        (**self).apply(id, delta)
    }

    fn metrics(&self) -> MetricsSnapshot {
        (**self).metrics()
    }
}
