//! Per-updater outcome counters
//!
//! # Memory Ordering
//!
//! All counters use Relaxed ordering: they are observational only and do not
//! synchronize any other memory. A snapshot taken while operations are in
//! flight may be momentarily inconsistent across fields.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use stockguard_core::StockError;

/// Live counters owned by one updater
#[derive(Debug, Default)]
pub struct UpdaterMetrics {
    attempts: AtomicU64,
    committed: AtomicU64,
    conflicts: AtomicU64,
    rejected: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time copy of [`UpdaterMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Read-modify-write attempts started (retries count separately)
    pub attempts: u64,
    /// Adjustments committed
    pub committed: u64,
    /// Version conflicts observed
    pub conflicts: u64,
    /// Adjustments rejected for insufficient stock
    pub rejected: u64,
    /// Adjustments that failed for any other reason
    pub failed: u64,
}

impl UpdaterMetrics {
    /// Fresh zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the start of one read-modify-write attempt
    pub fn record_attempt(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a version conflict
    pub fn record_conflict(&self) {
        self.conflicts.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a committed adjustment
    pub fn record_commit(&self) {
        self.committed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the terminal failure of an adjustment
    pub fn record_failure(&self, err: &StockError) {
        match err {
            StockError::InsufficientStock { .. } => {
                self.rejected.fetch_add(1, Ordering::Relaxed);
            }
            _ => {
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Copy the current values
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            attempts: self.attempts.load(Ordering::Relaxed),
            committed: self.committed.load(Ordering::Relaxed),
            conflicts: self.conflicts.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

impl MetricsSnapshot {
    /// Counter growth between `earlier` and `self` (saturating)
    pub fn since(&self, earlier: &MetricsSnapshot) -> MetricsSnapshot {
        MetricsSnapshot {
            attempts: self.attempts.saturating_sub(earlier.attempts),
            committed: self.committed.saturating_sub(earlier.committed),
            conflicts: self.conflicts.saturating_sub(earlier.conflicts),
            rejected: self.rejected.saturating_sub(earlier.rejected),
            failed: self.failed.saturating_sub(earlier.failed),
        }
    }
}
