//! Leased mutual exclusion through an external coordinator
//!
//! The coordinator is reached through the [`DistributedMutex`] capability,
//! passed to the updater at construction. [`InMemoryLeaseLock`] is the
//! in-process coordinator used for single-node runs and tests.
//!
//! # How It Works
//!
//! 1. `try_acquire` grants the key to a holder token for `lease` time,
//!    waiting up to `wait` for the current holder to release or expire
//! 2. A lease lapses on its own when its TTL passes; the key is then free
//! 3. `release` is a no-op unless the caller's token still owns the lease
//!
//! [`LeaseGuard`] ties a grant to a scope and releases it on drop.

use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use stockguard_core::{saturating_millis, StockError, StockResult};
use tracing::{debug, warn};
use uuid::Uuid;

/// Identity of one lock acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LockHolder(Uuid);

impl LockHolder {
    /// Fresh random holder token
    pub fn new() -> Self {
        LockHolder(Uuid::new_v4())
    }
}

impl Default for LockHolder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LockHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Key-based mutex coordinated outside the calling process
pub trait DistributedMutex: Send + Sync {
    /// Try to grant `key` to `holder` for `lease`, waiting at most `wait`.
    ///
    /// Returns `Ok(false)` if the key stayed held for the whole wait window.
    fn try_acquire(
        &self,
        key: &str,
        holder: &LockHolder,
        wait: Duration,
        lease: Duration,
    ) -> StockResult<bool>;

    /// Whether `holder` currently owns an unexpired lease on `key`.
    fn is_held_by(&self, key: &str, holder: &LockHolder) -> bool;

    /// Release `key` if `holder` still owns it.
    ///
    /// Returns `Ok(false)` (not an error) when the lease already expired or
    /// belongs to someone else.
    fn release(&self, key: &str, holder: &LockHolder) -> StockResult<bool>;
}

/// Scoped ownership of a lease
///
/// Dropping the guard releases the lease if it is still held.
pub struct LeaseGuard<'a, M: DistributedMutex + ?Sized> {
    mutex: &'a M,
    key: String,
    holder: LockHolder,
}

impl<'a, M: DistributedMutex + ?Sized> LeaseGuard<'a, M> {
    /// Acquire `key` or fail with `LockAcquisitionTimeout`.
    pub fn acquire(mutex: &'a M, key: &str, wait: Duration, lease: Duration) -> StockResult<Self> {
        let holder = LockHolder::new();
        if !mutex.try_acquire(key, &holder, wait, lease)? {
            return Err(StockError::LockAcquisitionTimeout {
                key: key.to_string(),
                waited_ms: saturating_millis(wait),
            });
        }
        debug!(target: "stockguard::lease", key, holder = %holder, "Lock acquired");
        Ok(LeaseGuard {
            mutex,
            key: key.to_string(),
            holder,
        })
    }

    /// Lock key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether the lease is still ours
    pub fn is_held(&self) -> bool {
        self.mutex.is_held_by(&self.key, &self.holder)
    }
}

impl<M: DistributedMutex + ?Sized> Drop for LeaseGuard<'_, M> {
    fn drop(&mut self) {
        if !self.is_held() {
            debug!(target: "stockguard::lease", key = %self.key, "Lease already lapsed");
            return;
        }
        match self.mutex.release(&self.key, &self.holder) {
            Ok(_) => debug!(target: "stockguard::lease", key = %self.key, "Lock released"),
            Err(e) => warn!(target: "stockguard::lease", key = %self.key, error = %e, "Lock release failed"),
        }
    }
}

#[derive(Debug, Clone)]
struct Lease {
    holder: LockHolder,
    expires_at: Instant,
    sequence: u64,
}

impl Lease {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// In-process lease coordinator
///
/// Waiters park on a condition variable and wake on release, on the
/// current lease's expiry, or on their own wait deadline. Every grant gets
/// the next value of a monotonically increasing fencing sequence.
#[derive(Default)]
pub struct InMemoryLeaseLock {
    leases: Mutex<HashMap<String, Lease>>,
    changed: Condvar,
    sequence: AtomicU64,
}

impl InMemoryLeaseLock {
    /// Coordinator with no held keys
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys with an unexpired lease
    pub fn held_count(&self) -> usize {
        let now = Instant::now();
        self.leases.lock().values().filter(|l| l.is_live(now)).count()
    }

    /// Fencing sequence of the live lease on `key`, if any
    ///
    /// A later grant always carries a larger token, so a store can refuse a
    /// write tagged with a token older than the newest it has seen.
    pub fn fencing_token(&self, key: &str) -> Option<u64> {
        let now = Instant::now();
        self.leases
            .lock()
            .get(key)
            .filter(|l| l.is_live(now))
            .map(|l| l.sequence)
    }

    /// Whether any caller currently holds `key`
    pub fn is_locked(&self, key: &str) -> bool {
        let now = Instant::now();
        self.leases
            .lock()
            .get(key)
            .map_or(false, |l| l.is_live(now))
    }
}

impl DistributedMutex for InMemoryLeaseLock {
    fn try_acquire(
        &self,
        key: &str,
        holder: &LockHolder,
        wait: Duration,
        lease: Duration,
    ) -> StockResult<bool> {
        let deadline = Instant::now() + wait;
        let mut leases = self.leases.lock();
        loop {
            let now = Instant::now();
            let wake_at = match leases.get(key) {
                Some(current) if current.is_live(now) => current.expires_at.min(deadline),
                _ => {
                    leases.insert(
                        key.to_string(),
                        Lease {
                            holder: *holder,
                            expires_at: now + lease,
                            sequence: self.sequence.fetch_add(1, Ordering::Relaxed) + 1,
                        },
                    );
                    return Ok(true);
                }
            };
            if now >= deadline {
                return Ok(false);
            }
            self.changed.wait_until(&mut leases, wake_at);
        }
    }

    fn is_held_by(&self, key: &str, holder: &LockHolder) -> bool {
        let now = Instant::now();
        self.leases
            .lock()
            .get(key)
            .map_or(false, |l| l.holder == *holder && l.is_live(now))
    }

    fn release(&self, key: &str, holder: &LockHolder) -> StockResult<bool> {
        let now = Instant::now();
        let mut leases = self.leases.lock();
        let owned = leases
            .get(key)
            .map_or(false, |l| l.holder == *holder && l.is_live(now));
        if owned {
            leases.remove(key);
            self.changed.notify_all();
        }
        Ok(owned)
    }
}
