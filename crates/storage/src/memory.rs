//! In-memory stock store
//!
//! Rows live in a `DashMap` keyed by id; a second `DashMap` maps SKU to id
//! and doubles as the uniqueness constraint (the SKU entry is held while the
//! row is created). Each row carries two locks:
//! - `record`: short critical section around a single read or save
//! - `exclusive`: the row lock held by `ReadMode::Exclusive` readers across
//!   their whole read-modify-write
//!
//! Optional simulated latency is slept on every `load` and `save` so that
//! serialized critical sections take measurable time.

use crate::traits::{ReadHandle, ReadMode, RowLock, StockStore, WriteMode};
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use stockguard_core::{
    NewStockRecord, RecordRef, StockError, StockId, StockRecord, StockResult,
};
use tracing::debug;

struct Row {
    record: Mutex<StockRecord>,
    exclusive: Arc<Mutex<()>>,
}

/// Thread-safe in-memory implementation of [`StockStore`]
pub struct InMemoryStockStore {
    rows: DashMap<StockId, Arc<Row>>,
    skus: DashMap<String, StockId>,
    next_id: AtomicU64,
    latency: Duration,
}

impl InMemoryStockStore {
    /// Create an empty store without simulated latency
    pub fn new() -> Self {
        Self::with_latency(Duration::ZERO)
    }

    /// Create an empty store that sleeps `latency` on every load and save
    pub fn with_latency(latency: Duration) -> Self {
        InMemoryStockStore {
            rows: DashMap::new(),
            skus: DashMap::new(),
            next_id: AtomicU64::new(0),
            latency,
        }
    }

    /// Simulated round-trip latency
    pub fn latency(&self) -> Duration {
        self.latency
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if no records exist
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn row(&self, id: StockId) -> StockResult<Arc<Row>> {
        // Clone the Arc out so no shard lock is held while blocking on the row.
        self.rows
            .get(&id)
            .map(|r| Arc::clone(r.value()))
            .ok_or(StockError::NotFound(RecordRef::Id(id)))
    }

    fn simulate_round_trip(&self) {
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
    }
}

impl Default for InMemoryStockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StockStore for InMemoryStockStore {
    fn insert(&self, new: NewStockRecord) -> StockResult<StockRecord> {
        new.validate()?;
        match self.skus.entry(new.sku.clone()) {
            Entry::Occupied(_) => Err(StockError::DuplicateKey { sku: new.sku }),
            Entry::Vacant(slot) => {
                let id = StockId::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
                let now = Utc::now();
                let record = StockRecord {
                    id,
                    sku: new.sku,
                    name: new.name,
                    price: new.price,
                    quantity: new.quantity,
                    version: 0,
                    created_at: now,
                    updated_at: now,
                };
                self.rows.insert(
                    id,
                    Arc::new(Row {
                        record: Mutex::new(record.clone()),
                        exclusive: Arc::new(Mutex::new(())),
                    }),
                );
                slot.insert(id);
                debug!(target: "stockguard::store", id = %id, sku = %record.sku, "Record inserted");
                Ok(record)
            }
        }
    }

    fn load(&self, id: StockId, mode: ReadMode) -> StockResult<ReadHandle> {
        let row = self.row(id)?;
        let handle = match mode {
            ReadMode::Exclusive => {
                let lock = RowLock::acquire(&row.exclusive);
                // The row may have been deleted while we waited.
                if !self.rows.contains_key(&id) {
                    return Err(StockError::NotFound(RecordRef::Id(id)));
                }
                let record = row.record.lock().clone();
                ReadHandle::locked(record, lock)
            }
            ReadMode::Plain | ReadMode::VersionedWrite => {
                let record = row.record.lock().clone();
                ReadHandle::unlocked(record, mode)
            }
        };
        self.simulate_round_trip();
        Ok(handle)
    }

    fn find_by_sku(&self, sku: &str) -> StockResult<StockRecord> {
        let id = self
            .skus
            .get(sku)
            .map(|r| *r.value())
            .ok_or_else(|| StockError::NotFound(RecordRef::Sku(sku.to_string())))?;
        self.get(id).map_err(|e| match e {
            StockError::NotFound(_) => StockError::NotFound(RecordRef::Sku(sku.to_string())),
            other => other,
        })
    }

    fn list(&self) -> StockResult<Vec<StockRecord>> {
        let mut records: Vec<StockRecord> = self
            .rows
            .iter()
            .map(|r| r.value().record.lock().clone())
            .collect();
        records.sort_by_key(|r| r.id);
        Ok(records)
    }

    fn save(&self, record: &StockRecord, mode: WriteMode) -> StockResult<StockRecord> {
        let row = self.row(record.id)?;
        self.simulate_round_trip();

        let mut stored = row.record.lock();
        // A delete during the round trip leaves `row` orphaned.
        if !self.rows.contains_key(&record.id) {
            return Err(StockError::NotFound(RecordRef::Id(record.id)));
        }
        if stored.sku != record.sku {
            return Err(StockError::invalid_input(format!(
                "sku of record {} is immutable",
                record.id
            )));
        }
        if mode == WriteMode::VersionChecked && stored.version != record.version {
            return Err(StockError::VersionConflict {
                id: record.id,
                expected: record.version,
                actual: stored.version,
            });
        }

        // Quantity and version change together under the row mutex.
        stored.name = record.name.clone();
        stored.price = record.price;
        stored.quantity = record.quantity;
        stored.version += 1;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    fn delete(&self, id: StockId) -> StockResult<()> {
        let (_, row) = self
            .rows
            .remove(&id)
            .ok_or(StockError::NotFound(RecordRef::Id(id)))?;
        let sku = row.record.lock().sku.clone();
        self.skus.remove(&sku);
        debug!(target: "stockguard::store", id = %id, sku = %sku, "Record deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::thread;
    use std::time::Instant;

    fn seed(store: &InMemoryStockStore, sku: &str, quantity: u32) -> StockRecord {
        store
            .insert(NewStockRecord::new(sku, "test item", 1000, quantity))
            .unwrap()
    }

    #[test]
    fn test_insert_assigns_sequential_ids() {
        let store = InMemoryStockStore::new();
        let a = seed(&store, "A", 1);
        let b = seed(&store, "B", 2);
        assert_eq!(a.id, StockId::new(1));
        assert_eq!(b.id, StockId::new(2));
        assert_eq!(a.version, 0);
        assert_eq!(a.created_at, a.updated_at);
    }

    #[test]
    fn test_insert_duplicate_sku_leaves_existing_untouched() {
        let store = InMemoryStockStore::new();
        let original = seed(&store, "DUP", 3);

        let err = store
            .insert(NewStockRecord::new("DUP", "other", 5, 99))
            .unwrap_err();
        assert_eq!(
            err,
            StockError::DuplicateKey {
                sku: "DUP".to_string()
            }
        );
        assert_eq!(store.find_by_sku("DUP").unwrap(), original);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_insert_rejects_invalid_request() {
        let store = InMemoryStockStore::new();
        let err = store.insert(NewStockRecord::new("", "x", 0, 0)).unwrap_err();
        assert_eq!(err.error_code(), "InvalidInput");
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let store = InMemoryStockStore::new();
        for mode in [ReadMode::Plain, ReadMode::Exclusive, ReadMode::VersionedWrite] {
            let err = store.load(StockId::new(42), mode).unwrap_err();
            assert!(err.is_not_found());
        }
    }

    #[test]
    fn test_find_by_sku_missing_reports_sku() {
        let store = InMemoryStockStore::new();
        let err = store.find_by_sku("NOPE").unwrap_err();
        assert_eq!(err, StockError::NotFound(RecordRef::Sku("NOPE".into())));
    }

    #[test]
    fn test_plain_save_bumps_version_and_timestamp() {
        let store = InMemoryStockStore::new();
        let r = seed(&store, "A", 5);
        let saved = store.save(&r.with_quantity(4), WriteMode::Plain).unwrap();
        assert_eq!(saved.quantity, 4);
        assert_eq!(saved.version, 1);
        assert!(saved.updated_at >= r.updated_at);
        assert_eq!(saved.created_at, r.created_at);
    }

    #[test]
    fn test_version_checked_save_rejects_stale_version() {
        let store = InMemoryStockStore::new();
        let r = seed(&store, "A", 5);

        let first = store.load(r.id, ReadMode::VersionedWrite).unwrap();
        let second = store.load(r.id, ReadMode::VersionedWrite).unwrap();

        let next = first.record().with_quantity(4);
        store.save(&next, first.write_mode()).unwrap();

        let stale = second.record().with_quantity(4);
        let err = store.save(&stale, second.write_mode()).unwrap_err();
        assert_eq!(
            err,
            StockError::VersionConflict {
                id: r.id,
                expected: 0,
                actual: 1
            }
        );

        // Failed save performed no mutation
        let current = store.get(r.id).unwrap();
        assert_eq!(current.quantity, 4);
        assert_eq!(current.version, 1);
    }

    #[test]
    fn test_save_rejects_sku_change() {
        let store = InMemoryStockStore::new();
        let r = seed(&store, "A", 5);
        let mut changed = r.clone();
        changed.sku = "B".to_string();
        let err = store.save(&changed, WriteMode::Plain).unwrap_err();
        assert_eq!(err.error_code(), "InvalidInput");
        assert_eq!(store.get(r.id).unwrap().sku, "A");
    }

    #[test]
    fn test_exclusive_load_blocks_second_exclusive_reader() {
        let store = Arc::new(InMemoryStockStore::new());
        let r = seed(&store, "A", 5);

        let handle = store.load(r.id, ReadMode::Exclusive).unwrap();
        assert!(handle.holds_row_lock());

        let acquired = Arc::new(AtomicBool::new(false));
        let waiter = {
            let store = Arc::clone(&store);
            let acquired = Arc::clone(&acquired);
            thread::spawn(move || {
                let h = store.load(r.id, ReadMode::Exclusive).unwrap();
                acquired.store(true, Ordering::SeqCst);
                h.into_record()
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!acquired.load(Ordering::SeqCst), "second exclusive reader must wait");

        // Plain readers are not blocked
        assert_eq!(store.get(r.id).unwrap().quantity, 5);

        drop(handle);
        let seen = waiter.join().unwrap();
        assert!(acquired.load(Ordering::SeqCst));
        assert_eq!(seen.quantity, 5);
    }

    #[test]
    fn test_exclusive_waiter_sees_deleted_row_as_not_found() {
        let store = Arc::new(InMemoryStockStore::new());
        let r = seed(&store, "A", 5);
        let handle = store.load(r.id, ReadMode::Exclusive).unwrap();

        let waiter = {
            let store = Arc::clone(&store);
            thread::spawn(move || store.load(r.id, ReadMode::Exclusive).map(|h| h.into_record()))
        };
        thread::sleep(Duration::from_millis(20));
        store.delete(r.id).unwrap();
        drop(handle);

        assert!(waiter.join().unwrap().unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete_frees_sku() {
        let store = InMemoryStockStore::new();
        let r = seed(&store, "A", 1);
        store.delete(r.id).unwrap();
        assert!(store.get(r.id).unwrap_err().is_not_found());
        assert!(store.delete(r.id).unwrap_err().is_not_found());

        let again = seed(&store, "A", 2);
        assert_ne!(again.id, r.id, "ids are never reused");
    }

    #[test]
    fn test_list_is_ordered_by_id() {
        let store = InMemoryStockStore::new();
        for i in 0..20 {
            seed(&store, &format!("SKU-{}", i), i);
        }
        let ids: Vec<u64> = store.list().unwrap().iter().map(|r| r.id.as_u64()).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
        assert_eq!(ids.len(), 20);
    }

    #[test]
    fn test_save_after_concurrent_delete_is_not_found() {
        let store = Arc::new(InMemoryStockStore::with_latency(Duration::from_millis(60)));
        let r = seed(&store, "GONE", 5);
        let mut changed = r.clone();
        changed.quantity = 4;

        let writer = {
            let store = Arc::clone(&store);
            thread::spawn(move || store.save(&changed, WriteMode::Plain))
        };
        // The writer is inside its round trip when the row goes away.
        thread::sleep(Duration::from_millis(15));
        store.delete(r.id).unwrap();

        let err = writer.join().unwrap().unwrap_err();
        assert!(err.is_not_found());
        assert!(store.get(r.id).unwrap_err().is_not_found());
        assert!(store.find_by_sku("GONE").unwrap_err().is_not_found());
    }

    #[test]
    fn test_latency_is_applied_on_load() {
        let store = InMemoryStockStore::with_latency(Duration::from_millis(20));
        let r = seed(&store, "A", 1);
        let start = Instant::now();
        store.get(r.id).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
