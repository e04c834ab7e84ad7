//! Demo records, one per strategy

use stockguard_core::{NewStockRecord, StockError, StockRecord, StockResult};
use stockguard_storage::StockStore;
use tracing::info;

/// SKU, name, price and starting quantity of each demo record
pub const DEMO_RECORDS: [(&str, &str, u64, u32); 4] = [
    ("OPT-001", "Optimistic lock demo item", 10_000, 1),
    ("PES-001", "Pessimistic lock demo item", 20_000, 1),
    ("DLOCK-001", "Distributed lock demo item", 30_000, 1),
    ("NO-LOCK-001", "Unsynchronized demo item", 5_000, 5),
];

/// Create any missing demo record and return all four.
///
/// Existing records are returned as they are, so seeding twice is harmless.
pub fn seed_demo_records(store: &dyn StockStore) -> StockResult<Vec<StockRecord>> {
    let mut records = Vec::with_capacity(DEMO_RECORDS.len());
    for (sku, name, price, quantity) in DEMO_RECORDS {
        let record = match store.find_by_sku(sku) {
            Ok(existing) => existing,
            Err(e) if e.is_not_found() => {
                match store.insert(NewStockRecord::new(sku, name, price, quantity)) {
                    Ok(created) => {
                        info!(target: "stockguard::seed", sku, id = %created.id, quantity, "Seeded demo record");
                        created
                    }
                    // Lost a race with a concurrent seeder
                    Err(StockError::DuplicateKey { .. }) => store.find_by_sku(sku)?,
                    Err(e) => return Err(e),
                }
            }
            Err(e) => return Err(e),
        };
        records.push(record);
    }
    Ok(records)
}
