//! Distributed lock keys are free after every outcome

use crate::common::*;
use std::time::{Duration, Instant};
use stockguard::{LockHolder, LockSettings, Strategy};

fn assert_key_free(inv: &stockguard::Inventory, key: &str) {
    let checker = LockHolder::new();
    let start = Instant::now();
    let got = inv
        .lock_coordinator()
        .try_acquire(key, &checker, Duration::ZERO, Duration::from_secs(1))
        .unwrap();
    assert!(got, "key {} still held", key);
    assert!(start.elapsed() < Duration::from_millis(100));
    inv.lock_coordinator().release(key, &checker).unwrap();
}

#[test]
fn key_released_after_success_and_rejection() {
    let inv = inventory(10);
    let id = seed(&inv, Strategy::Distributed, "RELEASE", 2);
    let key = LockSettings::default().lock_key(id);

    let result = inv
        .run_concurrency_test_with(Strategy::Distributed, id, -1, 10)
        .unwrap();
    assert_eq!(result.succeeded, 2);
    assert_key_free(&inv, &key);

    inv.adjust_quantity_with(Strategy::Distributed, id, -1)
        .unwrap_err();
    assert_key_free(&inv, &key);
}

#[test]
fn key_released_after_not_found() {
    let inv = inventory(1);
    let id = seed(&inv, Strategy::Distributed, "GONE", 1);
    inv.delete_record(id).unwrap();
    let err = inv
        .adjust_quantity_with(Strategy::Distributed, id, -1)
        .unwrap_err();
    assert!(err.is_not_found());
    assert_key_free(&inv, &LockSettings::default().lock_key(id));
}

#[test]
fn held_key_times_out_then_recovers() {
    let mut config = test_config(1);
    config.lock = LockSettings::default().with_wait(Duration::from_millis(30));
    let inv = stockguard::Inventory::open(config).unwrap();
    let id = seed(&inv, Strategy::Distributed, "HELD", 5);
    let key = inv.config().lock.lock_key(id);

    let squatter = LockHolder::new();
    inv.lock_coordinator()
        .try_acquire(&key, &squatter, Duration::ZERO, Duration::from_secs(5))
        .unwrap();

    let err = inv
        .adjust_quantity_with(Strategy::Distributed, id, -1)
        .unwrap_err();
    assert_eq!(err.error_code(), "LockAcquisitionTimeout");
    assert_eq!(inv.get_by_id(id).unwrap().quantity, 5);

    inv.lock_coordinator().release(&key, &squatter).unwrap();
    assert_eq!(
        inv.adjust_quantity_with(Strategy::Distributed, id, -1)
            .unwrap()
            .quantity,
        4
    );
}

#[test]
fn abandoned_lease_expires_on_its_own() {
    let mut config = test_config(1);
    config.lock = LockSettings::default().with_wait(Duration::from_secs(2));
    let inv = stockguard::Inventory::open(config).unwrap();
    let id = seed(&inv, Strategy::Distributed, "CRASHED", 5);
    let key = inv.config().lock.lock_key(id);

    // A holder that never releases
    inv.lock_coordinator()
        .try_acquire(&key, &LockHolder::new(), Duration::ZERO, Duration::from_millis(40))
        .unwrap();

    let start = Instant::now();
    let record = inv
        .adjust_quantity_with(Strategy::Distributed, id, -1)
        .unwrap();
    assert_eq!(record.quantity, 4);
    assert!(start.elapsed() < Duration::from_secs(2));
}
