//! One unit of stock, ten buyers
//!
//! Each strategy gets a record with quantity 1 and ten concurrent `-1`
//! adjustments. Exactly one buyer wins.

use crate::common::*;
use stockguard::{Inventory, NewStockRecord, StockConfig, Strategy};

const BUYERS: usize = 10;

#[test]
fn scenario_optimistic_single_unit() {
    let inv = Inventory::open(contended_config(BUYERS, 3)).unwrap();
    let id = seed(&inv, Strategy::Optimistic, "OPT", 1);
    let result = inv
        .run_concurrency_test_with(Strategy::Optimistic, id, -1, BUYERS)
        .unwrap();

    assert_accounted(&result);
    assert!(result.conflicts > 0, "buyers never collided");
    assert_eq!(result.succeeded, 1);
    assert_eq!(result.failed, BUYERS - 1);
    assert_eq!(result.final_quantity, 0);
    assert_eq!(
        result.failures_of("InsufficientStock") + result.failures_of("LockContention"),
        BUYERS - 1
    );
    assert_eq!(result.strategy_label, "OPTIMISTIC_WITH_RETRY");
}

#[test]
fn scenario_optimistic_single_unit_with_default_retry() {
    // Ten default attempts: losers end in either failure kind, never a second sale
    let mut config = StockConfig::default();
    config.harness.start_barrier = true;
    let inv = Inventory::open(config).unwrap();
    let id = seed(&inv, Strategy::Optimistic, "OPT-DEFAULT", 1);
    let result = inv
        .run_concurrency_test_with(Strategy::Optimistic, id, -1, BUYERS)
        .unwrap();
    assert_eq!(result.succeeded, 1);
    assert_eq!(result.final_quantity, 0);
}

#[test]
fn scenario_pessimistic_single_unit_is_serialized() {
    let latency_ms = 5;
    let mut config = test_config(BUYERS);
    config.store.latency_ms = latency_ms;
    let inv = Inventory::open(config).unwrap();
    let id = seed(&inv, Strategy::Pessimistic, "PES", 1);

    let result = inv
        .run_concurrency_test_with(Strategy::Pessimistic, id, -1, BUYERS)
        .unwrap();

    assert_accounted(&result);
    assert_eq!(result.succeeded, 1);
    assert_eq!(result.failures_of("InsufficientStock"), BUYERS - 1);
    assert_eq!(result.final_quantity, 0);
    assert_eq!(result.strategy_label, "PESSIMISTIC_WRITE");

    // Each buyer holds the row lock for at least one simulated load, one
    // after another; a parallel run would finish in roughly one latency.
    assert!(
        result.elapsed_ms >= BUYERS as u64 * latency_ms,
        "elapsed {}ms is not serialized",
        result.elapsed_ms
    );
}

#[test]
fn scenario_distributed_single_unit() {
    let inv = inventory(BUYERS);
    let id = seed(&inv, Strategy::Distributed, "DLOCK", 1);
    let result = inv
        .run_concurrency_test_with(Strategy::Distributed, id, -1, BUYERS)
        .unwrap();

    assert_accounted(&result);
    assert_eq!(result.succeeded, 1);
    assert_eq!(result.failures_of("InsufficientStock"), BUYERS - 1);
    assert_eq!(result.final_quantity, 0);
    assert_eq!(result.strategy_label, "DISTRIBUTED_LOCK");
}

#[test]
fn scenario_duplicate_sku_leaves_existing_untouched() {
    let inv = inventory(1);
    let original = inv
        .create_record(NewStockRecord::new("DUP-SKU", "original", 700, 9))
        .unwrap();

    let err = inv
        .create_record(NewStockRecord::new("DUP-SKU", "impostor", 1, 0))
        .unwrap_err();
    assert_eq!(err.error_code(), "DuplicateKey");
    assert_eq!(inv.get_by_sku("DUP-SKU").unwrap(), original);
    assert_eq!(inv.list_all().unwrap().len(), 1);
}

#[test]
fn scenario_demo_records_behave_as_advertised() {
    let inv = inventory(BUYERS);
    inv.seed_demo_records().unwrap();
    for (sku, strategy) in [
        ("OPT-001", Strategy::Optimistic),
        ("PES-001", Strategy::Pessimistic),
        ("DLOCK-001", Strategy::Distributed),
    ] {
        let id = inv.get_by_sku(sku).unwrap().id;
        let result = inv.run_concurrency_test_with(strategy, id, -1, BUYERS).unwrap();
        assert_eq!(result.succeeded, 1, "{}", sku);
        assert_eq!(result.final_quantity, 0, "{}", sku);
    }
}
