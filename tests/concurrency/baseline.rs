//! The unsynchronized baseline loses updates
//!
//! These tests document the failure mode rather than assert correctness:
//! the harness must report it faithfully, not prevent it.

use crate::common::*;
use stockguard::{HarnessConfig, Inventory, Strategy};

#[test]
fn baseline_reports_lost_updates_faithfully() {
    let mut config = test_config(20);
    config.store.race_delay_ms = 20;
    config.harness = HarnessConfig {
        max_workers: 20,
        start_barrier: true,
    };
    let inv = Inventory::open(config).unwrap();
    let id = seed(&inv, Strategy::Unsynchronized, "NO-LOCK", 5);

    let result = inv
        .run_concurrency_test_with(Strategy::Unsynchronized, id, -1, 20)
        .unwrap();

    assert_accounted(&result);
    assert_eq!(result.strategy_label, "NO_LOCK");
    assert_eq!(result.final_quantity, inv.get_by_id(id).unwrap().quantity);
    // With every worker inside the same 20ms window, more calls report success
    // than the stock can cover.
    assert!(
        !result.is_consistent(5, -1),
        "expected lost updates, got {} successes and final {}",
        result.succeeded,
        result.final_quantity
    );
}

#[test]
fn baseline_never_produces_negative_stock() {
    let mut config = test_config(20);
    config.store.race_delay_ms = 5;
    let inv = Inventory::open(config).unwrap();
    let id = seed(&inv, Strategy::Unsynchronized, "NO-LOCK-FLOOR", 2);
    let result = inv
        .run_concurrency_test_with(Strategy::Unsynchronized, id, -1, 20)
        .unwrap();
    assert_accounted(&result);
    assert!(result.final_quantity <= 2);
}

#[test]
fn baseline_metrics_count_blind_writes() {
    let inv = inventory(8);
    let id = seed(&inv, Strategy::Unsynchronized, "NO-LOCK-METRICS", 100);
    let before = inv.updater(Strategy::Unsynchronized).metrics();
    let result = inv
        .run_concurrency_test_with(Strategy::Unsynchronized, id, -1, 8)
        .unwrap();
    let delta = inv.updater(Strategy::Unsynchronized).metrics().since(&before);
    assert_eq!(delta.committed as usize, result.succeeded);
    assert_eq!(delta.conflicts, 0);
}
