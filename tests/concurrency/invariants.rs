//! Invariants that hold for every contention level
//!
//! - Safe strategies with Q ≥ N: all N succeed and final = Q - N, including
//!   when optimistic contenders collide and retry
//! - Every strategy with N > Q: final ≥ 0; safe strategies sell exactly Q
//! - Repeated adjustments are never de-duplicated

use crate::common::*;
use stockguard::{Inventory, StockConfig, Strategy};

#[test]
fn safe_strategies_conserve_when_stock_suffices() {
    let n = 20;
    let q = 25;
    let inv = inventory(n);
    for strategy in safe_strategies() {
        let id = seed(&inv, strategy, "ENOUGH", q);
        let result = inv.run_concurrency_test_with(strategy, id, -1, n).unwrap();

        assert_accounted(&result);
        assert_eq!(result.succeeded, n, "{}: {:?}", strategy, result.error_messages);
        assert_eq!(result.failed, 0, "{}", strategy);
        assert_eq!(result.final_quantity, q - n as u32, "{}", strategy);
        assert!(result.is_consistent(q, -1));
    }
}

#[test]
fn optimistic_retries_conserve_under_latency() {
    let n = 30;
    let q = 100;
    let inv = Inventory::open(contended_config(n, 3)).unwrap();
    let id = seed(&inv, Strategy::Optimistic, "RETRY", q);
    let result = inv
        .run_concurrency_test_with(Strategy::Optimistic, id, -1, n)
        .unwrap();

    assert_accounted(&result);
    assert!(result.conflicts > 0, "no contender ever retried");
    assert_eq!(result.succeeded, n, "{:?}", result.error_messages);
    assert_eq!(result.final_quantity, q - n as u32);
    assert!(result.is_consistent(q, -1));
}

#[test]
fn default_retry_covers_max_attempts_contenders() {
    // Fixed 50 ms wakes every loser together: one commit per round
    let mut config = StockConfig::default();
    config.store.latency_ms = 3;
    config.harness.start_barrier = true;
    let n = config.retry.max_attempts;
    assert!(config.retry.covers_contenders(n));

    let inv = Inventory::open(config).unwrap();
    let id = seed(&inv, Strategy::Optimistic, "DEFAULT-BOUND", 30);
    let result = inv
        .run_concurrency_test_with(Strategy::Optimistic, id, -1, n)
        .unwrap();

    assert_accounted(&result);
    assert!(result.conflicts > 0);
    assert_eq!(result.succeeded, n, "{:?}", result.error_messages);
    assert_eq!(result.final_quantity, 30 - n as u32);
}

#[test]
fn safe_strategies_conserve_exactly_at_q_equals_n() {
    let n = 12;
    let inv = inventory(n);
    for strategy in safe_strategies() {
        let id = seed(&inv, strategy, "EXACT", n as u32);
        let result = inv.run_concurrency_test_with(strategy, id, -1, n).unwrap();
        assert_eq!(result.succeeded, n, "{}", strategy);
        assert_eq!(result.final_quantity, 0, "{}", strategy);
    }
}

#[test]
fn safe_strategies_sell_exactly_available_stock() {
    let n = 15;
    let q = 4;
    let inv = inventory(n);
    for strategy in safe_strategies() {
        let id = seed(&inv, strategy, "SCARCE", q);
        let result = inv.run_concurrency_test_with(strategy, id, -1, n).unwrap();

        assert_accounted(&result);
        assert_eq!(result.succeeded, q as usize, "{}", strategy);
        assert_eq!(result.final_quantity, 0, "{}", strategy);
        assert_eq!(result.failures_of("InsufficientStock"), n - q as usize, "{}", strategy);
    }
}

#[test]
fn no_strategy_goes_negative() {
    let n = 20;
    let inv = inventory(n);
    for strategy in Strategy::ALL {
        let id = seed(&inv, strategy, "FLOOR", 3);
        let result = inv.run_concurrency_test_with(strategy, id, -1, n).unwrap();
        assert_accounted(&result);
        assert!(result.final_quantity <= 3, "{}", strategy);
        assert!(result.succeeded >= 1, "{}", strategy);
    }
}

#[test]
fn oversized_decrement_is_rejected_without_mutation() {
    let inv = inventory(4);
    for strategy in Strategy::ALL {
        let id = seed(&inv, strategy, "BULK", 3);
        let err = inv.adjust_quantity_with(strategy, id, -4).unwrap_err();
        assert_eq!(err.error_code(), "InsufficientStock", "{}", strategy);
        assert_eq!(inv.get_by_id(id).unwrap().quantity, 3);
    }
}

#[test]
fn repeated_adjustments_all_apply() {
    let inv = inventory(4);
    for strategy in Strategy::ALL {
        let id = seed(&inv, strategy, "REPEAT", 10);
        inv.adjust_quantity_with(strategy, id, -2).unwrap();
        inv.adjust_quantity_with(strategy, id, -2).unwrap();
        assert_eq!(inv.get_by_id(id).unwrap().quantity, 6, "{}", strategy);
    }
}

#[test]
fn optimistic_version_tracks_commits() {
    let n = 16;
    let inv = inventory(n);
    let id = seed(&inv, Strategy::Optimistic, "VERSION", 50);
    let before = inv.get_by_id(id).unwrap().version;
    let result = inv
        .run_concurrency_test_with(Strategy::Optimistic, id, -1, n)
        .unwrap();
    let after = inv.get_by_id(id).unwrap().version;
    assert_eq!(after - before, result.succeeded as u64);
}
