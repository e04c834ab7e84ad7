//! Shared helpers for the workspace integration suites

#![allow(dead_code)]

use stockguard::{
    Inventory, NewStockRecord, RetryConfig, StockConfig, StockId, Strategy, TestResult,
};

/// Config tuned for fast tests.
///
/// Optimistic attempts cover `max_contenders`, so any run of at most that many
/// contenders with enough stock always succeeds.
pub fn test_config(max_contenders: usize) -> StockConfig {
    let mut config = StockConfig::default();
    config.retry = RetryConfig::new()
        .with_max_attempts(max_contenders.max(10))
        .with_base_delay_ms(1)
        .with_max_delay_ms(4)
        .with_jitter(true);
    config
}

/// `test_config` on a store that sleeps `latency_ms` per load and save.
///
/// The start barrier lines every worker up, so optimistic contenders read the
/// same version and have to retry.
pub fn contended_config(max_contenders: usize, latency_ms: u64) -> StockConfig {
    let mut config = test_config(max_contenders);
    config.store.latency_ms = latency_ms;
    config.harness.start_barrier = true;
    config
}

pub fn inventory(max_contenders: usize) -> Inventory {
    Inventory::open(test_config(max_contenders)).expect("open inventory")
}

/// Create a record with a SKU unique to the strategy and label
pub fn seed(inv: &Inventory, strategy: Strategy, label: &str, quantity: u32) -> StockId {
    inv.create_record(NewStockRecord::new(
        format!("{}-{}", label, strategy.as_str()),
        format!("{} / {}", label, strategy),
        1_000,
        quantity,
    ))
    .expect("create record")
    .id
}

/// Strategies that promise no lost updates
pub fn safe_strategies() -> impl Iterator<Item = Strategy> {
    Strategy::ALL
        .into_iter()
        .filter(|s| s.prevents_lost_updates())
}

pub fn assert_accounted(result: &TestResult) {
    assert_eq!(
        result.succeeded + result.failed,
        result.total,
        "{}: every invocation counted once",
        result.strategy_label
    );
    assert_eq!(result.error_messages.len(), result.failed);
    assert_eq!(
        result.failures_by_kind.values().sum::<usize>(),
        result.failed
    );
}

