//! Results → human/json string formatting.
//!
//! - **Human** (default): aligned tables
//! - **JSON** (`--json`): `serde_json::to_string_pretty`

use stockguard_core::{StockError, StockRecord};
use stockguard_engine::TestResult;

/// Output formatting mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"serialization failed: {}\"}}", e))
}

/// Format an error.
pub fn format_error(err: &StockError, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => to_json(&serde_json::json!({
            "error": err.to_string(),
            "code": err.error_code(),
        })),
        OutputMode::Human => format!("(error) {}", err),
    }
}

/// Format a record listing.
pub fn format_records(records: &[StockRecord], mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => to_json(records),
        OutputMode::Human => {
            let mut out = format!(
                "{:>4}  {:<14} {:>8} {:>7}  {}",
                "ID", "SKU", "QTY", "VERSION", "NAME"
            );
            for r in records {
                out.push_str(&format!(
                    "\n{:>4}  {:<14} {:>8} {:>7}  {}",
                    r.id.as_u64(),
                    r.sku,
                    r.quantity,
                    r.version,
                    r.name
                ));
            }
            out
        }
    }
}

fn human_row(result: &TestResult, initial: u32, delta: i64) -> String {
    let kinds = result
        .failures_by_kind
        .iter()
        .map(|(k, n)| format!("{}={}", k, n))
        .collect::<Vec<_>>()
        .join(",");
    format!(
        "{:<22} {:>5} {:>9} {:>6} {:>8} {:>9} {:>10}  {}",
        result.strategy_label,
        result.total,
        result.succeeded,
        result.failed,
        result.final_quantity,
        result.elapsed_ms,
        if result.is_consistent(initial, delta) {
            "yes"
        } else {
            "LOST"
        },
        if kinds.is_empty() { "-".to_string() } else { kinds }
    )
}

fn human_header() -> String {
    format!(
        "{:<22} {:>5} {:>9} {:>6} {:>8} {:>9} {:>10}  {}",
        "STRATEGY", "TOTAL", "SUCCEEDED", "FAILED", "FINAL", "ELAPSED", "CONSISTENT", "FAILURES"
    )
}

/// Format harness results, one table row each.
pub fn format_results(results: &[TestResult], initial: u32, delta: i64, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => to_json(results),
        OutputMode::Human => {
            let mut out = human_header();
            for r in results {
                out.push('\n');
                out.push_str(&human_row(r, initial, delta));
            }
            out
        }
    }
}

/// Format one harness result.
pub fn format_result(result: &TestResult, initial: u32, delta: i64, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => to_json(result),
        OutputMode::Human => format_results(std::slice::from_ref(result), initial, delta, mode),
    }
}
