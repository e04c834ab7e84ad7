//! Concurrency discipline selector
//!
//! Strategies are chosen by configuration, not by type: the engine maps a
//! `Strategy` to a boxed updater at startup.

use crate::error::{StockError, StockResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The four ways an adjustment can be serialized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// No coordination; exposes lost updates
    Unsynchronized,
    /// Version-checked write with bounded retry
    Optimistic,
    /// Exclusive row lock held across read-modify-write
    Pessimistic,
    /// Leased external mutex around a plain read-modify-write
    Distributed,
}

impl Strategy {
    /// All strategies, baseline first
    pub const ALL: [Strategy; 4] = [
        Strategy::Unsynchronized,
        Strategy::Optimistic,
        Strategy::Pessimistic,
        Strategy::Distributed,
    ];

    /// Label reported in test results
    pub fn label(&self) -> &'static str {
        match self {
            Strategy::Unsynchronized => "NO_LOCK",
            Strategy::Optimistic => "OPTIMISTIC_WITH_RETRY",
            Strategy::Pessimistic => "PESSIMISTIC_WRITE",
            Strategy::Distributed => "DISTRIBUTED_LOCK",
        }
    }

    /// Name used in configuration files and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Unsynchronized => "unsynchronized",
            Strategy::Optimistic => "optimistic",
            Strategy::Pessimistic => "pessimistic",
            Strategy::Distributed => "distributed",
        }
    }

    /// Whether this strategy preserves every committed delta
    pub fn prevents_lost_updates(&self) -> bool {
        !matches!(self, Strategy::Unsynchronized)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = StockError;

    fn from_str(s: &str) -> StockResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "unsynchronized" | "none" | "no_lock" => Ok(Strategy::Unsynchronized),
            "optimistic" => Ok(Strategy::Optimistic),
            "pessimistic" => Ok(Strategy::Pessimistic),
            "distributed" | "distributed_lock" => Ok(Strategy::Distributed),
            other => Err(StockError::invalid_input(format!(
                "unknown strategy '{}'; expected unsynchronized, optimistic, pessimistic or distributed",
                other
            ))),
        }
    }
}
