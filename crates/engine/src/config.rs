//! Inventory configuration via `stockguard.toml`
//!
//! Every field has a default, so an empty file is a valid configuration.
//! `stockguard config-init` writes the commented default below.

use crate::harness::HarnessConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use stockguard_concurrency::{LockSettings, RetryConfig};
use stockguard_core::{StockError, StockResult, Strategy};

/// Config file name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "stockguard.toml";

/// Simulated store behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Round-trip latency slept on every load and save, in milliseconds
    pub latency_ms: u64,
    /// Pause between read and write in the unsynchronized baseline
    pub race_delay_ms: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            latency_ms: 0,
            race_delay_ms: 10,
        }
    }
}

impl StoreSettings {
    /// Latency as a `Duration`
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }

    /// Race window as a `Duration`
    pub fn race_delay(&self) -> Duration {
        Duration::from_millis(self.race_delay_ms)
    }
}

/// Inventory configuration loaded from `stockguard.toml`.
///
/// # Example
///
/// ```toml
/// strategy = "pessimistic"
/// seed_demo_data = true
///
/// [retry]
/// max_attempts = 20
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockConfig {
    /// Default strategy for `adjust_quantity`: `"unsynchronized"`,
    /// `"optimistic"`, `"pessimistic"` or `"distributed"`.
    #[serde(default = "default_strategy_str")]
    pub strategy: String,
    /// Create the demo records on startup.
    #[serde(default)]
    pub seed_demo_data: bool,
    /// Optimistic retry policy.
    #[serde(default)]
    pub retry: RetryConfig,
    /// Distributed lock timing.
    #[serde(default)]
    pub lock: LockSettings,
    /// Harness worker pool.
    #[serde(default)]
    pub harness: HarnessConfig,
    /// Simulated store behavior.
    #[serde(default)]
    pub store: StoreSettings,
}

fn default_strategy_str() -> String {
    Strategy::Optimistic.as_str().to_string()
}

impl Default for StockConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy_str(),
            seed_demo_data: false,
            retry: RetryConfig::default(),
            lock: LockSettings::default(),
            harness: HarnessConfig::default(),
            store: StoreSettings::default(),
        }
    }
}

impl StockConfig {
    /// Parse the strategy string.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an unknown strategy name.
    pub fn strategy(&self) -> StockResult<Strategy> {
        self.strategy.parse::<Strategy>().map_err(|_| {
            StockError::invalid_input(format!(
                "Invalid strategy '{}' in {}. Expected one of \"unsynchronized\", \"optimistic\", \"pessimistic\", \"distributed\".",
                self.strategy, CONFIG_FILE_NAME
            ))
        })
    }

    /// Check every value that has a constraint.
    pub fn validate(&self) -> StockResult<()> {
        self.strategy()?;
        if self.harness.max_workers == 0 {
            return Err(StockError::invalid_input(
                "harness.max_workers must be at least 1",
            ));
        }
        if self.lock.lease_ms == 0 {
            return Err(StockError::invalid_input("lock.lease_ms must be at least 1"));
        }
        if self.retry.max_delay_ms < self.retry.base_delay_ms {
            return Err(StockError::invalid_input(
                "retry.max_delay_ms must not be below retry.base_delay_ms",
            ));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# stockguard configuration
#
# Strategy used by adjust_quantity and `stockguard race`:
#   "unsynchronized" = no coordination (demonstrates lost updates)
#   "optimistic"     = version check with bounded retry (default)
#   "pessimistic"    = exclusive row lock
#   "distributed"    = leased mutex from the lock coordinator
strategy = "optimistic"

# Create OPT-001, PES-001, DLOCK-001 and NO-LOCK-001 on startup
seed_demo_data = false

# Optimistic retries. Up to max_attempts concurrent adjustments of one record
# are guaranteed to commit when stock suffices; beyond that, contenders may
# fail with LockContention. Jitter spreads retries but does not lift the bound.
[retry]
max_attempts = 10
base_delay_ms = 50
max_delay_ms = 50
jitter = false

[lock]
wait_ms = 10000
lease_ms = 3000
key_prefix = "stock:lock:"

[harness]
max_workers = 1000
start_barrier = false

[store]
latency_ms = 0
race_delay_ms = 10
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> StockResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            StockError::storage(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: StockConfig = toml::from_str(&content).map_err(|e| {
            StockError::invalid_input(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate().map_err(|e| match e {
            StockError::InvalidInput(msg) => {
                StockError::InvalidInput(format!("{} ({})", msg, path.display()))
            }
            other => other,
        })?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `true` if the file was created.
    pub fn write_default_if_missing(path: &Path) -> StockResult<bool> {
        if path.exists() {
            return Ok(false);
        }
        std::fs::write(path, Self::default_toml()).map_err(|e| {
            StockError::storage(format!(
                "Failed to write default config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Ok(true)
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> StockResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| StockError::internal(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            StockError::storage(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
