//! Inventory engine for stockguard
//!
//! This crate wires the lower layers together:
//! - `StockConfig`: `stockguard.toml` loading and defaults
//! - `Inventory`: caller-facing record and adjustment operations
//! - `ConcurrencyTestHarness`: N concurrent adjustments, aggregated
//! - Demo seeding
//!
//! The engine is the only component that knows which strategy is selected.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod harness;
pub mod inventory;
pub mod seed;

pub use config::{StockConfig, StoreSettings, CONFIG_FILE_NAME};
pub use harness::{ConcurrencyTestHarness, HarnessConfig, TestResult};
pub use inventory::{build_updater, Inventory};
pub use seed::{seed_demo_records, DEMO_RECORDS};
