//! Core types for stockguard
//!
//! This crate defines the foundational types used throughout the system:
//! - StockId / RecordRef: record identity
//! - StockRecord / NewStockRecord / RecordUpdate: the shared counter and its requests
//! - Strategy: which concurrency discipline serializes adjustments
//! - StockError: error taxonomy with stable codes

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod strategy;
pub mod types;

pub use error::{StockError, StockResult};
pub use strategy::Strategy;
pub use types::{saturating_millis, NewStockRecord, RecordRef, RecordUpdate, StockId, StockRecord};
