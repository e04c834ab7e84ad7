//! Stock record types
//!
//! This module defines the data model shared by every layer:
//! - StockId: store-assigned numeric identity
//! - RecordRef: how a caller addressed a record (id or SKU)
//! - NewStockRecord: validated creation request
//! - StockRecord: a counter with identity, quantity, version and audit timestamps
//! - RecordUpdate: full update guarded by a caller-supplied version

use crate::error::{StockError, StockResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Maximum SKU length in characters
pub const MAX_SKU_LEN: usize = 64;

/// Maximum display name length in characters
pub const MAX_NAME_LEN: usize = 255;

/// Store-assigned record identity
///
/// Ids start at 1 and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockId(u64);

impl StockId {
    /// Wrap a raw id
    pub const fn new(raw: u64) -> Self {
        StockId(raw)
    }

    /// Raw numeric value
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for StockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for StockId {
    fn from(raw: u64) -> Self {
        StockId(raw)
    }
}

/// How a record was addressed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordRef {
    /// By numeric identity
    Id(StockId),
    /// By SKU
    Sku(String),
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordRef::Id(id) => write!(f, "id {}", id),
            RecordRef::Sku(sku) => write!(f, "sku '{}'", sku),
        }
    }
}

/// Creation request for a stock record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStockRecord {
    /// Unique, immutable stock-keeping unit
    pub sku: String,
    /// Display name
    pub name: String,
    /// Unit price in minor currency units
    pub price: u64,
    /// Initial quantity
    pub quantity: u32,
}

impl NewStockRecord {
    /// Build a creation request
    pub fn new(sku: impl Into<String>, name: impl Into<String>, price: u64, quantity: u32) -> Self {
        NewStockRecord {
            sku: sku.into(),
            name: name.into(),
            price,
            quantity,
        }
    }

    /// Check SKU and name constraints.
    pub fn validate(&self) -> StockResult<()> {
        validate_sku(&self.sku)?;
        validate_name(&self.name)
    }
}

/// Full update of the mutable fields, guarded by the version the caller last saw
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordUpdate {
    /// New display name
    pub name: String,
    /// New unit price
    pub price: u64,
    /// New absolute quantity
    pub quantity: u32,
    /// Version the caller read; the update is rejected if it is stale
    pub version: u64,
}

impl RecordUpdate {
    /// Check name constraints.
    pub fn validate(&self) -> StockResult<()> {
        validate_name(&self.name)
    }
}

/// A shared inventory counter
///
/// `quantity` is unsigned, so the non-negative invariant is carried by the type;
/// [`StockRecord::adjusted_quantity`] is the single place a signed delta is
/// applied and rejected before it can reach a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockRecord {
    /// Store-assigned identity
    pub id: StockId,
    /// Unique, immutable stock-keeping unit
    pub sku: String,
    /// Display name
    pub name: String,
    /// Unit price in minor currency units
    pub price: u64,
    /// Units on hand
    pub quantity: u32,
    /// Bumped by exactly 1 on every committed write
    pub version: u64,
    /// Set once on insert
    pub created_at: DateTime<Utc>,
    /// Set on every committed write
    pub updated_at: DateTime<Utc>,
}

impl StockRecord {
    /// Quantity after applying `delta`, or the reason it cannot be applied.
    ///
    /// Fails with `InsufficientStock` if the result would be negative and with
    /// `InvalidInput` if it would not fit in a `u32`.
    pub fn adjusted_quantity(&self, delta: i64) -> StockResult<u32> {
        let next = i64::from(self.quantity)
            .checked_add(delta)
            .ok_or_else(|| StockError::invalid_input(format!("delta {} overflows", delta)))?;
        if next < 0 {
            return Err(StockError::InsufficientStock {
                id: self.id,
                available: self.quantity,
                delta,
            });
        }
        u32::try_from(next).map_err(|_| {
            StockError::invalid_input(format!(
                "quantity {} for record {} exceeds {}",
                next,
                self.id,
                u32::MAX
            ))
        })
    }

    /// Copy of this record with a different quantity (version untouched).
    pub fn with_quantity(&self, quantity: u32) -> StockRecord {
        StockRecord {
            quantity,
            ..self.clone()
        }
    }
}

fn validate_sku(sku: &str) -> StockResult<()> {
    if sku.trim().is_empty() {
        return Err(StockError::invalid_input("sku must not be blank"));
    }
    if sku.chars().count() > MAX_SKU_LEN {
        return Err(StockError::invalid_input(format!(
            "sku must be at most {} characters",
            MAX_SKU_LEN
        )));
    }
    Ok(())
}

fn validate_name(name: &str) -> StockResult<()> {
    if name.trim().is_empty() {
        return Err(StockError::invalid_input("name must not be blank"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(StockError::invalid_input(format!(
            "name must be at most {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(())
}

/// Whole milliseconds in `d`, saturating at `u64::MAX`
pub fn saturating_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
