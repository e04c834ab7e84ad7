//! Error types for stockguard
//!
//! Every failure a caller can observe maps to exactly one `StockError`
//! variant, and every variant has a stable code (see [`StockError::error_code`])
//! so tests and front-ends can assert on the failure *kind*.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use crate::types::{RecordRef, StockId};
use thiserror::Error;

/// Result type alias for stockguard operations
pub type StockResult<T> = std::result::Result<T, StockError>;

/// Error types for stockguard
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StockError {
    /// Record absent (by id or by SKU). Never retried.
    #[error("stock record not found: {0}")]
    NotFound(RecordRef),

    /// Applying the delta would drive the quantity below zero.
    ///
    /// Terminal business rejection: retrying produces the same outcome.
    #[error("insufficient stock for record {id}: available {available}, delta {delta}")]
    InsufficientStock {
        /// Record the adjustment targeted
        id: StockId,
        /// Quantity observed at the time of the check
        available: u32,
        /// Requested signed change
        delta: i64,
    },

    /// A version-checked write found the stored version changed since load.
    ///
    /// Optimistic path only. Retried internally by the optimistic updater.
    #[error("version conflict on record {id}: expected {expected}, found {actual}")]
    VersionConflict {
        /// Record being written
        id: StockId,
        /// Version captured at load time
        expected: u64,
        /// Version currently stored
        actual: u64,
    },

    /// Optimistic retries exhausted without a successful commit.
    #[error("lock contention on record {id}: gave up after {attempts} attempts")]
    LockContention {
        /// Record being written
        id: StockId,
        /// Number of attempts made
        attempts: usize,
    },

    /// The external mutex was not granted within the wait window.
    #[error("could not acquire lock '{key}' within {waited_ms}ms")]
    LockAcquisitionTimeout {
        /// Lock key requested
        key: String,
        /// Wait window in milliseconds
        waited_ms: u64,
    },

    /// The lease on the external mutex lapsed before the write was committed.
    #[error("lease on lock '{key}' expired before commit")]
    LeaseExpired {
        /// Lock key whose lease lapsed
        key: String,
    },

    /// Creation with an SKU that already exists.
    #[error("duplicate sku: {sku}")]
    DuplicateKey {
        /// The conflicting SKU
        sku: String,
    },

    /// Malformed request (validation, overflow, bad configuration)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Storage layer error
    #[error("storage error: {0}")]
    Storage(String),

    /// Unexpected internal failure (worker panic, broken invariant)
    #[error("internal error: {0}")]
    Internal(String),
}

impl StockError {
    /// Shorthand for [`StockError::InvalidInput`]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        StockError::InvalidInput(msg.into())
    }

    /// Shorthand for [`StockError::Storage`]
    pub fn storage(msg: impl Into<String>) -> Self {
        StockError::Storage(msg.into())
    }

    /// Shorthand for [`StockError::Internal`]
    pub fn internal(msg: impl Into<String>) -> Self {
        StockError::Internal(msg.into())
    }

    /// Stable code for this error kind.
    pub fn error_code(&self) -> &'static str {
        match self {
            StockError::NotFound(_) => "NotFound",
            StockError::InsufficientStock { .. } => "InsufficientStock",
            StockError::VersionConflict { .. } => "VersionConflict",
            StockError::LockContention { .. } => "LockContention",
            StockError::LockAcquisitionTimeout { .. } => "LockAcquisitionTimeout",
            StockError::LeaseExpired { .. } => "LeaseExpired",
            StockError::DuplicateKey { .. } => "DuplicateKey",
            StockError::InvalidInput(_) => "InvalidInput",
            StockError::Storage(_) => "Storage",
            StockError::Internal(_) => "Internal",
        }
    }

    /// True for the transient conflict the optimistic updater absorbs.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StockError::VersionConflict { .. })
    }

    /// True for errors that mean "the record does not exist".
    pub fn is_not_found(&self) -> bool {
        matches!(self, StockError::NotFound(_))
    }
}
