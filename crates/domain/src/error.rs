//! Ledger error types.

use common::OrderId;
use kv_store::StoreError;
use thiserror::Error;

use crate::order::OrderError;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The order rejected the operation (empty cart, not pending).
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// No order with this id exists in the ledger.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The durable store failed; the mutation was rolled back.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The ledger state could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The persisted ledger state does not match the expected schema.
    #[error("Schema error: {0}")]
    Schema(String),
}

impl LedgerError {
    /// Returns true for failures worth retrying unchanged (persistence).
    ///
    /// Validation, not-found and transition errors will fail the same way
    /// on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Store(_))
    }
}
