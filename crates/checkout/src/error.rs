//! Checkout and inventory error types.

use common::CatalogItemId;
use domain::LedgerError;
use thiserror::Error;

/// Errors reported by an inventory service for a single decrement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    /// The inventory service does not track this catalog item.
    #[error("Unknown catalog item: {0}")]
    UnknownItem(CatalogItemId),

    /// Not enough remote stock to cover the decrement.
    #[error("Insufficient stock for {catalog_item_id}: requested {requested}, available {available}")]
    InsufficientStock {
        catalog_item_id: CatalogItemId,
        requested: u32,
        available: u32,
    },

    /// The service could not be reached or refused the call.
    #[error("Inventory service unavailable: {0}")]
    Unavailable(String),
}

/// Errors that can occur during checkout.
///
/// Stock reconciliation never fails a checkout; its per-item results are
/// carried in the receipt instead.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Payment was not confirmed; no order was registered.
    #[error("Payment not confirmed")]
    PaymentNotConfirmed,

    /// The ledger rejected or failed to persist the order.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl CheckoutError {
    /// Returns true when retrying the same checkout may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            CheckoutError::PaymentNotConfirmed => false,
            CheckoutError::Ledger(e) => e.is_retryable(),
        }
    }
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;
