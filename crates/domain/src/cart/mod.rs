//! Shopping cart aggregate and its line items.

mod aggregate;
mod line_item;

pub use aggregate::Cart;
pub use line_item::{CartSnapshot, ItemCandidate, LineItem};

use common::LineItemId;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during cart operations.
///
/// All of them are raised before any state changes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    /// No line item with this id is in the cart.
    #[error("Line item not found: {0}")]
    ItemNotFound(LineItemId),

    /// Quantity must be at least 1.
    #[error("Invalid quantity: {quantity} (must be at least 1)")]
    InvalidQuantity { quantity: u32 },

    /// Unit price must not be negative.
    #[error("Invalid price: {cents} cents (must not be negative)")]
    InvalidPrice { cents: i64 },

    /// The change would push the cart total or unit count out of range.
    #[error("Cart amount out of range")]
    AmountOverflow,
}

/// How much of a requested quantity change the stock ceiling allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StockOutcome {
    /// The full request was applied.
    Accepted,

    /// The request was adjusted to fit `[1, stock_ceiling]`; the rest was
    /// dropped.
    Clamped { requested: u32, applied: u32 },

    /// Nothing could be applied: the item is out of stock or already at
    /// its ceiling.
    Exhausted,
}

impl StockOutcome {
    /// Returns true if the request was applied without adjustment.
    pub fn is_accepted(&self) -> bool {
        matches!(self, StockOutcome::Accepted)
    }

    /// Returns true if the stock ceiling cut the request short.
    pub fn hit_ceiling(&self) -> bool {
        !self.is_accepted()
    }
}
