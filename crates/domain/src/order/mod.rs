//! Order records, their status machine and the sales derived from them.

mod aggregate;
mod sale;
mod state;

pub use aggregate::Order;
pub use sale::Sale;
pub use state::OrderStatus;

use common::OrderId;
use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    /// An order needs at least one line item.
    #[error("Cannot register an order from an empty cart")]
    EmptyCart,

    /// Only pending orders can be delivered.
    #[error("Order {order_id} is not pending (current status: {status})")]
    NotPending { order_id: OrderId, status: OrderStatus },
}
