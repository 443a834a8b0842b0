//! Shared identifier types used across the cart, ledger and checkout crates.

mod types;

pub use types::{CatalogItemId, LineItemId, OrderId};
