//! Checkout workflow for the pet-supply store.
//!
//! Turning a cart into an order takes three steps:
//! 1. Register the order with the ledger (the only step that can fail)
//! 2. Clear the cart
//! 3. Reconcile remote stock, one decrement per distinct catalog item
//!
//! Reconciliation is partial-success: each item's result is reported and
//! none of them touch the ledger.

pub mod coordinator;
pub mod error;
pub mod reconciler;
pub mod services;

pub use coordinator::{CheckoutCoordinator, CheckoutReceipt, PaymentDetails};
pub use error::{CheckoutError, InventoryError, Result};
pub use reconciler::{
    DecrementOutcome, ItemReconciliation, ReconciliationReport, StockReconciler,
    group_by_catalog_item, reconcile_with,
};
pub use services::{InMemoryInventoryService, InventoryService};
