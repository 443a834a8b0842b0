//! Checkout coordinator: cart to order to stock reconciliation.

use std::sync::Arc;

use domain::{Cart, Order, OrderLedger};
use kv_store::KeyValueStore;
use serde::Serialize;

use crate::error::{CheckoutError, Result};
use crate::reconciler::{ReconciliationReport, StockReconciler};
use crate::services::inventory::InventoryService;

/// Payment details collected by the caller for one checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentDetails {
    pub method: String,
    pub confirmed: bool,
    pub customer: Option<String>,
}

impl PaymentDetails {
    /// Payment the caller has confirmed with the payment provider.
    pub fn confirmed(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            confirmed: true,
            customer: None,
        }
    }

    /// Payment still awaiting confirmation.
    pub fn unconfirmed(method: impl Into<String>) -> Self {
        Self {
            confirmed: false,
            ..Self::confirmed(method)
        }
    }

    pub fn with_customer(mut self, customer: impl Into<String>) -> Self {
        self.customer = Some(customer.into());
        self
    }
}

/// Outcome of a successful checkout.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutReceipt {
    pub order: Order,
    pub reconciliation: ReconciliationReport,
}

/// Drives checkout over a shared ledger and an inventory service.
///
/// Registration is the only step that can fail the checkout. Once the order
/// is durable the cart is cleared and stock is reconciled; reconciliation
/// failures are reported in the receipt.
pub struct CheckoutCoordinator<S, I>
where
    S: KeyValueStore,
    I: InventoryService,
{
    ledger: Arc<OrderLedger<S>>,
    reconciler: StockReconciler<I>,
}

impl<S, I> CheckoutCoordinator<S, I>
where
    S: KeyValueStore,
    I: InventoryService,
{
    pub fn new(ledger: Arc<OrderLedger<S>>, inventory: I) -> Self {
        Self {
            ledger,
            reconciler: StockReconciler::new(inventory),
        }
    }

    pub fn ledger(&self) -> &Arc<OrderLedger<S>> {
        &self.ledger
    }

    pub fn reconciler(&self) -> &StockReconciler<I> {
        &self.reconciler
    }

    /// Checks out `cart`.
    ///
    /// On error the cart is left exactly as it was.
    #[tracing::instrument(skip(self, cart, payment), fields(method = %payment.method, items = cart.len()))]
    pub async fn checkout(&self, cart: &mut Cart, payment: PaymentDetails) -> Result<CheckoutReceipt> {
        if !payment.confirmed {
            tracing::info!("checkout refused: payment not confirmed");
            return Err(CheckoutError::PaymentNotConfirmed);
        }

        let snapshot = cart.snapshot();
        let order = self
            .ledger
            .register_order_for(&snapshot, payment.method, payment.customer)
            .await?;

        cart.clear();

        let reconciliation = self.reconciler.reconcile(&snapshot).await;

        metrics::counter!("checkout_completed_total").increment(1);
        tracing::info!(
            order_id = %order.id(),
            total = %order.total(),
            reconciled = reconciliation.is_complete(),
            "checkout completed"
        );

        Ok(CheckoutReceipt {
            order,
            reconciliation,
        })
    }
}
