//! Order record implementation.

use chrono::{DateTime, Utc};
use common::OrderId;
use serde::{Deserialize, Serialize};

use crate::cart::{CartSnapshot, LineItem};
use crate::money::Money;

use super::{OrderError, OrderStatus, Sale};

/// A registered order.
///
/// Built once from a non-empty cart snapshot; afterwards only its status can
/// change, and only from Pending to Delivered. Orders are owned by the
/// ledger; everything handed out is a read-only copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Order {
    id: OrderId,
    items: Vec<LineItem>,
    total: Money,
    payment_method: String,
    customer: Option<String>,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    delivered_at: Option<DateTime<Utc>>,
}

// Query methods
impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    /// Line items copied from the cart when the order was placed.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn payment_method(&self) -> &str {
        &self.payment_method
    }

    /// Identity supplied at checkout, if any.
    pub fn customer(&self) -> Option<&str> {
        self.customer.as_deref()
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn delivered_at(&self) -> Option<DateTime<Utc>> {
        self.delivered_at
    }

    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }

    /// Label used for the sale record: the supplied identity, or one
    /// synthesized from the order id when none was given.
    pub fn customer_label(&self) -> String {
        match &self.customer {
            Some(customer) => customer.clone(),
            None => format!("Customer #{}", self.id),
        }
    }

    /// Checks the record-level invariants a loaded order must satisfy.
    pub(crate) fn check_consistency(&self) -> Result<(), String> {
        if self.items.is_empty() {
            return Err(format!("order {} has no items", self.id));
        }

        let expected: Money = self.items.iter().map(LineItem::line_total).sum();
        if expected != self.total {
            return Err(format!(
                "order {} total {} does not match its items ({})",
                self.id, self.total, expected
            ));
        }

        if self.status.is_terminal() != self.delivered_at.is_some() {
            return Err(format!(
                "order {} has status {} but delivered_at is {:?}",
                self.id, self.status, self.delivered_at
            ));
        }

        Ok(())
    }
}

// Command methods
impl Order {
    /// Builds a pending order from a cart snapshot.
    pub fn place(
        id: OrderId,
        snapshot: &CartSnapshot,
        payment_method: impl Into<String>,
        customer: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, OrderError> {
        if snapshot.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        Ok(Self {
            id,
            items: snapshot.items().to_vec(),
            total: snapshot.total(),
            payment_method: payment_method.into(),
            customer,
            status: OrderStatus::Pending,
            created_at,
            delivered_at: None,
        })
    }

    /// Returns the delivered version of this order and the sale it produces.
    ///
    /// The receiver is left untouched so the caller can decide when to
    /// commit both.
    pub fn deliver(&self, delivered_at: DateTime<Utc>) -> Result<(Order, Sale), OrderError> {
        if !self.status.can_deliver() {
            return Err(OrderError::NotPending {
                order_id: self.id,
                status: self.status,
            });
        }

        let mut delivered = self.clone();
        delivered.status = OrderStatus::Delivered;
        delivered.delivered_at = Some(delivered_at);

        let sale = Sale::from_delivered_order(&delivered, delivered_at);
        Ok((delivered, sale))
    }
}
