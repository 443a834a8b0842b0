use chrono::{DateTime, Utc};
use common::OrderId;
use serde::{Deserialize, Serialize};

use crate::money::Money;

use super::Order;

/// A sales ledger entry, written once when an order is delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Sale {
    order_id: OrderId,
    /// Copied from the originating order.
    created_at: DateTime<Utc>,
    delivered_at: DateTime<Utc>,
    customer_label: String,
    total: Money,
    payment_method: String,
}

impl Sale {
    pub(super) fn from_delivered_order(order: &Order, delivered_at: DateTime<Utc>) -> Self {
        Self {
            order_id: order.id(),
            created_at: order.created_at(),
            delivered_at,
            customer_label: order.customer_label(),
            total: order.total(),
            payment_method: order.payment_method().to_string(),
        }
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn delivered_at(&self) -> DateTime<Utc> {
        self.delivered_at
    }

    pub fn customer_label(&self) -> &str {
        &self.customer_label
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn payment_method(&self) -> &str {
        &self.payment_method
    }
}
