//! Versioned on-disk form of the ledger.

use common::OrderId;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::order::{Order, Sale};

/// Schema version written by this build.
pub const SCHEMA_VERSION: u32 = 1;

/// Everything the ledger persists, written as one blob after each mutation.
///
/// Decoding is strict: unknown or missing fields, an unexpected schema
/// version, or records that break ledger invariants all fail with
/// [`LedgerError::Schema`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PersistedLedgerState {
    pub schema_version: u32,
    pub next_id: OrderId,
    pub orders: Vec<Order>,
    pub sales: Vec<Sale>,
}

#[derive(Deserialize)]
struct VersionProbe {
    schema_version: u32,
}

impl PersistedLedgerState {
    /// The state of a ledger that has never been written.
    pub fn empty() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            next_id: OrderId::FIRST,
            orders: Vec::new(),
            sales: Vec::new(),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, LedgerError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, LedgerError> {
        let probe: VersionProbe = serde_json::from_slice(bytes)
            .map_err(|e| LedgerError::Schema(format!("unreadable ledger state: {e}")))?;

        if probe.schema_version != SCHEMA_VERSION {
            return Err(LedgerError::Schema(format!(
                "unsupported schema version {} (expected {SCHEMA_VERSION})",
                probe.schema_version
            )));
        }

        let state: Self = serde_json::from_slice(bytes)
            .map_err(|e| LedgerError::Schema(format!("malformed ledger state: {e}")))?;

        state.validate()?;
        Ok(state)
    }

    /// The id the next order should receive: never below the persisted
    /// counter, always above every existing order.
    pub fn effective_next_id(&self) -> OrderId {
        let after_orders = self
            .orders
            .iter()
            .map(Order::id)
            .max()
            .map(|id| id.next())
            .unwrap_or(OrderId::FIRST);

        self.next_id.max(after_orders).max(OrderId::FIRST)
    }

    fn validate(&self) -> Result<(), LedgerError> {
        for pair in self.orders.windows(2) {
            if pair[0].id() >= pair[1].id() {
                return Err(LedgerError::Schema(format!(
                    "order ids not strictly increasing: {} then {}",
                    pair[0].id(),
                    pair[1].id()
                )));
            }
        }

        for order in &self.orders {
            order.check_consistency().map_err(LedgerError::Schema)?;
        }

        let mut seen = std::collections::HashSet::new();
        for sale in &self.sales {
            if !seen.insert(sale.order_id()) {
                return Err(LedgerError::Schema(format!(
                    "more than one sale recorded for order {}",
                    sale.order_id()
                )));
            }
        }

        Ok(())
    }
}
