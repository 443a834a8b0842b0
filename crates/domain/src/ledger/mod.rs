//! Durable order and sales bookkeeping.

mod persisted;
mod service;

pub use persisted::{PersistedLedgerState, SCHEMA_VERSION};
pub use service::OrderLedger;

/// Default store key holding the ledger blob.
pub const DEFAULT_STORAGE_KEY: &str = "ledger/state";

/// Ledger configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Store key that holds the whole persisted ledger state.
    pub storage_key: String,
}

impl LedgerConfig {
    pub fn new(storage_key: impl Into<String>) -> Self {
        Self {
            storage_key: storage_key.into(),
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_STORAGE_KEY)
    }
}
