//! Domain layer for the pet-supply store checkout core.
//!
//! This crate provides:
//! - [`Cart`], the in-memory aggregate holding stock-bounded line items
//! - [`Order`] and [`Sale`], the records kept by the ledger
//! - [`OrderLedger`], durable order bookkeeping over a [`kv_store::KeyValueStore`]
//! - [`Observable`], the full-snapshot broadcast used by every reactive surface

pub mod cart;
pub mod error;
pub mod ledger;
pub mod money;
pub mod observable;
pub mod order;

pub use cart::{Cart, CartError, CartSnapshot, ItemCandidate, LineItem, StockOutcome};
pub use error::LedgerError;
pub use ledger::{LedgerConfig, OrderLedger, PersistedLedgerState, SCHEMA_VERSION};
pub use money::Money;
pub use observable::Observable;
pub use order::{Order, OrderError, OrderStatus, Sale};
