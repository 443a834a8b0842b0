//! Durable key-value storage for the order ledger.
//!
//! The ledger keeps its whole persisted state under one logical key and
//! relies on the store for atomic replace semantics: a `get` never observes
//! a half-written value. Three backends are provided:
//! - [`InMemoryStore`] for tests and ephemeral runs
//! - [`FileStore`] writing one file per key with rename-over-target
//! - [`PostgresStore`] upserting into a single `kv_store` table

pub mod error;
pub mod file;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use file::FileStore;
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use store::{KeyValueStore, KeyValueStoreExt, validate_key};
