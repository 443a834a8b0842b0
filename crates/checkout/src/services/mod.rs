//! External service traits and in-memory implementations used by checkout.

pub mod inventory;

pub use inventory::{InMemoryInventoryService, InventoryService};
