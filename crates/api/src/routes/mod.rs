//! HTTP route handlers.

pub mod cart;
pub mod checkout;
pub mod health;
pub mod inventory;
pub mod metrics;
pub mod orders;
pub mod sales;
