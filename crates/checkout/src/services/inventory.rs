//! Inventory service trait and in-memory implementation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use common::CatalogItemId;
use tokio::sync::RwLock;

use crate::error::InventoryError;

/// Remote inventory that owns authoritative stock levels.
#[async_trait]
pub trait InventoryService: Send + Sync {
    /// Removes `quantity` units of `catalog_item_id` from remote stock.
    async fn decrement(
        &self,
        catalog_item_id: &CatalogItemId,
        quantity: u32,
    ) -> Result<(), InventoryError>;
}

#[async_trait]
impl<T: InventoryService + ?Sized> InventoryService for Arc<T> {
    async fn decrement(
        &self,
        catalog_item_id: &CatalogItemId,
        quantity: u32,
    ) -> Result<(), InventoryError> {
        (**self).decrement(catalog_item_id, quantity).await
    }
}

#[derive(Debug, Default)]
struct InMemoryInventoryState {
    stock: HashMap<CatalogItemId, u32>,
    failing: HashSet<CatalogItemId>,
    unavailable: bool,
    calls: usize,
}

/// In-memory inventory service for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventoryService {
    state: Arc<RwLock<InMemoryInventoryState>>,
}

impl InMemoryInventoryService {
    /// Creates an inventory with no stock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an inventory seeded with the given stock levels.
    pub fn with_stock<I, K>(stock: I) -> Self
    where
        I: IntoIterator<Item = (K, u32)>,
        K: Into<CatalogItemId>,
    {
        let state = InMemoryInventoryState {
            stock: stock.into_iter().map(|(id, n)| (id.into(), n)).collect(),
            ..Default::default()
        };
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Sets the stock level for one item.
    pub async fn set_stock(&self, catalog_item_id: impl Into<CatalogItemId>, quantity: u32) {
        self.state
            .write()
            .await
            .stock
            .insert(catalog_item_id.into(), quantity);
    }

    /// Returns the current stock level, or `None` for an unknown item.
    pub async fn stock(&self, catalog_item_id: &CatalogItemId) -> Option<u32> {
        self.state.read().await.stock.get(catalog_item_id).copied()
    }

    /// Makes every decrement of this item fail until turned off.
    pub async fn set_fail_on(&self, catalog_item_id: impl Into<CatalogItemId>, fail: bool) {
        let mut state = self.state.write().await;
        let id = catalog_item_id.into();
        if fail {
            state.failing.insert(id);
        } else {
            state.failing.remove(&id);
        }
    }

    /// Makes every decrement fail as if the service were down.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.write().await.unavailable = unavailable;
    }

    /// Number of decrement calls received, successful or not.
    pub async fn call_count(&self) -> usize {
        self.state.read().await.calls
    }
}

#[async_trait]
impl InventoryService for InMemoryInventoryService {
    async fn decrement(
        &self,
        catalog_item_id: &CatalogItemId,
        quantity: u32,
    ) -> Result<(), InventoryError> {
        let mut state = self.state.write().await;
        state.calls += 1;

        if state.unavailable || state.failing.contains(catalog_item_id) {
            return Err(InventoryError::Unavailable(format!(
                "decrement of {catalog_item_id} refused"
            )));
        }

        let available = state
            .stock
            .get_mut(catalog_item_id)
            .ok_or_else(|| InventoryError::UnknownItem(catalog_item_id.clone()))?;

        if *available < quantity {
            return Err(InventoryError::InsufficientStock {
                catalog_item_id: catalog_item_id.clone(),
                requested: quantity,
                available: *available,
            });
        }

        *available -= quantity;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_decrement_reduces_stock() {
        let service = InMemoryInventoryService::with_stock([("kibble", 10)]);
        let id = CatalogItemId::new("kibble");

        service.decrement(&id, 4).await.unwrap();

        assert_eq!(service.stock(&id).await, Some(6));
        assert_eq!(service.call_count().await, 1);
    }

    #[tokio::test]
    async fn test_insufficient_stock_leaves_level_unchanged() {
        let service = InMemoryInventoryService::with_stock([("kibble", 2)]);
        let id = CatalogItemId::new("kibble");

        let err = service.decrement(&id, 3).await.unwrap_err();

        assert!(matches!(
            err,
            InventoryError::InsufficientStock { requested: 3, available: 2, .. }
        ));
        assert_eq!(service.stock(&id).await, Some(2));
    }

    #[tokio::test]
    async fn test_unknown_item() {
        let service = InMemoryInventoryService::new();
        let id = CatalogItemId::new("ghost");
        assert_eq!(
            service.decrement(&id, 1).await,
            Err(InventoryError::UnknownItem(id))
        );
    }

    #[tokio::test]
    async fn test_fail_on_item_is_isolated() {
        let service = InMemoryInventoryService::with_stock([("bowl", 5), ("leash", 5)]);
        service.set_fail_on("bowl", true).await;

        assert!(service.decrement(&"bowl".into(), 1).await.is_err());
        assert!(service.decrement(&"leash".into(), 1).await.is_ok());

        service.set_fail_on("bowl", false).await;
        assert!(service.decrement(&"bowl".into(), 1).await.is_ok());
    }

    #[tokio::test]
    async fn test_unavailable_fails_everything() {
        let service = InMemoryInventoryService::with_stock([("bowl", 5)]);
        service.set_unavailable(true).await;

        let err = service.decrement(&"bowl".into(), 1).await.unwrap_err();
        assert!(matches!(err, InventoryError::Unavailable(_)));
        assert_eq!(service.stock(&"bowl".into()).await, Some(5));
    }
}
