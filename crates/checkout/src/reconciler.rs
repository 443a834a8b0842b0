//! Stock reconciliation after an order is registered.
//!
//! Each distinct catalog item in the snapshot gets exactly one decrement
//! call. Calls run concurrently and independently: a failure is recorded for
//! that item only and never stops or undoes the others. Nothing here retries.

use std::fmt::Display;
use std::future::Future;

use common::CatalogItemId;
use domain::CartSnapshot;
use futures_util::future::join_all;
use serde::Serialize;

use crate::services::inventory::InventoryService;

/// Result of the decrement call for one catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DecrementOutcome {
    Decremented,
    Failed { reason: String },
}

impl DecrementOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DecrementOutcome::Decremented)
    }
}

/// Per-item entry of a [`ReconciliationReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemReconciliation {
    pub catalog_item_id: CatalogItemId,
    /// Total quantity decremented (summed over lines sharing the item).
    pub quantity: u32,
    pub outcome: DecrementOutcome,
}

/// Per-item results of one reconciliation, in snapshot order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationReport {
    items: Vec<ItemReconciliation>,
}

impl ReconciliationReport {
    pub fn items(&self) -> &[ItemReconciliation] {
        &self.items
    }

    /// Looks up the entry for one catalog item.
    pub fn get(&self, catalog_item_id: &CatalogItemId) -> Option<&ItemReconciliation> {
        self.items
            .iter()
            .find(|item| &item.catalog_item_id == catalog_item_id)
    }

    /// Entries whose decrement failed; candidates for compensating action.
    pub fn failures(&self) -> impl Iterator<Item = &ItemReconciliation> {
        self.items.iter().filter(|item| !item.outcome.is_success())
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// True when every item was decremented.
    pub fn is_complete(&self) -> bool {
        self.failure_count() == 0
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Collapses the snapshot to one demand per catalog item.
///
/// Items keep the position of their first line; quantities are summed.
pub fn group_by_catalog_item(snapshot: &CartSnapshot) -> Vec<(CatalogItemId, u32)> {
    let mut demands: Vec<(CatalogItemId, u32)> = Vec::new();
    for line in snapshot.items() {
        match demands
            .iter_mut()
            .find(|(id, _)| id == &line.catalog_item_id)
        {
            Some((_, quantity)) => *quantity = quantity.saturating_add(line.quantity),
            None => demands.push((line.catalog_item_id.clone(), line.quantity)),
        }
    }
    demands
}

/// Runs `decrement` once per distinct catalog item in `snapshot`.
///
/// Any failure is captured in the report; this function itself cannot fail.
#[tracing::instrument(skip(snapshot, decrement), fields(lines = snapshot.len()))]
pub async fn reconcile_with<F, Fut, E>(snapshot: &CartSnapshot, decrement: F) -> ReconciliationReport
where
    F: Fn(CatalogItemId, u32) -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: Display,
{
    let calls = group_by_catalog_item(snapshot)
        .into_iter()
        .map(|(catalog_item_id, quantity)| {
            let call = decrement(catalog_item_id.clone(), quantity);
            async move {
                let outcome = match call.await {
                    Ok(()) => DecrementOutcome::Decremented,
                    Err(e) => DecrementOutcome::Failed {
                        reason: e.to_string(),
                    },
                };
                ItemReconciliation {
                    catalog_item_id,
                    quantity,
                    outcome,
                }
            }
        });

    let items = join_all(calls).await;

    for item in &items {
        match &item.outcome {
            DecrementOutcome::Decremented => {
                metrics::counter!("checkout_stock_decrements_total", "outcome" => "decremented")
                    .increment(1);
            }
            DecrementOutcome::Failed { reason } => {
                metrics::counter!("checkout_stock_decrements_total", "outcome" => "failed")
                    .increment(1);
                tracing::warn!(
                    catalog_item_id = %item.catalog_item_id,
                    quantity = item.quantity,
                    %reason,
                    "stock decrement failed"
                );
            }
        }
    }

    let report = ReconciliationReport { items };
    tracing::info!(
        items = report.len(),
        failed = report.failure_count(),
        "stock reconciliation finished"
    );
    report
}

/// Reconciles snapshots against an [`InventoryService`].
#[derive(Debug, Clone)]
pub struct StockReconciler<I: InventoryService> {
    inventory: I,
}

impl<I: InventoryService> StockReconciler<I> {
    pub fn new(inventory: I) -> Self {
        Self { inventory }
    }

    pub fn inventory(&self) -> &I {
        &self.inventory
    }

    pub async fn reconcile(&self, snapshot: &CartSnapshot) -> ReconciliationReport {
        let inventory = &self.inventory;
        reconcile_with(snapshot, move |catalog_item_id, quantity| async move {
            inventory.decrement(&catalog_item_id, quantity).await
        })
        .await
    }
}
