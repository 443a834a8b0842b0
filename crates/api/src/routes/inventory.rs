//! Stock levels of the in-process inventory used for reconciliation.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::CatalogItemId;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct SetStockRequest {
    pub stock: u32,
}

#[derive(Serialize)]
pub struct StockResponse {
    pub catalog_item_id: CatalogItemId,
    pub stock: u32,
}

/// GET /inventory/{catalog_item_id}
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(catalog_item_id): Path<String>,
) -> Result<Json<StockResponse>, ApiError> {
    let catalog_item_id = CatalogItemId::new(catalog_item_id);
    let stock = state
        .inventory
        .stock(&catalog_item_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Unknown catalog item: {catalog_item_id}")))?;

    Ok(Json(StockResponse {
        catalog_item_id,
        stock,
    }))
}

/// PUT /inventory/{catalog_item_id}
#[tracing::instrument(skip(state, req))]
pub async fn set(
    State(state): State<Arc<AppState>>,
    Path(catalog_item_id): Path<String>,
    Json(req): Json<SetStockRequest>,
) -> Json<StockResponse> {
    let catalog_item_id = CatalogItemId::new(catalog_item_id);
    state
        .inventory
        .set_stock(catalog_item_id.clone(), req.stock)
        .await;

    Json(StockResponse {
        catalog_item_id,
        stock: req.stock,
    })
}
