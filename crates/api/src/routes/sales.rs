//! Sales history endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use domain::{Money, Sale};
use serde::Serialize;

use crate::AppState;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct SalesResponse {
    pub sales: Vec<Sale>,
    pub total: Money,
}

#[derive(Serialize)]
pub struct ClearSalesResponse {
    pub removed: usize,
}

/// GET /sales: sales in delivery order with their sum.
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<SalesResponse>, ApiError> {
    let sales = state.ledger.sales().await?;
    let total = sales.iter().map(Sale::total).sum();
    Ok(Json(SalesResponse { sales, total }))
}

/// DELETE /sales: administrative reset of the sales history.
#[tracing::instrument(skip(state))]
pub async fn clear(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ClearSalesResponse>, ApiError> {
    let removed = state.ledger.clear_sales_history().await?;
    Ok(Json(ClearSalesResponse { removed }))
}
