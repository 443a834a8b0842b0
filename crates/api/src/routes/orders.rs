//! Order listing and delivery endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use common::OrderId;
use domain::{Order, OrderStatus, Sale};
use serde::Deserialize;

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct ListOrdersQuery {
    /// `pending` or `delivered`; all orders when absent.
    pub status: Option<String>,
}

/// GET /orders: all orders in creation order.
#[tracing::instrument(skip(state, query))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let orders = match query.status.as_deref() {
        None => state.ledger.orders().await?,
        Some("pending") => state.ledger.pending_orders().await?,
        Some("delivered") => state
            .ledger
            .orders()
            .await?
            .into_iter()
            .filter(|order| order.status() == OrderStatus::Delivered)
            .collect(),
        Some(other) => {
            return Err(ApiError::BadRequest(format!(
                "Unknown status filter: {other}"
            )));
        }
    };

    Ok(Json(orders))
}

/// GET /orders/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<Order>, ApiError> {
    let order_id = OrderId::new(id);
    let order = state
        .ledger
        .order(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order not found: {order_id}")))?;

    Ok(Json(order))
}

/// POST /orders/{id}/deliver: mark delivered and record the sale.
#[tracing::instrument(skip(state))]
pub async fn deliver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<Sale>, ApiError> {
    let sale = state.ledger.mark_delivered(OrderId::new(id)).await?;
    Ok(Json(sale))
}
