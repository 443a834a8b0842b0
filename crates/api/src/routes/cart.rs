//! Cart endpoints.
//!
//! Every response carries the full cart snapshot after the change.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::LineItemId;
use domain::{CartSnapshot, ItemCandidate, Money, StockOutcome};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct AddItemRequest {
    pub catalog_item_id: String,
    pub display_name: String,
    pub unit_price_cents: i64,
    pub quantity: u32,
    pub stock_ceiling: u32,
    #[serde(default)]
    pub image_ref: Option<String>,
}

#[derive(Deserialize)]
pub struct SetQuantityRequest {
    pub quantity: u32,
}

// -- Response types --

#[derive(Serialize)]
pub struct CartResponse {
    /// Present for mutations bounded by the stock ceiling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<StockOutcome>,
    pub cart: CartSnapshot,
}

impl CartResponse {
    fn new(cart: CartSnapshot) -> Self {
        Self { outcome: None, cart }
    }

    fn with_outcome(outcome: StockOutcome, cart: CartSnapshot) -> Self {
        Self {
            outcome: Some(outcome),
            cart,
        }
    }
}

// -- Handlers --

/// GET /cart
pub async fn get(State(state): State<Arc<AppState>>) -> Json<CartResponse> {
    let cart = state.cart.lock().await;
    Json(CartResponse::new(cart.snapshot()))
}

/// POST /cart/items: add a catalog item, merging with an existing line.
#[tracing::instrument(skip(state, req), fields(catalog_item_id = %req.catalog_item_id))]
pub async fn add_item(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    if req.catalog_item_id.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "catalog_item_id must not be empty".to_string(),
        ));
    }

    let mut candidate = ItemCandidate::new(
        req.catalog_item_id,
        req.display_name,
        Money::from_cents(req.unit_price_cents),
        req.quantity,
        req.stock_ceiling,
    );
    if let Some(image_ref) = req.image_ref {
        candidate = candidate.with_image(image_ref);
    }

    let mut cart = state.cart.lock().await;
    let outcome = cart.add_item(candidate)?;
    Ok(Json(CartResponse::with_outcome(outcome, cart.snapshot())))
}

/// PUT /cart/items/{id}: set the quantity, clamped to the stock ceiling.
#[tracing::instrument(skip(state, req))]
pub async fn set_quantity(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(req): Json<SetQuantityRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let mut cart = state.cart.lock().await;
    let outcome = cart.set_quantity(LineItemId::new(id), req.quantity)?;
    Ok(Json(CartResponse::with_outcome(outcome, cart.snapshot())))
}

/// POST /cart/items/{id}/increment
#[tracing::instrument(skip(state))]
pub async fn increment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<CartResponse>, ApiError> {
    let mut cart = state.cart.lock().await;
    let outcome = cart.increment_quantity(LineItemId::new(id))?;
    Ok(Json(CartResponse::with_outcome(outcome, cart.snapshot())))
}

/// POST /cart/items/{id}/decrement
#[tracing::instrument(skip(state))]
pub async fn decrement(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<CartResponse>, ApiError> {
    let mut cart = state.cart.lock().await;
    cart.decrement_quantity(LineItemId::new(id))?;
    Ok(Json(CartResponse::new(cart.snapshot())))
}

/// DELETE /cart/items/{id}
#[tracing::instrument(skip(state))]
pub async fn remove_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<CartResponse>, ApiError> {
    let mut cart = state.cart.lock().await;
    cart.remove_item(LineItemId::new(id))?;
    Ok(Json(CartResponse::new(cart.snapshot())))
}

/// DELETE /cart
#[tracing::instrument(skip(state))]
pub async fn clear(State(state): State<Arc<AppState>>) -> Json<CartResponse> {
    let mut cart = state.cart.lock().await;
    cart.clear();
    Json(CartResponse::new(cart.snapshot()))
}
