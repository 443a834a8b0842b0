//! Checkout endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use checkout::{CheckoutReceipt, PaymentDetails};
use serde::Deserialize;

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CheckoutRequest {
    pub payment_method: String,
    /// Set by the client once the payment provider confirmed the charge.
    #[serde(default)]
    pub payment_confirmed: bool,
    #[serde(default)]
    pub customer: Option<String>,
}

impl From<CheckoutRequest> for PaymentDetails {
    fn from(req: CheckoutRequest) -> Self {
        PaymentDetails {
            method: req.payment_method,
            confirmed: req.payment_confirmed,
            customer: req.customer,
        }
    }
}

/// POST /checkout: turn the current cart into a pending order.
///
/// Responds with the order and the per-item stock reconciliation report.
#[tracing::instrument(skip(state, req))]
pub async fn checkout(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<CheckoutReceipt>), ApiError> {
    if req.payment_method.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "payment_method must not be empty".to_string(),
        ));
    }

    let mut cart = state.cart.lock().await;
    let receipt = state.checkout.checkout(&mut cart, req.into()).await?;

    Ok((StatusCode::CREATED, Json(receipt)))
}
