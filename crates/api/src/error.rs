//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::CheckoutError;
use domain::{CartError, LedgerError, OrderError};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Cart rejected the mutation.
    Cart(CartError),
    /// Ledger rejected or failed the operation.
    Ledger(LedgerError),
    /// Checkout was refused or failed.
    Checkout(CheckoutError),
    /// Internal server error. The detail is logged, never returned.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Cart(err) => cart_error_to_response(err),
            ApiError::Ledger(err) => ledger_error_to_response(err),
            ApiError::Checkout(err) => checkout_error_to_response(err),
            ApiError::Internal(detail) => internal_error_response(&detail),
        };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %message, "request failed");
        }
        metrics::counter!("api_errors_total", "status" => status.as_u16().to_string())
            .increment(1);

        let retryable = status == StatusCode::SERVICE_UNAVAILABLE;
        let body = serde_json::json!({ "error": message, "retryable": retryable });
        (status, axum::Json(body)).into_response()
    }
}

fn cart_error_to_response(err: CartError) -> (StatusCode, String) {
    match &err {
        CartError::ItemNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        CartError::InvalidQuantity { .. }
        | CartError::InvalidPrice { .. }
        | CartError::AmountOverflow => (StatusCode::BAD_REQUEST, err.to_string()),
    }
}

fn ledger_error_to_response(err: LedgerError) -> (StatusCode, String) {
    match &err {
        LedgerError::Order(OrderError::EmptyCart) => (StatusCode::BAD_REQUEST, err.to_string()),
        LedgerError::Order(OrderError::NotPending { .. }) => {
            (StatusCode::CONFLICT, err.to_string())
        }
        LedgerError::OrderNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        LedgerError::Store(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Order storage is temporarily unavailable, please retry".to_string(),
        ),
        LedgerError::Serialization(_) | LedgerError::Schema(_) => {
            internal_error_response(&err.to_string())
        }
    }
}

fn internal_error_response(detail: &str) -> (StatusCode, String) {
    tracing::error!(error = %detail, "internal error");
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
}

/// Ledger state that cannot be encoded or decoded is a server fault.
fn is_internal(err: &LedgerError) -> bool {
    matches!(err, LedgerError::Serialization(_) | LedgerError::Schema(_))
}

fn checkout_error_to_response(err: CheckoutError) -> (StatusCode, String) {
    match err {
        CheckoutError::PaymentNotConfirmed => (
            StatusCode::PAYMENT_REQUIRED,
            CheckoutError::PaymentNotConfirmed.to_string(),
        ),
        CheckoutError::Ledger(inner) => ledger_error_to_response(inner),
    }
}

impl From<CartError> for ApiError {
    fn from(err: CartError) -> Self {
        ApiError::Cart(err)
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        if is_internal(&err) {
            ApiError::Internal(err.to_string())
        } else {
            ApiError::Ledger(err)
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Ledger(inner) if is_internal(&inner) => {
                ApiError::Internal(inner.to_string())
            }
            other => ApiError::Checkout(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{LineItemId, OrderId};
    use domain::OrderStatus;
    use kv_store::StoreError;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_validation_errors_are_bad_request() {
        assert_eq!(
            status_of(CartError::InvalidQuantity { quantity: 0 }.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(LedgerError::Order(OrderError::EmptyCart).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(CartError::AmountOverflow.into()),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_corrupt_ledger_is_internal_error() {
        let err = ApiError::from(LedgerError::Schema("unknown schema version 2".into()));
        assert!(matches!(&err, ApiError::Internal(detail) if detail.contains("version 2")));
        assert_eq!(status_of(err), StatusCode::INTERNAL_SERVER_ERROR);

        let err = ApiError::from(CheckoutError::Ledger(LedgerError::Schema("bad".into())));
        assert!(matches!(err, ApiError::Internal(_)));
    }

    #[test]
    fn test_not_found_errors() {
        assert_eq!(
            status_of(CartError::ItemNotFound(LineItemId::new(4)).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(LedgerError::OrderNotFound(OrderId::new(4)).into()),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_not_pending_is_conflict() {
        let err = LedgerError::Order(OrderError::NotPending {
            order_id: OrderId::new(1),
            status: OrderStatus::Delivered,
        });
        assert_eq!(status_of(err.into()), StatusCode::CONFLICT);
    }

    #[test]
    fn test_persistence_is_service_unavailable() {
        let err = CheckoutError::Ledger(LedgerError::Store(StoreError::Unavailable(
            "disk".into(),
        )));
        assert_eq!(status_of(err.into()), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_unconfirmed_payment_is_payment_required() {
        assert_eq!(
            status_of(CheckoutError::PaymentNotConfirmed.into()),
            StatusCode::PAYMENT_REQUIRED
        );
    }
}
