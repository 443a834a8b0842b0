//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use api::config::{Config, StoreBackend};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use checkout::InMemoryInventoryService;
use domain::LedgerConfig;
use kv_store::InMemoryStore;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> axum::Router {
    api::create_app(api::create_default_state(), get_metrics_handle())
}

fn setup_with_store(store: InMemoryStore) -> (axum::Router, Arc<api::AppState>) {
    let inventory = InMemoryInventoryService::with_stock([("collar", 10), ("bowl", 10)]);
    let state = api::create_state(Arc::new(store), LedgerConfig::default(), inventory);
    let app = api::create_app(state.clone(), get_metrics_handle());
    (app, state)
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_string(&json).unwrap())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

fn collar(quantity: u32) -> Value {
    json!({
        "catalog_item_id": "collar",
        "display_name": "Collar",
        "unit_price_cents": 1000,
        "quantity": quantity,
        "stock_ceiling": 5
    })
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();

    let (status, json) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["ledger"], "ready");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn test_add_item_merges_and_clamps() {
    let app = setup();

    let (status, json) = send(&app, "POST", "/cart/items", Some(collar(2))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["outcome"]["kind"], "accepted");
    assert_eq!(json["cart"]["total"], 2000);

    let (status, json) = send(&app, "POST", "/cart/items", Some(collar(4))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["outcome"]["kind"], "clamped");
    assert_eq!(json["outcome"]["applied"], 3);
    assert_eq!(json["cart"]["items"].as_array().unwrap().len(), 1);
    assert_eq!(json["cart"]["items"][0]["quantity"], 5);
    assert_eq!(json["cart"]["total"], 5000);
}

#[tokio::test]
async fn test_zero_quantity_is_bad_request() {
    let app = setup();

    let (status, json) = send(&app, "POST", "/cart/items", Some(collar(0))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("Invalid quantity"));

    let (_, cart) = send(&app, "GET", "/cart", None).await;
    assert!(cart["cart"]["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_overflowing_total_is_bad_request() {
    let app = setup();
    let bed = json!({
        "catalog_item_id": "bed",
        "display_name": "Bed",
        "unit_price_cents": i64::MAX / 2 + 1,
        "quantity": 2,
        "stock_ceiling": 5
    });

    let (status, json) = send(&app, "POST", "/cart/items", Some(bed)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["retryable"], false);

    let (status, cart) = send(&app, "GET", "/cart", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(cart["cart"]["items"].as_array().unwrap().is_empty());
    assert_eq!(cart["cart"]["total"], 0);
}

#[tokio::test]
async fn test_quantity_endpoints() {
    let app = setup();
    let (_, json) = send(&app, "POST", "/cart/items", Some(collar(1))).await;
    let id = json["cart"]["items"][0]["id"].as_u64().unwrap();

    let (status, json) = send(&app, "PUT", &format!("/cart/items/{id}"), Some(json!({ "quantity": 9 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["outcome"]["kind"], "clamped");
    assert_eq!(json["cart"]["items"][0]["quantity"], 5);

    let (_, json) = send(&app, "POST", &format!("/cart/items/{id}/increment"), None).await;
    assert_eq!(json["outcome"]["kind"], "exhausted");
    assert_eq!(json["cart"]["items"][0]["quantity"], 5);

    let (_, json) = send(&app, "POST", &format!("/cart/items/{id}/decrement"), None).await;
    assert_eq!(json["cart"]["items"][0]["quantity"], 4);

    let (status, json) = send(&app, "DELETE", &format!("/cart/items/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["cart"]["total"], 0);
}

#[tokio::test]
async fn test_unknown_line_item_is_not_found() {
    let app = setup();

    let (status, _) = send(&app, "POST", "/cart/items/42/increment", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", "/cart/items/42", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_checkout_deliver_and_sales() {
    let (app, state) = setup_with_store(InMemoryStore::new());
    send(&app, "POST", "/cart/items", Some(collar(1))).await;

    // Checkout
    let (status, receipt) = send(
        &app,
        "POST",
        "/checkout",
        Some(json!({ "payment_method": "Cash", "payment_confirmed": true })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(receipt["order"]["id"], 1);
    assert_eq!(receipt["order"]["total"], 1000);
    assert_eq!(receipt["order"]["status"], "Pending");
    assert_eq!(
        receipt["reconciliation"]["items"][0]["outcome"]["status"],
        "decremented"
    );

    // Cart cleared, stock decremented
    let (_, cart) = send(&app, "GET", "/cart", None).await;
    assert!(cart["cart"]["items"].as_array().unwrap().is_empty());
    let (_, stock) = send(&app, "GET", "/inventory/collar", None).await;
    assert_eq!(stock["stock"], 9);

    // Order visible
    let (status, order) = send(&app, "GET", "/orders/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["payment_method"], "Cash");

    // Deliver once
    let (status, sale) = send(&app, "POST", "/orders/1/deliver", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sale["total"], 1000);
    assert_eq!(sale["customer_label"], "Customer #1");

    // Deliver twice
    let (status, _) = send(&app, "POST", "/orders/1/deliver", None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, sales) = send(&app, "GET", "/sales", None).await;
    assert_eq!(sales["sales"].as_array().unwrap().len(), 1);
    assert_eq!(sales["total"], 1000);
    assert_eq!(state.ledger.sales().await.unwrap().len(), 1);

    // Clear sales keeps orders
    let (_, cleared) = send(&app, "DELETE", "/sales", None).await;
    assert_eq!(cleared["removed"], 1);
    let (_, orders) = send(&app, "GET", "/orders", None).await;
    assert_eq!(orders.as_array().unwrap().len(), 1);
    assert_eq!(orders[0]["status"], "Delivered");
}

#[tokio::test]
async fn test_unconfirmed_payment_is_payment_required() {
    let app = setup();
    send(&app, "POST", "/cart/items", Some(collar(1))).await;

    let (status, json) = send(
        &app,
        "POST",
        "/checkout",
        Some(json!({ "payment_method": "Card" })),
    )
    .await;

    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(json["retryable"], false);
    let (_, cart) = send(&app, "GET", "/cart", None).await;
    assert_eq!(cart["cart"]["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_empty_cart_checkout_is_bad_request() {
    let app = setup();

    let (status, _) = send(
        &app,
        "POST",
        "/checkout",
        Some(json!({ "payment_method": "Cash", "payment_confirmed": true })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_persistence_failure_is_retryable() {
    let store = InMemoryStore::new();
    let (app, _) = setup_with_store(store.clone());
    send(&app, "POST", "/cart/items", Some(collar(2))).await;

    store.fail_next_puts(1).await;
    let (status, json) = send(
        &app,
        "POST",
        "/checkout",
        Some(json!({ "payment_method": "Cash", "payment_confirmed": true })),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["retryable"], true);

    // Cart kept; retry succeeds with the next id
    let (status, receipt) = send(
        &app,
        "POST",
        "/checkout",
        Some(json!({ "payment_method": "Cash", "payment_confirmed": true })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(receipt["order"]["id"], 2);
    assert_eq!(receipt["order"]["total"], 2000);
}

#[tokio::test]
async fn test_order_lookup_errors() {
    let app = setup();

    let (status, _) = send(&app, "GET", "/orders/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "POST", "/orders/99/deliver", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "GET", "/orders/not-a-number", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_orders_by_status() {
    let (app, _) = setup_with_store(InMemoryStore::new());
    for _ in 0..2 {
        send(&app, "POST", "/cart/items", Some(collar(1))).await;
        send(
            &app,
            "POST",
            "/checkout",
            Some(json!({ "payment_method": "Cash", "payment_confirmed": true })),
        )
        .await;
    }
    send(&app, "POST", "/orders/1/deliver", None).await;

    let (_, pending) = send(&app, "GET", "/orders?status=pending", None).await;
    assert_eq!(pending.as_array().unwrap().len(), 1);
    assert_eq!(pending[0]["id"], 2);

    let (_, delivered) = send(&app, "GET", "/orders?status=delivered", None).await;
    assert_eq!(delivered[0]["id"], 1);

    let (status, _) = send(&app, "GET", "/orders?status=shipped", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_file_backend_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        store_backend: StoreBackend::File,
        data_dir: dir.path().join("ledger-data"),
        ..Config::default()
    };

    {
        let store = api::build_store(&config).await.unwrap();
        let state = api::create_state(store, LedgerConfig::default(), InMemoryInventoryService::new());
        let app = api::create_app(state, get_metrics_handle());
        send(&app, "POST", "/cart/items", Some(collar(3))).await;
        let (status, _) = send(
            &app,
            "POST",
            "/checkout",
            Some(json!({ "payment_method": "Card", "payment_confirmed": true, "customer": "kim@example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let store = api::build_store(&config).await.unwrap();
    let state = api::create_state(store, LedgerConfig::default(), InMemoryInventoryService::new());
    let app = api::create_app(state, get_metrics_handle());

    let (_, order) = send(&app, "GET", "/orders/1", None).await;
    assert_eq!(order["total"], 3000);
    assert_eq!(order["customer"], "kim@example.com");
}
