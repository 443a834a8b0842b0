//! HTTP API server with observability for the pet-supply checkout core.
//!
//! Provides REST endpoints for the shared cart, checkout, orders and sales,
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use checkout::{CheckoutCoordinator, InMemoryInventoryService};
use domain::{Cart, LedgerConfig, OrderLedger};
use kv_store::{FileStore, InMemoryStore, KeyValueStore, PostgresStore, StoreError};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::{Config, StoreBackend};

/// Store type chosen at startup from configuration.
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Shared application state accessible from all handlers.
pub struct AppState {
    /// The single active cart. Handlers hold the lock for the whole request.
    pub cart: Mutex<Cart>,
    pub ledger: Arc<OrderLedger<SharedStore>>,
    pub checkout: CheckoutCoordinator<SharedStore, InMemoryInventoryService>,
    pub inventory: InMemoryInventoryService,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/cart", get(routes::cart::get).delete(routes::cart::clear))
        .route("/cart/items", post(routes::cart::add_item))
        .route(
            "/cart/items/{id}",
            put(routes::cart::set_quantity).delete(routes::cart::remove_item),
        )
        .route("/cart/items/{id}/increment", post(routes::cart::increment))
        .route("/cart/items/{id}/decrement", post(routes::cart::decrement))
        .route("/checkout", post(routes::checkout::checkout))
        .route("/orders", get(routes::orders::list))
        .route("/orders/{id}", get(routes::orders::get))
        .route("/orders/{id}/deliver", post(routes::orders::deliver))
        .route("/sales", get(routes::sales::list).delete(routes::sales::clear))
        .route(
            "/inventory/{catalog_item_id}",
            get(routes::inventory::get).put(routes::inventory::set),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state over `store`.
pub fn create_state(
    store: SharedStore,
    ledger_config: LedgerConfig,
    inventory: InMemoryInventoryService,
) -> Arc<AppState> {
    let ledger = Arc::new(OrderLedger::with_config(store, ledger_config));
    let checkout = CheckoutCoordinator::new(Arc::clone(&ledger), inventory.clone());

    Arc::new(AppState {
        cart: Mutex::new(Cart::new()),
        ledger,
        checkout,
        inventory,
    })
}

/// Creates state over an in-memory store with an empty inventory.
pub fn create_default_state() -> Arc<AppState> {
    create_state(
        Arc::new(InMemoryStore::new()),
        LedgerConfig::default(),
        InMemoryInventoryService::new(),
    )
}

/// Opens the store selected by `config`.
///
/// The PostgreSQL backend runs pending migrations before returning.
#[tracing::instrument(skip(config), fields(backend = ?config.store_backend))]
pub async fn build_store(config: &Config) -> Result<SharedStore, StoreError> {
    let store: SharedStore = match config.store_backend {
        StoreBackend::Memory => Arc::new(InMemoryStore::new()),
        StoreBackend::File => {
            tokio::fs::create_dir_all(&config.data_dir).await?;
            Arc::new(FileStore::new(&config.data_dir))
        }
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| StoreError::Unavailable("DATABASE_URL not set".to_string()))?;
            let store = PostgresStore::connect(url).await?;
            store.run_migrations().await?;
            Arc::new(store)
        }
    };

    tracing::info!("store ready");
    Ok(store)
}
