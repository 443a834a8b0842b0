//! Order ledger service.

use chrono::Utc;
use common::OrderId;
use kv_store::KeyValueStore;
use tokio::sync::{Mutex, MutexGuard, watch};

use crate::cart::CartSnapshot;
use crate::error::LedgerError;
use crate::money::Money;
use crate::observable::Observable;
use crate::order::{Order, OrderError, Sale};

use super::{LedgerConfig, PersistedLedgerState, SCHEMA_VERSION};

/// In-memory mirror of the last durable ledger state.
#[derive(Debug)]
struct LedgerState {
    loaded: bool,
    next_id: OrderId,
    orders: Vec<Order>,
    sales: Vec<Sale>,
}

impl LedgerState {
    fn unloaded() -> Self {
        Self {
            loaded: false,
            next_id: OrderId::FIRST,
            orders: Vec::new(),
            sales: Vec::new(),
        }
    }

    fn to_persisted(&self, orders: Vec<Order>, sales: Vec<Sale>) -> PersistedLedgerState {
        PersistedLedgerState {
            schema_version: SCHEMA_VERSION,
            next_id: self.next_id,
            orders,
            sales,
        }
    }
}

/// Durable bookkeeping of orders and the sales derived from them.
///
/// The ledger owns its store and keeps the whole state under one key.
/// Mutations are serialized on an internal mutex and follow the same
/// pattern: build the next state off to the side, write it, and only then
/// make it visible. A failed write leaves the visible state untouched.
///
/// The first operation (or an explicit [`OrderLedger::initialize`]) loads
/// durable state; concurrent callers wait on the mutex until it is ready.
pub struct OrderLedger<S: KeyValueStore> {
    store: S,
    config: LedgerConfig,
    state: Mutex<LedgerState>,
    orders: Observable<Vec<Order>>,
    sales: Observable<Vec<Sale>>,
}

impl<S: KeyValueStore> OrderLedger<S> {
    /// Creates a ledger over `store` using the default storage key.
    pub fn new(store: S) -> Self {
        Self::with_config(store, LedgerConfig::default())
    }

    /// Creates a ledger with explicit configuration.
    pub fn with_config(store: S, config: LedgerConfig) -> Self {
        Self {
            store,
            config,
            state: Mutex::new(LedgerState::unloaded()),
            orders: Observable::new(Vec::new()),
            sales: Observable::new(Vec::new()),
        }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Loads the ledger from the store, replacing whatever is in memory.
    ///
    /// Durable state is the source of truth: a mutation that never finished
    /// its write is gone after this call.
    #[tracing::instrument(skip(self), fields(key = %self.config.storage_key))]
    pub async fn initialize(&self) -> Result<(), LedgerError> {
        let mut state = self.state.lock().await;
        self.load_into(&mut state).await
    }

    /// Registers an order for an anonymous customer.
    pub async fn register_order(
        &self,
        snapshot: &CartSnapshot,
        payment_method: impl Into<String>,
    ) -> Result<Order, LedgerError> {
        self.register_order_for(snapshot, payment_method, None)
            .await
    }

    /// Registers a pending order built from `snapshot`.
    ///
    /// An empty snapshot is rejected without consuming an id. Otherwise the
    /// order gets the next id, which is never handed out again, even if the
    /// write fails and the order is discarded.
    #[tracing::instrument(
        skip(self, snapshot, payment_method, customer),
        fields(items = snapshot.len(), total = %snapshot.total())
    )]
    pub async fn register_order_for(
        &self,
        snapshot: &CartSnapshot,
        payment_method: impl Into<String>,
        customer: Option<String>,
    ) -> Result<Order, LedgerError> {
        let payment_method = payment_method.into();
        let mut state = self.lock_ready().await?;

        if snapshot.is_empty() {
            return Err(OrderError::EmptyCart.into());
        }

        let order_id = state.next_id;
        state.next_id = order_id.next();

        let order = Order::place(order_id, snapshot, payment_method, customer, Utc::now())?;

        let mut orders = state.orders.clone();
        orders.push(order.clone());
        let next = state.to_persisted(orders, state.sales.clone());

        if let Err(e) = self.persist(&next).await {
            tracing::warn!(%order_id, error = %e, "order registration rolled back");
            return Err(e);
        }

        state.orders = next.orders;
        self.orders.publish(state.orders.clone());

        metrics::counter!("ledger_orders_registered_total").increment(1);
        tracing::info!(%order_id, total = %order.total(), "order registered");

        Ok(order)
    }

    /// Moves a pending order to Delivered and records its sale.
    ///
    /// The order update and the new sale are written together; calling this
    /// again for the same order fails with `NotPending` and records nothing.
    #[tracing::instrument(skip(self))]
    pub async fn mark_delivered(&self, order_id: OrderId) -> Result<Sale, LedgerError> {
        let mut state = self.lock_ready().await?;

        let index = state
            .orders
            .iter()
            .position(|order| order.id() == order_id)
            .ok_or(LedgerError::OrderNotFound(order_id))?;

        let (delivered, sale) = state.orders[index].deliver(Utc::now())?;

        let mut orders = state.orders.clone();
        orders[index] = delivered;
        let mut sales = state.sales.clone();
        sales.push(sale.clone());
        let next = state.to_persisted(orders, sales);

        if let Err(e) = self.persist(&next).await {
            tracing::warn!(%order_id, error = %e, "delivery rolled back");
            return Err(e);
        }

        state.orders = next.orders;
        state.sales = next.sales;
        self.orders.publish(state.orders.clone());
        self.sales.publish(state.sales.clone());

        metrics::counter!("ledger_sales_recorded_total").increment(1);
        tracing::info!(%order_id, total = %sale.total(), "order delivered");

        Ok(sale)
    }

    /// Empties the sales history. Orders are not affected.
    ///
    /// Returns the number of sales removed.
    #[tracing::instrument(skip(self))]
    pub async fn clear_sales_history(&self) -> Result<usize, LedgerError> {
        let mut state = self.lock_ready().await?;

        let removed = state.sales.len();
        let next = state.to_persisted(state.orders.clone(), Vec::new());
        self.persist(&next).await?;

        state.sales.clear();
        self.sales.publish(Vec::new());

        tracing::info!(removed, "sales history cleared");
        Ok(removed)
    }

    /// All orders in creation order.
    pub async fn orders(&self) -> Result<Vec<Order>, LedgerError> {
        Ok(self.lock_ready().await?.orders.clone())
    }

    /// All sales in delivery order.
    pub async fn sales(&self) -> Result<Vec<Sale>, LedgerError> {
        Ok(self.lock_ready().await?.sales.clone())
    }

    /// Looks up one order.
    pub async fn order(&self, order_id: OrderId) -> Result<Option<Order>, LedgerError> {
        let state = self.lock_ready().await?;
        Ok(state
            .orders
            .iter()
            .find(|order| order.id() == order_id)
            .cloned())
    }

    /// Orders still waiting for delivery.
    pub async fn pending_orders(&self) -> Result<Vec<Order>, LedgerError> {
        let state = self.lock_ready().await?;
        Ok(state
            .orders
            .iter()
            .filter(|order| order.is_pending())
            .cloned()
            .collect())
    }

    /// Sum of all recorded sales.
    pub async fn sales_total(&self) -> Result<Money, LedgerError> {
        let state = self.lock_ready().await?;
        Ok(state.sales.iter().map(Sale::total).sum())
    }

    /// The id the next registered order will receive.
    pub async fn next_id(&self) -> Result<OrderId, LedgerError> {
        Ok(self.lock_ready().await?.next_id)
    }

    /// Receiver yielding the full order list after every change.
    pub fn subscribe_orders(&self) -> watch::Receiver<Vec<Order>> {
        self.orders.subscribe()
    }

    /// Receiver yielding the full sales list after every change.
    pub fn subscribe_sales(&self) -> watch::Receiver<Vec<Sale>> {
        self.sales.subscribe()
    }

    async fn lock_ready(&self) -> Result<MutexGuard<'_, LedgerState>, LedgerError> {
        let mut state = self.state.lock().await;
        if !state.loaded {
            self.load_into(&mut state).await?;
        }
        Ok(state)
    }

    async fn load_into(&self, state: &mut LedgerState) -> Result<(), LedgerError> {
        let persisted = match self.store.get(&self.config.storage_key).await? {
            Some(bytes) => PersistedLedgerState::decode(&bytes)?,
            None => PersistedLedgerState::empty(),
        };

        let next_id = persisted.effective_next_id();
        *state = LedgerState {
            loaded: true,
            next_id,
            orders: persisted.orders,
            sales: persisted.sales,
        };

        self.orders.publish(state.orders.clone());
        self.sales.publish(state.sales.clone());

        tracing::info!(
            orders = state.orders.len(),
            sales = state.sales.len(),
            %next_id,
            "ledger loaded"
        );
        Ok(())
    }

    async fn persist(&self, next: &PersistedLedgerState) -> Result<(), LedgerError> {
        let bytes = next.encode()?;
        let started = std::time::Instant::now();

        let result = self.store.put(&self.config.storage_key, bytes).await;
        metrics::histogram!("ledger_persist_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        result.map_err(|e| {
            metrics::counter!("ledger_persist_failures_total").increment(1);
            LedgerError::Store(e)
        })
    }
}
