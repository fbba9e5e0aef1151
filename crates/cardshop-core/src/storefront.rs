// ── Storefront facade ──
//
// Owns one cache per entity family, the HTTP gateways behind them, and the
// background refresh task. Consumers construct it explicitly and pass it
// around; there is no global instance.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use cardshop_api::{ShopClient, TlsMode, TransportConfig};

use crate::config::{ServiceConfig, TlsVerification};
use crate::coordinator::{Mutation, MutationCoordinator, MutationHandle};
use crate::error::CoreError;
use crate::gateway::{CardGateway, Gateway, OrderGateway, WorkerGateway};
use crate::model::{
    Card, Entity, Order, OrderItem, Searchable, Worker, has_active_orders, next_employee_id,
    next_order_id, orders_for_employee,
};
use crate::store::{EntityCollection, InsertPosition, Snapshot};
use crate::stream::EntityStream;
use crate::view::DerivedView;

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

// ── EntityCache ──────────────────────────────────────────────────

/// One entity family: its store, its gateway, and the coordinator that
/// mutates the former through the latter.
pub struct EntityCache<T: Entity, G> {
    store: Arc<EntityCollection<T>>,
    gateway: Arc<G>,
    coordinator: MutationCoordinator<T, G>,
}

impl<T: Entity, G> Clone for EntityCache<T, G> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            gateway: Arc::clone(&self.gateway),
            coordinator: self.coordinator.clone(),
        }
    }
}

impl<T: Entity, G: Gateway<T>> EntityCache<T, G> {
    pub fn new(insert_at: InsertPosition, gateway: G, mutation_timeout: Option<Duration>) -> Self {
        let store = Arc::new(EntityCollection::new(insert_at));
        let gateway = Arc::new(gateway);
        let coordinator = MutationCoordinator::with_default_timeout(
            Arc::clone(&store),
            Arc::clone(&gateway),
            mutation_timeout,
        );
        Self {
            store,
            gateway,
            coordinator,
        }
    }

    pub fn store(&self) -> &Arc<EntityCollection<T>> {
        &self.store
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn coordinator(&self) -> &MutationCoordinator<T, G> {
        &self.coordinator
    }

    pub fn snapshot(&self) -> Snapshot<T> {
        self.store.snapshot()
    }

    pub fn stream(&self) -> EntityStream<T> {
        self.store.stream()
    }

    pub fn get(&self, key: &T::Key) -> Option<Arc<T>> {
        self.store.get(key)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Replace the whole collection with the gateway's current contents.
    ///
    /// Does not wait for pending mutations; a reload that lands while one
    /// is in flight is overwritten by that mutation's commit or rollback.
    pub async fn reload(&self) -> Result<usize, CoreError> {
        let items = self.gateway.fetch_all().await?;
        let count = items.len();
        self.store.replace(items);
        debug!(entity = T::KIND, count, "collection reloaded");
        Ok(count)
    }

    /// Fetch one entity and store it, or drop it locally if the service no
    /// longer has it.
    pub async fn reload_one(&self, key: &T::Key) -> Result<Arc<T>, CoreError> {
        match self.gateway.fetch_one(key).await {
            Ok(item) => Ok(self.store.rekey(key, item)),
            Err(e) => {
                if matches!(e, CoreError::NotFound { .. }) {
                    self.store.remove(key);
                }
                Err(e)
            }
        }
    }

    // ── Mutations ────────────────────────────────────────────────────

    pub fn submit(&self, mutation: Mutation<T>) -> MutationHandle<T> {
        self.coordinator.submit(mutation)
    }

    // The coordinator joins the key's queue when these are called, not
    // when the returned future is first polled.

    pub fn create(&self, item: T) -> impl Future<Output = Result<Arc<T>, CoreError>> + use<T, G> {
        self.coordinator.create(item)
    }

    pub fn update(
        &self,
        key: T::Key,
        patch: T::Patch,
    ) -> impl Future<Output = Result<Arc<T>, CoreError>> + use<T, G> {
        self.coordinator.update(key, patch)
    }

    pub fn delete(&self, key: T::Key) -> impl Future<Output = Result<(), CoreError>> + use<T, G> {
        self.coordinator.delete(key)
    }

    pub fn pending(&self, key: &T::Key) -> bool {
        self.coordinator.pending(key)
    }
}

impl<T: Entity + Searchable, G: Gateway<T>> EntityCache<T, G> {
    /// A fresh view over this collection with an empty query.
    pub fn view(&self) -> DerivedView<T> {
        DerivedView::new(&self.store)
    }
}

// ── Storefront ───────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<StorefrontInner>`. Manages the initial load,
/// periodic refresh, and the three entity caches.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: ServiceConfig,
    cards: EntityCache<Card, CardGateway>,
    orders: EntityCache<Order, OrderGateway>,
    workers: EntityCache<Worker, WorkerGateway>,
    connection_state: watch::Sender<ConnectionState>,
    /// Child token for the current connection; cancelled on shutdown and
    /// replaced so the storefront can connect again.
    cancel: Mutex<CancellationToken>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Storefront {
    /// Build the HTTP client and caches. Does NOT load anything; call
    /// [`connect()`](Self::connect).
    pub fn new(config: ServiceConfig) -> Result<Self, CoreError> {
        let transport = build_transport(&config);
        let client = ShopClient::new(config.base_url.as_str(), &transport)?;
        Ok(Self::with_client(config, client))
    }

    /// Use an already-built client (custom middleware, shared pools).
    pub fn with_client(config: ServiceConfig, client: ShopClient) -> Self {
        let client = Arc::new(client);
        let timeout = config.mutation_timeout;
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);

        Self {
            inner: Arc::new(StorefrontInner {
                cards: EntityCache::new(
                    InsertPosition::Append,
                    CardGateway::new(Arc::clone(&client)),
                    timeout,
                ),
                orders: EntityCache::new(
                    InsertPosition::Prepend,
                    OrderGateway::new(Arc::clone(&client)),
                    timeout,
                ),
                workers: EntityCache::new(
                    InsertPosition::Append,
                    WorkerGateway::new(client),
                    timeout,
                ),
                config,
                connection_state,
                cancel: Mutex::new(CancellationToken::new()),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.inner.config
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Load every collection, then start the periodic refresh if one is
    /// configured.
    pub async fn connect(&self) -> Result<(), CoreError> {
        let _ = self
            .inner
            .connection_state
            .send(ConnectionState::Connecting);

        if let Err(e) = self.full_refresh().await {
            let _ = self.inner.connection_state.send(ConnectionState::Failed);
            return Err(e);
        }

        let interval_secs = self.inner.config.refresh_interval_secs;
        if interval_secs > 0 {
            let cancel = self.inner.cancel.lock().await.clone();
            let storefront = self.clone();
            self.inner
                .task_handles
                .lock()
                .await
                .push(tokio::spawn(refresh_task(storefront, interval_secs, cancel)));
        }

        let _ = self.inner.connection_state.send(ConnectionState::Connected);
        info!(url = %self.inner.config.base_url, "connected to storefront service");
        Ok(())
    }

    /// Fetch all three collections concurrently. The stores are only
    /// touched if every fetch succeeds.
    pub async fn full_refresh(&self) -> Result<(), CoreError> {
        let (cards, orders, workers) = tokio::join!(
            self.inner.cards.gateway().fetch_all(),
            self.inner.orders.gateway().fetch_all(),
            self.inner.workers.gateway().fetch_all(),
        );
        let (cards, orders, workers) = (cards?, orders?, workers?);

        info!(
            cards = cards.len(),
            orders = orders.len(),
            workers = workers.len(),
            "data refresh complete"
        );
        self.inner.cards.store().replace(cards);
        self.inner.orders.store().replace(orders);
        self.inner.workers.store().replace(workers);
        Ok(())
    }

    /// Stop background tasks. Mutations already submitted still settle.
    pub async fn shutdown(&self) {
        {
            let mut cancel = self.inner.cancel.lock().await;
            cancel.cancel();
            *cancel = CancellationToken::new();
        }

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        let _ = self
            .inner
            .connection_state
            .send(ConnectionState::Disconnected);
        debug!("storefront shut down");
    }

    /// Connect, run `f`, shut down. Periodic refresh is disabled since a
    /// single command only needs one load.
    pub async fn oneshot<F, Fut, R>(config: ServiceConfig, f: F) -> Result<R, CoreError>
    where
        F: FnOnce(Storefront) -> Fut,
        Fut: Future<Output = Result<R, CoreError>>,
    {
        let mut cfg = config;
        cfg.refresh_interval_secs = 0;

        let storefront = Storefront::new(cfg)?;
        storefront.connect().await?;
        let result = f(storefront.clone()).await;
        storefront.shutdown().await;
        result
    }

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    // ── Entity caches ────────────────────────────────────────────────

    pub fn cards(&self) -> &EntityCache<Card, CardGateway> {
        &self.inner.cards
    }

    pub fn orders(&self) -> &EntityCache<Order, OrderGateway> {
        &self.inner.orders
    }

    pub fn workers(&self) -> &EntityCache<Worker, WorkerGateway> {
        &self.inner.workers
    }

    // ── Domain queries ───────────────────────────────────────────────

    /// Id to use for a new order: one past the highest cached id, and
    /// never below 5001.
    pub fn next_order_id(&self) -> Result<u64, CoreError> {
        let orders = self.inner.orders.snapshot();
        next_order_id(orders.iter().map(|o| &**o))
            .ok_or_else(|| CoreError::validation("order ids exhausted"))
    }

    pub fn next_employee_id(&self) -> Result<u64, CoreError> {
        let workers = self.inner.workers.snapshot();
        next_employee_id(workers.iter().map(|w| &**w))
            .ok_or_else(|| CoreError::validation("employee ids exhausted"))
    }

    pub fn orders_for_worker(&self, employee_id: u64) -> Vec<Arc<Order>> {
        self.inner
            .orders
            .snapshot()
            .iter()
            .filter(|o| o.employee_id == Some(employee_id))
            .cloned()
            .collect()
    }

    pub fn order_count_for_worker(&self, employee_id: u64) -> usize {
        let orders = self.inner.orders.snapshot();
        orders_for_employee(orders.iter().map(|o| &**o), employee_id).count()
    }

    /// Whether the worker still has pending or paid orders. Callers use this
    /// to refuse deleting staff with open work.
    pub fn has_active_orders(&self, employee_id: u64) -> bool {
        let orders = self.inner.orders.snapshot();
        has_active_orders(orders.iter().map(|o| &**o), employee_id)
    }

    /// Server-side card search. Does not touch the cache.
    pub async fn search_cards_remote(&self, query: &str) -> Result<Vec<Card>, CoreError> {
        self.inner.cards.gateway().search(query).await
    }

    /// The cached card an order line refers to: by key when the line has
    /// one, else by exact (case-insensitive) card name.
    pub fn card_for_item(&self, item: &OrderItem) -> Option<Arc<Card>> {
        if let Some(key) = &item.card {
            return self.inner.cards.get(key);
        }
        let name = item.name.as_deref()?.trim();
        self.inner
            .cards
            .snapshot()
            .iter()
            .find(|c| c.card_name.eq_ignore_ascii_case(name))
            .cloned()
    }
}

// ── Background tasks ─────────────────────────────────────────────

async fn refresh_task(storefront: Storefront, interval_secs: u64, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = storefront.full_refresh().await {
                    warn!(error = %e, "periodic refresh failed");
                }
            }
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────

fn build_transport(config: &ServiceConfig) -> TransportConfig {
    TransportConfig {
        tls: tls_to_transport(&config.tls),
        timeout: config.timeout,
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn transport_follows_service_config() {
        let mut config = ServiceConfig::new(url::Url::parse("https://shop.test").unwrap());
        config.tls = TlsVerification::DangerAcceptInvalid;
        config.timeout = Duration::from_secs(5);

        let transport = build_transport(&config);
        assert!(matches!(transport.tls, TlsMode::DangerAcceptInvalid));
        assert_eq!(transport.timeout, Duration::from_secs(5));
    }
}
