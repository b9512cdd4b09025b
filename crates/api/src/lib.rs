//! HTTP API server with observability for the order engine.
//!
//! Exposes the cart, the payment notification webhook and the shipment
//! label runner over REST, with structured logging (tracing) and
//! Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{delete, get, post, put};
use cart::CartLedger;
use metrics_exporter_prometheus::PrometheusHandle;
use reconciler::{InMemoryPaymentGateway, PaymentReconciler};
use shipment::{InMemoryShippingProvider, ShipmentOrchestrator};
use store::{
    CartStore, CatalogStore, InMemoryCartStore, InMemoryCatalogStore, InMemoryOrderStore,
    InMemoryShipmentLogStore, OrderStore, ShipmentLogStore,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// The all-in-memory state used by tests and `DATABASE_URL`-less runs.
pub type InMemoryAppState =
    AppState<InMemoryCatalogStore, InMemoryCartStore, InMemoryOrderStore, InMemoryShipmentLogStore>;

/// Handles onto the in-memory backends, for seeding tests and demos.
pub struct InMemoryBackends {
    pub catalog: InMemoryCatalogStore,
    pub cart: InMemoryCartStore,
    pub orders: InMemoryOrderStore,
    pub shipment_log: InMemoryShipmentLogStore,
    pub gateway: InMemoryPaymentGateway,
    pub provider: InMemoryShippingProvider,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<C, S, O, L>(
    state: Arc<AppState<C, S, O, L>>,
    metrics_handle: PrometheusHandle,
) -> Router
where
    C: CatalogStore + Clone + 'static,
    S: CartStore + Clone + 'static,
    O: OrderStore + Clone + 'static,
    L: ShipmentLogStore + Clone + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/cart", get(routes::cart::view::<C, S, O, L>))
        .route("/cart", delete(routes::cart::clear::<C, S, O, L>))
        .route("/cart/items", post(routes::cart::add_item::<C, S, O, L>))
        .route("/cart/items/{id}", put(routes::cart::update_item::<C, S, O, L>))
        .route(
            "/cart/items/{id}",
            delete(routes::cart::remove_item::<C, S, O, L>),
        )
        .route(
            "/payment-notifications",
            post(routes::notifications::receive::<C, S, O, L>),
        )
        .route(
            "/payment-notifications",
            get(routes::notifications::receive::<C, S, O, L>),
        )
        .route("/orders/{id}", get(routes::orders::get::<C, S, O, L>))
        .route(
            "/orders/{id}/shipment-log",
            get(routes::orders::shipment_log::<C, S, O, L>),
        )
        .route(
            "/orders/{id}/shipment-label",
            post(routes::orders::create_shipment_label::<C, S, O, L>),
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

/// Wires the engines over the given backends into shared state.
pub fn create_state<C, S, O, L>(
    catalog: C,
    cart_store: S,
    orders: O,
    shipment_log: L,
    gateway: InMemoryPaymentGateway,
    provider: InMemoryShippingProvider,
    upstream_timeout: Duration,
) -> Arc<AppState<C, S, O, L>>
where
    C: CatalogStore + Clone + 'static,
    S: CartStore + Clone + 'static,
    O: OrderStore + Clone + 'static,
    L: ShipmentLogStore + Clone + 'static,
{
    Arc::new(AppState {
        cart: CartLedger::new(catalog, cart_store),
        reconciler: PaymentReconciler::new(gateway, orders.clone(), upstream_timeout),
        shipment: ShipmentOrchestrator::new(
            provider,
            orders.clone(),
            shipment_log.clone(),
            upstream_timeout,
        ),
        orders,
        shipment_log,
    })
}

/// Creates all-in-memory application state plus handles for seeding it.
pub fn create_default_state(
    upstream_timeout: Duration,
) -> (Arc<InMemoryAppState>, InMemoryBackends) {
    let backends = InMemoryBackends {
        catalog: InMemoryCatalogStore::new(),
        cart: InMemoryCartStore::new(),
        orders: InMemoryOrderStore::new(),
        shipment_log: InMemoryShipmentLogStore::new(),
        gateway: InMemoryPaymentGateway::new(),
        provider: InMemoryShippingProvider::new(),
    };
    let state = create_state(
        backends.catalog.clone(),
        backends.cart.clone(),
        backends.orders.clone(),
        backends.shipment_log.clone(),
        backends.gateway.clone(),
        backends.provider.clone(),
        upstream_timeout,
    );
    (state, backends)
}
