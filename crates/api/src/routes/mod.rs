//! HTTP route handlers and shared application state.

pub mod cart;
pub mod health;
pub mod metrics;
pub mod notifications;
pub mod orders;

use ::cart::CartLedger;
use axum::http::HeaderMap;
use common::UserId;
use domain::EngineError;
use reconciler::{InMemoryPaymentGateway, PaymentReconciler};
use shipment::{InMemoryShippingProvider, ShipmentOrchestrator};
use store::{CartStore, CatalogStore, OrderStore, ShipmentLogStore};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
///
/// Generic over the four store backends so the same router serves both
/// the in-memory and the PostgreSQL wiring. The payment gateway and the
/// shipping provider are the in-memory stand-ins; HTTP-backed vendor
/// clients would slot in here.
pub struct AppState<C, S, O, L>
where
    C: CatalogStore,
    S: CartStore,
    O: OrderStore,
    L: ShipmentLogStore,
{
    pub cart: CartLedger<C, S>,
    pub reconciler: PaymentReconciler<InMemoryPaymentGateway, O>,
    pub shipment: ShipmentOrchestrator<InMemoryShippingProvider, O, L>,
    pub orders: O,
    pub shipment_log: L,
}

/// Extracts the calling user from the `x-user-id` header.
///
/// A missing or malformed header is unauthenticated; the engine never
/// sees a request without a valid user.
pub(crate) fn require_user(headers: &HeaderMap) -> Result<UserId, ApiError> {
    headers
        .get("x-user-id")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| UserId::parse(value).ok())
        .ok_or(ApiError::Engine(EngineError::Unauthenticated))
}
