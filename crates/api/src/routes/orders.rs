//! Order read endpoints and the shipment label trigger.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::OrderId;
use domain::{Address, EngineError, Order, ShipmentLogEntry};
use serde::Deserialize;
use shipment::{LabelOutcome, LabelRequest};
use store::{CartStore, CatalogStore, OrderStore, ShipmentLogStore};

use crate::error::ApiError;
use crate::routes::AppState;

#[derive(Debug, Deserialize)]
pub struct LabelRequestBody {
    /// Provider carrier/service selector.
    pub service_id: u32,
    /// Shipment origin, supplied by the operator.
    pub from: Address,
}

/// GET /orders/{id} — load an order with its statuses and lines.
#[tracing::instrument(skip(state))]
pub async fn get<C, S, O, L>(
    State(state): State<Arc<AppState<C, S, O, L>>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError>
where
    C: CatalogStore + Clone + 'static,
    S: CartStore + Clone + 'static,
    O: OrderStore + Clone + 'static,
    L: ShipmentLogStore + Clone + 'static,
{
    let order_id = parse_order_id(&id)?;
    let order = state
        .orders
        .get_order(order_id)
        .await
        .map_err(EngineError::from)?
        .ok_or_else(|| ApiError::Engine(EngineError::not_found("order", order_id)))?;
    Ok(Json(order))
}

/// GET /orders/{id}/shipment-log — label run history for an order.
#[tracing::instrument(skip(state))]
pub async fn shipment_log<C, S, O, L>(
    State(state): State<Arc<AppState<C, S, O, L>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ShipmentLogEntry>>, ApiError>
where
    C: CatalogStore + Clone + 'static,
    S: CartStore + Clone + 'static,
    O: OrderStore + Clone + 'static,
    L: ShipmentLogStore + Clone + 'static,
{
    let order_id = parse_order_id(&id)?;
    let entries = state
        .shipment_log
        .entries_for_order(order_id)
        .await
        .map_err(EngineError::from)?;
    Ok(Json(entries))
}

/// POST /orders/{id}/shipment-label — run the label sequence for a
/// confirmed order.
#[tracing::instrument(skip(state, req))]
pub async fn create_shipment_label<C, S, O, L>(
    State(state): State<Arc<AppState<C, S, O, L>>>,
    Path(id): Path<String>,
    Json(req): Json<LabelRequestBody>,
) -> Result<(StatusCode, Json<LabelOutcome>), ApiError>
where
    C: CatalogStore + Clone + 'static,
    S: CartStore + Clone + 'static,
    O: OrderStore + Clone + 'static,
    L: ShipmentLogStore + Clone + 'static,
{
    let order_id = parse_order_id(&id)?;
    let outcome = state
        .shipment
        .generate_label(LabelRequest {
            order_id,
            service_id: req.service_id,
            from: req.from,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    OrderId::parse(id).map_err(|e| ApiError::BadRequest(format!("invalid order id: {e}")))
}
