//! Payment gateway webhook.
//!
//! The gateway retries any non-2xx response indefinitely, so this
//! handler only errors for malformed requests and storage failures.
//! Every gateway-side problem is acknowledged with a 200 carrying the
//! reconciliation outcome.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use store::{CartStore, CatalogStore, OrderStore, ShipmentLogStore};

use crate::error::ApiError;
use crate::routes::AppState;

#[derive(Debug, Deserialize)]
pub struct NotificationParams {
    pub topic: Option<String>,
    /// Some gateway configurations send `type` instead of `topic`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub id: Option<String>,
    /// Some configurations send `data.id` instead of `id`.
    #[serde(rename = "data.id")]
    pub data_id: Option<String>,
}

/// POST /payment-notifications — reconcile one gateway notification.
///
/// Registered for GET as well; the gateway delivers on both methods.
#[tracing::instrument(skip(state))]
pub async fn receive<C, S, O, L>(
    State(state): State<Arc<AppState<C, S, O, L>>>,
    Query(params): Query<NotificationParams>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    C: CatalogStore + Clone + 'static,
    S: CartStore + Clone + 'static,
    O: OrderStore + Clone + 'static,
    L: ShipmentLogStore + Clone + 'static,
{
    let topic = params
        .topic
        .or(params.kind)
        .ok_or_else(|| ApiError::BadRequest("missing topic parameter".to_string()))?;
    let id = params
        .id
        .or(params.data_id)
        .ok_or_else(|| ApiError::BadRequest("missing id parameter".to_string()))?;

    let outcome = state.reconciler.process(&topic, &id).await?;
    Ok(Json(serde_json::json!({ "status": outcome.as_str() })))
}
