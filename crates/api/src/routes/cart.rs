//! Cart endpoints.
//!
//! Every endpoint is scoped to the caller identified by the `x-user-id`
//! header; requests without one are rejected as unauthenticated before
//! touching any store.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use cart::{CartView, UpdateOutcome};
use common::{LineId, ProductId};
use domain::CartLine;
use serde::{Deserialize, Serialize};
use store::{CartStore, CatalogStore, OrderStore, ShipmentLogStore};

use crate::error::ApiError;
use crate::routes::{AppState, require_user};

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: u32,
}

// -- Response types --

#[derive(Serialize)]
pub struct CartLineResponse {
    pub line_id: String,
    pub product_id: String,
    pub quantity: u32,
    pub size: Option<String>,
    pub color: Option<String>,
}

fn line_response(line: &CartLine) -> CartLineResponse {
    CartLineResponse {
        line_id: line.id.to_string(),
        product_id: line.product_id.to_string(),
        quantity: line.quantity,
        size: line.size.clone(),
        color: line.color.clone(),
    }
}

// -- Handlers --

/// POST /cart/items — add a product to the caller's cart.
#[tracing::instrument(skip(state, headers, req))]
pub async fn add_item<C, S, O, L>(
    State(state): State<Arc<AppState<C, S, O, L>>>,
    headers: HeaderMap,
    Json(req): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<CartLineResponse>), ApiError>
where
    C: CatalogStore + Clone + 'static,
    S: CartStore + Clone + 'static,
    O: OrderStore + Clone + 'static,
    L: ShipmentLogStore + Clone + 'static,
{
    let user_id = require_user(&headers)?;
    if req.quantity == 0 {
        return Err(ApiError::BadRequest(
            "quantity must be at least 1".to_string(),
        ));
    }
    let product_id = parse_product_id(&req.product_id)?;

    let line = state
        .cart
        .add_to_cart(user_id, product_id, req.quantity, req.size, req.color)
        .await?;

    Ok((StatusCode::CREATED, Json(line_response(&line))))
}

/// GET /cart — the caller's cart joined with current catalog prices.
#[tracing::instrument(skip(state, headers))]
pub async fn view<C, S, O, L>(
    State(state): State<Arc<AppState<C, S, O, L>>>,
    headers: HeaderMap,
) -> Result<Json<CartView>, ApiError>
where
    C: CatalogStore + Clone + 'static,
    S: CartStore + Clone + 'static,
    O: OrderStore + Clone + 'static,
    L: ShipmentLogStore + Clone + 'static,
{
    let user_id = require_user(&headers)?;
    let view = state.cart.view_cart(user_id).await?;
    Ok(Json(view))
}

/// PUT /cart/items/{id} — set a line's quantity; zero removes the line.
#[tracing::instrument(skip(state, headers, req))]
pub async fn update_item<C, S, O, L>(
    State(state): State<Arc<AppState<C, S, O, L>>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Response, ApiError>
where
    C: CatalogStore + Clone + 'static,
    S: CartStore + Clone + 'static,
    O: OrderStore + Clone + 'static,
    L: ShipmentLogStore + Clone + 'static,
{
    let user_id = require_user(&headers)?;
    let line_id = parse_line_id(&id)?;

    match state
        .cart
        .update_quantity(user_id, line_id, req.quantity)
        .await?
    {
        UpdateOutcome::Updated(line) => Ok(Json(line_response(&line)).into_response()),
        UpdateOutcome::Removed => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// DELETE /cart/items/{id} — remove a line (idempotent).
#[tracing::instrument(skip(state, headers))]
pub async fn remove_item<C, S, O, L>(
    State(state): State<Arc<AppState<C, S, O, L>>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError>
where
    C: CatalogStore + Clone + 'static,
    S: CartStore + Clone + 'static,
    O: OrderStore + Clone + 'static,
    L: ShipmentLogStore + Clone + 'static,
{
    let user_id = require_user(&headers)?;
    let line_id = parse_line_id(&id)?;
    state.cart.remove_from_cart(user_id, line_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /cart — drop every line in the caller's cart (idempotent).
#[tracing::instrument(skip(state, headers))]
pub async fn clear<C, S, O, L>(
    State(state): State<Arc<AppState<C, S, O, L>>>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError>
where
    C: CatalogStore + Clone + 'static,
    S: CartStore + Clone + 'static,
    O: OrderStore + Clone + 'static,
    L: ShipmentLogStore + Clone + 'static,
{
    let user_id = require_user(&headers)?;
    state.cart.clear_cart(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn parse_product_id(id: &str) -> Result<ProductId, ApiError> {
    ProductId::parse(id).map_err(|e| ApiError::BadRequest(format!("invalid product id: {e}")))
}

fn parse_line_id(id: &str) -> Result<LineId, ApiError> {
    LineId::parse(id).map_err(|e| ApiError::BadRequest(format!("invalid line id: {e}")))
}
