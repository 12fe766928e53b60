//! Order route handlers.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;

use orderhub_core::Order;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Response body for a successful creation.
#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub order_uid: String,
}

/// `GET /orders/{order_uid}` - look up one order aggregate.
///
/// A blank identifier is a client error (400); an unknown identifier is 404.
pub async fn show(
    State(state): State<AppState>,
    Path(order_uid): Path<String>,
) -> Result<Json<Order>> {
    let order_uid = order_uid.trim();
    if order_uid.is_empty() {
        return Err(AppError::BadRequest("order identifier is required".to_owned()));
    }

    let order = state.orders().get_by_uid(order_uid).await?;
    Ok(Json(order))
}

/// `POST /orders` - direct creation of one order aggregate.
pub async fn create(
    State(state): State<AppState>,
    Json(order): Json<Order>,
) -> Result<(StatusCode, Json<CreatedResponse>)> {
    let order_uid = order.order_uid.clone();
    state.orders().create_order(order).await?;

    Ok((StatusCode::CREATED, Json(CreatedResponse { order_uid })))
}

/// `POST /ingest` - hand a raw feed payload to the ingestion worker.
///
/// Accepts the payload without waiting for it to be processed; decode and
/// persistence failures are handled (and logged) by the worker.
pub async fn ingest(State(state): State<AppState>, body: Bytes) -> Result<StatusCode> {
    state
        .feed()
        .send(body.to_vec())
        .await
        .map_err(|_| AppError::Unavailable("ingestion feed is not running".to_owned()))?;

    Ok(StatusCode::ACCEPTED)
}
