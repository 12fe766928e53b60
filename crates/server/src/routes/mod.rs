//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /orders/{order_uid} - Order lookup (JSON aggregate)
//! POST /orders             - Direct order creation
//! POST /ingest             - Raw feed payload into the ingestion channel
//! ```
//!
//! Health endpoints and static file serving are wired in `main.rs`.

pub mod orders;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the application routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", post(orders::create))
        .route("/orders/{order_uid}", get(orders::show))
        .route("/ingest", post(orders::ingest))
}
