//! Orderhub server binary.
//!
//! # Architecture
//!
//! - Axum serving order lookups and creation
//! - `PostgreSQL` as durable ground truth for the Order aggregate
//! - Full-population in-memory cache in front of it, rehydrated from the
//!   store at startup before traffic is accepted
//! - Ingestion feed worker consuming raw payloads from a bounded channel

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::Path;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Router, routing::get};
use tokio::sync::mpsc;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use orderhub_server::cache::{InMemoryCache, OrderCache};
use orderhub_server::config::ServerConfig;
use orderhub_server::db::{self, OrderStore, PgOrderStore};
use orderhub_server::services::OrderService;
use orderhub_server::state::AppState;
use orderhub_server::{ingest, routes};

#[tokio::main]
async fn main() {
    // Load configuration from environment
    let config = ServerConfig::from_env().expect("Failed to load configuration");

    // Initialize tracing with EnvFilter
    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "orderhub_server=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Initialize database connection pool
    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    // Build the cache-aside stack: store, cache, service
    let store = PgOrderStore::new(pool.clone());
    let cache = Arc::new(InMemoryCache::new());
    let service = OrderService::new(
        Arc::new(store.clone()) as Arc<dyn OrderStore>,
        Arc::clone(&cache) as Arc<dyn OrderCache>,
    );

    // Rehydrate the cache before accepting traffic. A failure here is not
    // fatal: the service starts with an empty cache and repairs on read.
    match service.rehydrate().await {
        Ok(count) => tracing::info!(count, "cache rehydrated from store"),
        Err(e) => tracing::warn!(error = %e, "cache rehydration failed, starting empty"),
    }

    // Start the ingestion feed worker
    let (feed_tx, feed_rx) = mpsc::channel(config.ingest_buffer);
    let ingest_worker = tokio::spawn(ingest::run(service.clone(), feed_rx));

    // Build application state and router
    let static_dir = config.static_dir.clone();
    let state = AppState::new(config.clone(), service, feed_tx);

    let app = Router::new()
        .merge(routes::routes().with_state(state))
        .merge(
            Router::new()
                .route("/health", get(health))
                .route("/health/ready", get(readiness))
                .with_state(pool.clone()),
        )
        .route_service("/", ServeFile::new(Path::new(&static_dir).join("index.html")))
        .nest_service("/static", ServeDir::new(&static_dir))
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = config.socket_addr();
    tracing::info!("orderhub listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // The router (and its feed sender) is gone; let the worker drain and exit
    if let Err(e) = ingest_worker.await {
        tracing::warn!(error = %e, "ingest worker ended abnormally");
    }

    store.close().await;
    tracing::info!("Database pool closed, exiting");
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies database connectivity before returning OK.
async fn readiness(State(pool): State<sqlx::PgPool>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(&pool).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
