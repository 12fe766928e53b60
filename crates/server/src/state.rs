//! Application state shared across handlers.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::ServerConfig;
use crate::services::OrderService;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; holds the order service and the sender side
/// of the ingestion feed channel.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    orders: OrderService,
    feed: mpsc::Sender<Vec<u8>>,
}

impl AppState {
    #[must_use]
    pub fn new(config: ServerConfig, orders: OrderService, feed: mpsc::Sender<Vec<u8>>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                orders,
                feed,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the order service.
    #[must_use]
    pub fn orders(&self) -> &OrderService {
        &self.inner.orders
    }

    /// Get a reference to the ingestion feed sender.
    #[must_use]
    pub fn feed(&self) -> &mpsc::Sender<Vec<u8>> {
        &self.inner.feed
    }
}
