//! Durable persistence for order aggregates.
//!
//! # Database
//!
//! One logical Order aggregate is split across four tables, all keyed by
//! `order_uid`:
//!
//! - `orders` - scalar metadata, one row per aggregate (primary key)
//! - `deliveries` - one row per aggregate
//! - `payments` - one row per aggregate
//! - `items` - zero or more rows per aggregate
//!
//! Child tables reference `orders(order_uid)`, so the parent row is always
//! inserted first within the transaction.
//!
//! # Migrations
//!
//! Migrations live in `crates/server/migrations/` and run automatically at
//! startup via `sqlx::migrate!`.

pub mod orders;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use orderhub_core::Order;

pub use orders::PgOrderStore;

/// Errors surfaced by the persistence layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Underlying database failure (connection, query, transaction).
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// No row matched the requested key.
    #[error("no matching row")]
    NotFound,

    /// A uniqueness constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A stored row failed to decode into the domain type.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Capability interface for anything that durably stores orders.
///
/// The store owns ground truth: the cache is only ever populated from a
/// value that has passed through one of these operations.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist a full aggregate atomically.
    ///
    /// Either every row of the aggregate is committed or none is. A
    /// duplicate `order_uid` fails with [`RepositoryError::Conflict`].
    async fn create(&self, order: &Order) -> Result<(), RepositoryError>;

    /// Fetch a fully assembled aggregate by uid.
    ///
    /// Fails with [`RepositoryError::NotFound`] if no order row matches.
    async fn get_by_uid(&self, order_uid: &str) -> Result<Order, RepositoryError>;

    /// Fetch every stored aggregate.
    ///
    /// Enumerates all uids and fetches each aggregate individually, so this
    /// is an O(n) sequence of round trips. It runs once at startup and must
    /// not be reused on a latency-sensitive path.
    async fn get_all(&self) -> Result<Vec<Order>, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
