//! Service layer orchestrating the store and the cache.

pub mod orders;

pub use orders::{OrderError, OrderService};
