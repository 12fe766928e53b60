//! In-memory order cache.
//!
//! A full-population cache: every order the store knows about is expected to
//! fit in memory, so there is no eviction, no TTL and no capacity bound.
//! Entries live for the lifetime of the process and are replaced wholesale
//! only by [`OrderCache::restore`] during startup rehydration.

use std::collections::HashMap;
use std::sync::RwLock;

use orderhub_core::Order;

/// Capability interface for anything that caches orders by uid.
///
/// All operations are in-memory and infallible. Implementations must allow
/// any number of concurrent readers; a writer excludes others only for the
/// duration of its own operation, never across surrounding I/O.
pub trait OrderCache: Send + Sync {
    /// Unconditional upsert.
    fn set(&self, order_uid: &str, order: Order);

    /// Non-mutating lookup. `None` signals absence, not an error.
    fn get(&self, order_uid: &str) -> Option<Order>;

    /// Independent snapshot copy of the full contents.
    fn get_all(&self) -> HashMap<String, Order>;

    /// Atomically replace the entire contents with `orders`.
    ///
    /// Concurrent readers observe either the complete pre-restore state or
    /// the complete post-restore state, never a mix.
    fn restore(&self, orders: HashMap<String, Order>);
}

/// The process-wide cache instance backed by `RwLock<HashMap>`.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    orders: RwLock<HashMap<String, Order>>,
}

impl InMemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Order>> {
        // A panicked writer cannot leave a torn map: every write is a single
        // insert or a whole-map swap, so poisoning is safe to clear.
        self.orders
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Order>> {
        self.orders
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl OrderCache for InMemoryCache {
    fn set(&self, order_uid: &str, order: Order) {
        self.write().insert(order_uid.to_owned(), order);
    }

    fn get(&self, order_uid: &str) -> Option<Order> {
        self.read().get(order_uid).cloned()
    }

    fn get_all(&self) -> HashMap<String, Order> {
        self.read().clone()
    }

    fn restore(&self, orders: HashMap<String, Order>) {
        *self.write() = orders;
    }
}
