//! Cache-aside orchestration over the order store and the in-memory cache.
//!
//! This is the only component allowed to touch both. The contract:
//!
//! - writes: validate, persist in one transaction, and only after the commit
//!   populate the cache (write-through, never write-ahead)
//! - reads: check the cache first; on a miss fall back to the store and
//!   repair the cache before returning
//! - startup: load the full store contents into the cache in one atomic
//!   bulk replace
//!
//! The cache can therefore never hold an order the store does not have. The
//! service never holds the cache lock across a store await, so slow database
//! work cannot stall cache reads for unrelated keys. It adds no deadline of
//! its own; cancellation propagates by dropping the future, which aborts any
//! in-flight query and rolls back an uncommitted transaction.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, instrument};
use validator::Validate;

use orderhub_core::Order;

use crate::cache::OrderCache;
use crate::db::{OrderStore, RepositoryError};

/// Errors surfaced by order operations.
///
/// Decode and validation failures are distinct kinds so a caller can choose
/// different handling (discard a malformed payload vs. reject a structurally
/// invalid order).
#[derive(Debug, Error)]
pub enum OrderError {
    /// The order is structurally invalid; the message names the offending
    /// fields.
    #[error("order validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// The ingestion payload could not be decoded into an order.
    #[error("malformed order payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// No order with this uid exists.
    #[error("order {0} not found")]
    NotFound(String),

    /// An order with this uid already exists.
    #[error("order {0} already exists")]
    Duplicate(String),

    /// The persistence layer failed.
    #[error(transparent)]
    Store(RepositoryError),
}

/// Orchestration layer composing [`OrderStore`] and [`OrderCache`].
///
/// Cheap to clone; clones share the same store and cache instances.
#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn OrderStore>,
    cache: Arc<dyn OrderCache>,
}

impl OrderService {
    #[must_use]
    pub fn new(store: Arc<dyn OrderStore>, cache: Arc<dyn OrderCache>) -> Self {
        Self { store, cache }
    }

    /// Validate and durably persist an order, then populate the cache.
    ///
    /// The cache is written only after the store transaction commits; on any
    /// failure neither store nor cache is mutated.
    #[instrument(skip(self, order), fields(order_uid = %order.order_uid))]
    pub async fn create_order(&self, order: Order) -> Result<(), OrderError> {
        order.validate()?;

        self.store.create(&order).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => OrderError::Duplicate(order.order_uid.clone()),
            other => OrderError::Store(other),
        })?;

        let order_uid = order.order_uid.clone();
        self.cache.set(&order_uid, order);
        Ok(())
    }

    /// Look up an order by uid, cache first.
    ///
    /// A hit returns immediately with no store access. A miss falls back to
    /// the store and repairs the cache, so the next lookup for the same uid
    /// is a hit.
    #[instrument(skip(self))]
    pub async fn get_by_uid(&self, order_uid: &str) -> Result<Order, OrderError> {
        if let Some(order) = self.cache.get(order_uid) {
            debug!("cache hit");
            return Ok(order);
        }

        let order = self.store.get_by_uid(order_uid).await.map_err(|e| match e {
            RepositoryError::NotFound => OrderError::NotFound(order_uid.to_owned()),
            other => OrderError::Store(other),
        })?;

        debug!("cache miss, repaired from store");
        self.cache.set(order_uid, order.clone());
        Ok(order)
    }

    /// Decode a raw feed payload and create the order it describes.
    ///
    /// A payload that fails to decode touches neither store nor cache.
    /// Returns the uid of the created order.
    #[instrument(skip_all, fields(payload_len = payload.len()))]
    pub async fn process_message(&self, payload: &[u8]) -> Result<String, OrderError> {
        let order: Order = serde_json::from_slice(payload)?;
        let order_uid = order.order_uid.clone();

        self.create_order(order).await?;
        Ok(order_uid)
    }

    /// Rebuild the cache from the full store contents in one atomic bulk
    /// replace. Returns the number of orders loaded.
    #[instrument(skip(self))]
    pub async fn rehydrate(&self) -> Result<usize, OrderError> {
        let orders = self.store.get_all().await.map_err(OrderError::Store)?;
        let count = orders.len();

        self.cache.restore(
            orders
                .into_iter()
                .map(|order| (order.order_uid.clone(), order))
                .collect(),
        );

        Ok(count)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    use orderhub_core::{Delivery, Item, Payment};

    use super::*;
    use crate::cache::InMemoryCache;

    /// A structurally valid order for the given uid.
    pub(crate) fn sample_order(order_uid: &str) -> Order {
        Order {
            order_uid: order_uid.to_owned(),
            track_number: "WBILMTESTTRACK".to_owned(),
            entry: "WBIL".to_owned(),
            delivery: Delivery {
                name: "Test Testov".to_owned(),
                phone: "+9720000000".to_owned(),
                zip: "2639809".to_owned(),
                city: "Kiryat Mozkin".to_owned(),
                address: "Ploshad Mira 15".to_owned(),
                region: "Kraiot".to_owned(),
                email: "test@gmail.com".to_owned(),
            },
            payment: Payment {
                transaction: order_uid.to_owned(),
                request_id: String::new(),
                currency: "USD".to_owned(),
                provider: "wbpay".to_owned(),
                amount: 1817,
                payment_dt: 1_637_907_727,
                bank: "alpha".to_owned(),
                delivery_cost: 1500,
                goods_total: 317,
                custom_fee: 0,
            },
            items: vec![Item {
                chrt_id: 9_934_930,
                track_number: "WBILMTESTTRACK".to_owned(),
                price: 453,
                rid: "ab4219087a764ae0btest".to_owned(),
                name: "Mascaras".to_owned(),
                sale: 30,
                size: "0".to_owned(),
                total_price: 317,
                nm_id: 2_389_212,
                brand: "Vivienne Sabo".to_owned(),
                status: 202,
            }],
            locale: "en".to_owned(),
            internal_signature: String::new(),
            customer_id: "test".to_owned(),
            delivery_service: "meest".to_owned(),
            shardkey: "9".to_owned(),
            sm_id: 99,
            date_created: Utc.with_ymd_and_hms(2021, 11, 26, 6, 22, 19).unwrap(),
            oof_shard: "1".to_owned(),
        }
    }

    /// In-memory store double with per-operation call counters.
    #[derive(Default)]
    pub(crate) struct MockStore {
        orders: Mutex<HashMap<String, Order>>,
        pub creates: AtomicUsize,
        pub reads: AtomicUsize,
    }

    impl MockStore {
        pub(crate) fn with_orders(orders: Vec<Order>) -> Self {
            let store = Self::default();
            {
                let mut map = store.orders.lock().unwrap();
                for order in orders {
                    map.insert(order.order_uid.clone(), order);
                }
            }
            store
        }
    }

    #[async_trait]
    impl OrderStore for MockStore {
        async fn create(&self, order: &Order) -> Result<(), RepositoryError> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            let mut orders = self.orders.lock().unwrap();
            if orders.contains_key(&order.order_uid) {
                return Err(RepositoryError::Conflict(format!(
                    "order {} already exists",
                    order.order_uid
                )));
            }
            orders.insert(order.order_uid.clone(), order.clone());
            Ok(())
        }

        async fn get_by_uid(&self, order_uid: &str) -> Result<Order, RepositoryError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.orders
                .lock()
                .unwrap()
                .get(order_uid)
                .cloned()
                .ok_or(RepositoryError::NotFound)
        }

        async fn get_all(&self) -> Result<Vec<Order>, RepositoryError> {
            Ok(self.orders.lock().unwrap().values().cloned().collect())
        }
    }

    /// Cache double that counts `set` calls and delegates to a real cache.
    #[derive(Default)]
    struct CountingCache {
        inner: InMemoryCache,
        sets: AtomicUsize,
    }

    impl OrderCache for CountingCache {
        fn set(&self, order_uid: &str, order: Order) {
            self.sets.fetch_add(1, Ordering::SeqCst);
            self.inner.set(order_uid, order);
        }

        fn get(&self, order_uid: &str) -> Option<Order> {
            self.inner.get(order_uid)
        }

        fn get_all(&self) -> HashMap<String, Order> {
            self.inner.get_all()
        }

        fn restore(&self, orders: HashMap<String, Order>) {
            self.inner.restore(orders);
        }
    }

    fn service() -> (Arc<MockStore>, Arc<CountingCache>, OrderService) {
        let store = Arc::new(MockStore::default());
        let cache = Arc::new(CountingCache::default());
        let service = OrderService::new(
            Arc::clone(&store) as Arc<dyn OrderStore>,
            Arc::clone(&cache) as Arc<dyn OrderCache>,
        );
        (store, cache, service)
    }

    #[tokio::test]
    async fn create_then_get_is_a_cache_hit() {
        let (store, _cache, service) = service();
        let order = sample_order("uid-1");

        service.create_order(order.clone()).await.unwrap();
        let fetched = service.get_by_uid("uid-1").await.unwrap();

        assert_eq!(fetched, order);
        // The lookup never touched the store.
        assert_eq!(store.reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cold_read_repairs_the_cache() {
        let order = sample_order("uid-1");
        let store = Arc::new(MockStore::with_orders(vec![order.clone()]));
        let cache = Arc::new(CountingCache::default());
        let service = OrderService::new(
            Arc::clone(&store) as Arc<dyn OrderStore>,
            Arc::clone(&cache) as Arc<dyn OrderCache>,
        );

        let first = service.get_by_uid("uid-1").await.unwrap();
        assert_eq!(first, order);
        assert_eq!(store.reads.load(Ordering::SeqCst), 1);
        assert_eq!(cache.sets.load(Ordering::SeqCst), 1);

        // The second lookup is served from the repaired cache.
        let second = service.get_by_uid("uid-1").await.unwrap();
        assert_eq!(second, order);
        assert_eq!(store.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_uid_is_not_found() {
        let (_store, _cache, service) = service();

        let err = service.get_by_uid("missing").await.unwrap_err();
        assert!(matches!(err, OrderError::NotFound(uid) if uid == "missing"));
    }

    #[tokio::test]
    async fn invalid_order_touches_neither_store_nor_cache() {
        let (store, cache, service) = service();
        let mut order = sample_order("uid-1");
        order.order_uid = String::new();

        let err = service.create_order(order).await.unwrap_err();

        assert!(matches!(err, OrderError::Validation(_)));
        assert_eq!(store.creates.load(Ordering::SeqCst), 0);
        assert_eq!(cache.sets.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn validation_error_names_the_offending_field() {
        let (_store, _cache, service) = service();
        let mut order = sample_order("uid-1");
        order.order_uid = String::new();

        let err = service.create_order(order).await.unwrap_err();
        assert!(err.to_string().contains("order_uid"));
    }

    #[tokio::test]
    async fn malformed_payload_touches_neither_store_nor_cache() {
        let (store, cache, service) = service();

        let err = service.process_message(b"{not json").await.unwrap_err();

        assert!(matches!(err, OrderError::Decode(_)));
        assert_eq!(store.creates.load(Ordering::SeqCst), 0);
        assert_eq!(cache.sets.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn process_message_persists_a_valid_payload() {
        let (store, _cache, service) = service();
        let payload = serde_json::to_vec(&sample_order("uid-1")).unwrap();

        let uid = service.process_message(&payload).await.unwrap();

        assert_eq!(uid, "uid-1");
        assert_eq!(store.creates.load(Ordering::SeqCst), 1);
        assert_eq!(service.get_by_uid("uid-1").await.unwrap().order_uid, "uid-1");
    }

    #[tokio::test]
    async fn duplicate_create_is_rejected_distinctly() {
        let (_store, _cache, service) = service();
        let order = sample_order("uid-1");

        service.create_order(order.clone()).await.unwrap();
        let err = service.create_order(order).await.unwrap_err();

        assert!(matches!(err, OrderError::Duplicate(uid) if uid == "uid-1"));
    }

    #[tokio::test]
    async fn rehydrate_replaces_the_cache_wholesale() {
        let store = Arc::new(MockStore::with_orders(vec![
            sample_order("uid-1"),
            sample_order("uid-2"),
        ]));
        let cache = Arc::new(CountingCache::default());
        cache.set("stale", sample_order("stale"));
        let service = OrderService::new(
            Arc::clone(&store) as Arc<dyn OrderStore>,
            Arc::clone(&cache) as Arc<dyn OrderCache>,
        );

        let count = service.rehydrate().await.unwrap();

        assert_eq!(count, 2);
        let all = cache.get_all();
        assert_eq!(all.len(), 2);
        assert!(all.contains_key("uid-1"));
        assert!(all.contains_key("uid-2"));
        assert!(!all.contains_key("stale"));
    }

    #[tokio::test]
    async fn concurrent_creates_with_distinct_uids_all_land_in_the_cache() {
        const N: usize = 32;

        let (_store, cache, service) = service();

        let mut handles = Vec::with_capacity(N);
        for i in 0..N {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service.create_order(sample_order(&format!("uid-{i}"))).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(cache.get_all().len(), N);
    }
}
