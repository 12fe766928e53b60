//! Postgres-backed order store.
//!
//! Queries are bound at runtime (`sqlx::query` + `Row::try_get`) rather than
//! through the compile-time macros, since the repository carries no offline
//! query cache.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use tracing::instrument;

use orderhub_core::{Delivery, Item, Order, Payment};

use super::{OrderStore, RepositoryError};

/// Order store backed by a `PostgreSQL` connection pool.
///
/// Cheap to clone; all clones share the same pool.
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    /// Create a new store on top of an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Close the underlying pool, waiting for checked-out connections to be
    /// returned. Called once during graceful shutdown.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn insert_order_row(
        tx: &mut Transaction<'_, Postgres>,
        order: &Order,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO orders (order_uid, track_number, entry, locale, internal_signature,
                                customer_id, delivery_service, shardkey, sm_id, date_created, oof_shard)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ",
        )
        .bind(&order.order_uid)
        .bind(&order.track_number)
        .bind(&order.entry)
        .bind(&order.locale)
        .bind(&order.internal_signature)
        .bind(&order.customer_id)
        .bind(&order.delivery_service)
        .bind(&order.shardkey)
        .bind(order.sm_id)
        .bind(order.date_created)
        .bind(&order.oof_shard)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict(format!(
                    "order {} already exists",
                    order.order_uid
                ));
            }
            RepositoryError::Database(e)
        })?;
        Ok(())
    }

    async fn insert_delivery_row(
        tx: &mut Transaction<'_, Postgres>,
        order_uid: &str,
        delivery: &Delivery,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO deliveries (order_uid, name, phone, zip, city, address, region, email)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(order_uid)
        .bind(&delivery.name)
        .bind(&delivery.phone)
        .bind(&delivery.zip)
        .bind(&delivery.city)
        .bind(&delivery.address)
        .bind(&delivery.region)
        .bind(&delivery.email)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn insert_payment_row(
        tx: &mut Transaction<'_, Postgres>,
        order_uid: &str,
        payment: &Payment,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO payments (order_uid, transaction, request_id, currency, provider,
                                  amount, payment_dt, bank, delivery_cost, goods_total, custom_fee)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ",
        )
        .bind(order_uid)
        .bind(&payment.transaction)
        .bind(&payment.request_id)
        .bind(&payment.currency)
        .bind(&payment.provider)
        .bind(payment.amount)
        .bind(payment.payment_dt)
        .bind(&payment.bank)
        .bind(payment.delivery_cost)
        .bind(payment.goods_total)
        .bind(payment.custom_fee)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn insert_item_row(
        tx: &mut Transaction<'_, Postgres>,
        order_uid: &str,
        item: &Item,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO items (order_uid, chrt_id, track_number, price, rid, name,
                               sale, size, total_price, nm_id, brand, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ",
        )
        .bind(order_uid)
        .bind(item.chrt_id)
        .bind(&item.track_number)
        .bind(item.price)
        .bind(&item.rid)
        .bind(&item.name)
        .bind(item.sale)
        .bind(&item.size)
        .bind(item.total_price)
        .bind(item.nm_id)
        .bind(&item.brand)
        .bind(item.status)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    /// Insert the whole aggregate in one transaction.
    ///
    /// The parent `orders` row goes first: every child table carries a
    /// foreign key to it. Any error drops the transaction, which rolls it
    /// back, so no partial rows survive on any path.
    #[instrument(skip(self, order), fields(order_uid = %order.order_uid))]
    async fn create(&self, order: &Order) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        Self::insert_order_row(&mut tx, order).await?;
        Self::insert_delivery_row(&mut tx, &order.order_uid, &order.delivery).await?;
        Self::insert_payment_row(&mut tx, &order.order_uid, &order.payment).await?;
        for item in &order.items {
            Self::insert_item_row(&mut tx, &order.order_uid, item).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_by_uid(&self, order_uid: &str) -> Result<Order, RepositoryError> {
        let row = sqlx::query(
            r"
            SELECT o.order_uid, o.track_number, o.entry, o.locale, o.internal_signature,
                   o.customer_id, o.delivery_service, o.shardkey, o.sm_id, o.date_created, o.oof_shard,
                   d.name AS delivery_name, d.phone, d.zip, d.city, d.address, d.region, d.email,
                   p.transaction, p.request_id, p.currency, p.provider, p.amount, p.payment_dt,
                   p.bank, p.delivery_cost, p.goods_total, p.custom_fee
            FROM orders o
            JOIN deliveries d ON o.order_uid = d.order_uid
            JOIN payments p ON o.order_uid = p.order_uid
            WHERE o.order_uid = $1
            ",
        )
        .bind(order_uid)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let mut order = decode_order_row(&row)?;

        let item_rows = sqlx::query(
            r"
            SELECT chrt_id, track_number, price, rid, name, sale, size,
                   total_price, nm_id, brand, status
            FROM items
            WHERE order_uid = $1
            ORDER BY id
            ",
        )
        .bind(order_uid)
        .fetch_all(&self.pool)
        .await?;

        order.items = item_rows
            .iter()
            .map(decode_item_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(order)
    }

    #[instrument(skip(self))]
    async fn get_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let uid_rows = sqlx::query("SELECT order_uid FROM orders ORDER BY date_created")
            .fetch_all(&self.pool)
            .await?;

        let mut orders = Vec::with_capacity(uid_rows.len());
        for row in uid_rows {
            let uid: String = col(&row, "order_uid")?;
            orders.push(self.get_by_uid(&uid).await?);
        }

        Ok(orders)
    }
}

/// Read one column, mapping a failure to [`RepositoryError::DataCorruption`].
///
/// `try_get` only fails when the stored row does not decode into the domain
/// type (bad value or missing column), which is corruption, not a connection
/// problem.
fn col<'r, T>(row: &'r PgRow, name: &str) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(name).map_err(|e| column_error(name, e))
}

fn column_error(column: &str, e: sqlx::Error) -> RepositoryError {
    RepositoryError::DataCorruption(format!("column {column}: {e}"))
}

/// Decode the joined orders/deliveries/payments row into an aggregate with
/// an empty item list.
fn decode_order_row(row: &PgRow) -> Result<Order, RepositoryError> {
    let date_created: DateTime<Utc> = col(row, "date_created")?;

    Ok(Order {
        order_uid: col(row, "order_uid")?,
        track_number: col(row, "track_number")?,
        entry: col(row, "entry")?,
        delivery: Delivery {
            name: col(row, "delivery_name")?,
            phone: col(row, "phone")?,
            zip: col(row, "zip")?,
            city: col(row, "city")?,
            address: col(row, "address")?,
            region: col(row, "region")?,
            email: col(row, "email")?,
        },
        payment: Payment {
            transaction: col(row, "transaction")?,
            request_id: col(row, "request_id")?,
            currency: col(row, "currency")?,
            provider: col(row, "provider")?,
            amount: col(row, "amount")?,
            payment_dt: col(row, "payment_dt")?,
            bank: col(row, "bank")?,
            delivery_cost: col(row, "delivery_cost")?,
            goods_total: col(row, "goods_total")?,
            custom_fee: col(row, "custom_fee")?,
        },
        items: Vec::new(),
        locale: col(row, "locale")?,
        internal_signature: col(row, "internal_signature")?,
        customer_id: col(row, "customer_id")?,
        delivery_service: col(row, "delivery_service")?,
        shardkey: col(row, "shardkey")?,
        sm_id: col(row, "sm_id")?,
        date_created,
        oof_shard: col(row, "oof_shard")?,
    })
}

fn decode_item_row(row: &PgRow) -> Result<Item, RepositoryError> {
    Ok(Item {
        chrt_id: col(row, "chrt_id")?,
        track_number: col(row, "track_number")?,
        price: col(row, "price")?,
        rid: col(row, "rid")?,
        name: col(row, "name")?,
        sale: col(row, "sale")?,
        size: col(row, "size")?,
        total_price: col(row, "total_price")?,
        nm_id: col(row, "nm_id")?,
        brand: col(row, "brand")?,
        status: col(row, "status")?,
    })
}
