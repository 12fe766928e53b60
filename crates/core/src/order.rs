//! The Order aggregate.
//!
//! Field names follow the wire format of the ingestion payloads, which is
//! also the column naming used by the database schema. An aggregate is one
//! `Order` plus exactly one [`Delivery`], exactly one [`Payment`] and zero or
//! more [`Item`] rows, all keyed by `order_uid`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// An order aggregate, identified by its globally unique `order_uid`.
///
/// `order_uid` is immutable once assigned; the persistence layer enforces
/// uniqueness. Everything else is shipment metadata carried verbatim from
/// the ingestion payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Order {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub order_uid: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub track_number: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub entry: String,
    #[validate(nested)]
    pub delivery: Delivery,
    #[validate(nested)]
    pub payment: Payment,
    #[validate(nested)]
    pub items: Vec<Item>,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub locale: String,
    /// May be empty; present in every payload but unused downstream.
    #[serde(default)]
    pub internal_signature: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub customer_id: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub delivery_service: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub shardkey: String,
    pub sm_id: i64,
    pub date_created: DateTime<Utc>,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub oof_shard: String,
}

/// Recipient and destination details. 1:1 with its order, no identity of
/// its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Delivery {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub phone: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub zip: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub city: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub address: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub region: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
}

/// Payment details. 1:1 with its order. Monetary amounts are integer minor
/// units, `payment_dt` is unix seconds as delivered on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Payment {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub transaction: String,
    /// May be empty.
    #[serde(default)]
    pub request_id: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub currency: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub provider: String,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub amount: i64,
    pub payment_dt: i64,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub bank: String,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub delivery_cost: i64,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub goods_total: i64,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub custom_fee: i64,
}

/// A single order line. Many per order, insertion order preserved; no
/// uniqueness constraint beyond belonging to one order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Item {
    pub chrt_id: i64,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub track_number: String,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub price: i64,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub rid: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub name: String,
    pub sale: i32,
    #[serde(default)]
    pub size: String,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub total_price: i64,
    pub nm_id: i64,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub brand: String,
    pub status: i32,
}
