//! Orderhub Core - Shared domain types.
//!
//! This crate holds the Order aggregate and its structural validation rules.
//! It contains only types - no I/O, no database access, no HTTP - so it can
//! be used by the server, by test doubles, and by any future client code.
//!
//! # Modules
//!
//! - [`order`] - The Order aggregate: Order, Delivery, Payment, Item

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod order;

pub use order::{Delivery, Item, Order, Payment};
