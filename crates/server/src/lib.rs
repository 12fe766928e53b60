//! Orderhub server library.
//!
//! This crate provides the service as a library, allowing the pieces to be
//! tested in isolation and reused by the binary in `main.rs`.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod routes;
pub mod services;
pub mod state;
