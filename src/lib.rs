//! floorwatch - Floor-price tracker for NFT collections
//!
//! This crate provides a background pipeline that periodically refreshes
//! floor prices for a fixed set of collections through a rate-limited
//! upstream API, and an HTTP surface serving the resulting records.

pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod server;
pub mod sync;
pub mod telemetry;
