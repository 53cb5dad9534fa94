//! casecache library
//!
//! Exposes the cache store, resolver and HTTP router for use in integration tests.

pub mod cache;
pub mod cli;
pub mod data;
pub mod resolver;
pub mod server;
