//! Cache module for storing case documents on disk
//!
//! This module provides a durable store keyed by case id. Each record carries
//! its last write time; the resolver decides whether a record is still fresh.

mod store;

pub use store::{default_data_dir, CacheError, CacheStore};
