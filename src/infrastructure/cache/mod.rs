//! Caching layer for catalog reads.
//!
//! Provides a [`CacheService`] trait with two implementations:
//! - [`RedisCache`] - Production Redis-backed cache
//! - [`NullCache`] - No-op implementation for testing/disabled caching
//!
//! [`CachedCardCatalog`] puts either one in front of a card catalog.

mod cached_catalog;
mod null_cache;
mod redis_cache;
mod service;

pub use cached_catalog::CachedCardCatalog;
pub use null_cache::NullCache;
pub use redis_cache::RedisCache;
pub use service::{CacheError, CacheResult, CacheService};
