//! In-process adapter
//!
//! TTL map used when no Redis is configured, and by tests.

pub mod cache_store;

pub use cache_store::InMemoryCacheStore;
