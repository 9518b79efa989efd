//! Redis adapter
//!
//! Cache store backed by Redis `GET` / `SETEX`.

pub mod cache_store;

pub use cache_store::RedisCacheStore;
