//! Adapters layer
//!
//! Implementations of port traits for external systems.

pub mod cookie_file;
pub mod memory;
pub mod redis;
pub mod upstream;

pub use memory::InMemoryCacheStore;
pub use self::redis::RedisCacheStore;
pub use upstream::HttpUpstreamClient;
