//! Cache store port trait
//!
//! Key/value storage with a per-key TTL. Expired entries read as absent.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::entities::Handle;
use crate::error::CacheError;

/// Port trait for the TTL cache
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read a value; `None` when absent or expired
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Overwrite a value and restart its expiry countdown
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;
}

/// Cache key namespace
pub struct CacheKey;

impl CacheKey {
    pub fn posts(handle: &Handle) -> String {
        format!("posts:{}", handle)
    }

    pub fn profile(handle: &Handle) -> String {
        format!("profile:{}", handle)
    }
}
