//! Redis cache store implementation

use std::time::Duration;

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};

use crate::domain::ports::CacheStore;
use crate::error::CacheError;

/// Cache store over a reconnecting Redis connection
#[derive(Clone)]
pub struct RedisCacheStore {
    conn: ConnectionManager,
    redis_url: String,
}

impl std::fmt::Debug for RedisCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCacheStore")
            .field("redis_url", &self.redis_url)
            .finish_non_exhaustive()
    }
}

impl RedisCacheStore {
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        tracing::info!(redis_url = %redis_url, "Connected to Redis");

        Ok(Self {
            conn,
            redis_url: redis_url.to_string(),
        })
    }
}

/// Whole seconds for `SETEX`, never below one
fn ttl_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl_seconds(ttl)).await?;
        tracing::debug!(key = %key, ttl_secs = ttl_seconds(ttl), "Cache SETEX");
        Ok(())
    }
}
