use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context};

use crate::domain::entities::Handle;
use crate::domain::ports::Credentials;

/// Which cache backend to run against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Redis,
    Memory,
}

impl FromStr for CacheBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "redis" => Ok(CacheBackend::Redis),
            "memory" => Ok(CacheBackend::Memory),
            _ => Err(format!("Unknown cache backend: {}", s)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub credentials: Credentials,
    /// Base URL of the upstream gateway
    pub upstream_url: String,
    pub cache_backend: CacheBackend,
    pub redis_url: String,
    pub cache_ttl: Duration,
    /// Minimum age before a background refresh re-fetches a handle (zero disables)
    pub background_refresh_interval: Duration,
    pub max_concurrent_requests: usize,
    pub request_delay: Duration,
    pub upstream_timeout: Duration,
    pub refresh_workers: usize,
    pub refresh_queue_capacity: usize,
    pub host: String,
    pub port: u16,
    pub cookies_file: PathBuf,
    /// Handles served by `/feed.xml` when the query names none
    pub default_handles: Vec<Handle>,
    pub inbound_per_second: u64,
    pub inbound_burst: u32,
}

const DEFAULT_HANDLES: &str = "ylecun,AndrewYNg,karpathy,sama,geoffreyhinton";

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let credentials = Credentials {
            username: required("TWITTER_USERNAME")?,
            email: required("TWITTER_EMAIL")?,
            password: required("TWITTER_PASSWORD")?,
            totp_secret: env::var("TWITTER_TOTP_SECRET").ok(),
        };

        let max_concurrent_requests: usize = parsed("MAX_CONCURRENT_REQUESTS", 2)?;
        if max_concurrent_requests == 0 {
            bail!("MAX_CONCURRENT_REQUESTS must be at least 1");
        }

        let request_delay: f64 = parsed("REQUEST_DELAY", 1.0)?;
        if !request_delay.is_finite() || request_delay < 0.0 {
            bail!("REQUEST_DELAY must be a non-negative number of seconds");
        }

        let default_handles = env::var("DEFAULT_HANDLES")
            .unwrap_or_else(|_| DEFAULT_HANDLES.to_string())
            .split(',')
            .filter(|h| !h.trim().is_empty())
            .map(|h| h.parse::<Handle>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("DEFAULT_HANDLES: {}", e))?;

        Ok(Self {
            credentials,
            upstream_url: env::var("UPSTREAM_URL")
                .unwrap_or_else(|_| "http://localhost:8081".to_string()),
            cache_backend: env::var("CACHE_BACKEND")
                .unwrap_or_else(|_| "redis".to_string())
                .parse()
                .map_err(anyhow::Error::msg)?,
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            cache_ttl: Duration::from_secs(parsed("CACHE_TTL", 1800)?),
            background_refresh_interval: Duration::from_secs(parsed(
                "BACKGROUND_REFRESH_INTERVAL",
                1500,
            )?),
            max_concurrent_requests,
            request_delay: Duration::from_secs_f64(request_delay),
            upstream_timeout: Duration::from_secs(parsed("UPSTREAM_TIMEOUT_SECS", 30)?),
            refresh_workers: parsed::<usize>("REFRESH_WORKERS", 2)?.max(1),
            refresh_queue_capacity: parsed::<usize>("REFRESH_QUEUE_CAPACITY", 64)?.max(1),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parsed("PORT", 8000)?,
            cookies_file: env::var("COOKIES_FILE")
                .unwrap_or_else(|_| "cookies.json".to_string())
                .into(),
            default_handles,
            inbound_per_second: parsed("INBOUND_PER_SECOND", 2)?,
            inbound_burst: parsed("INBOUND_BURST", 5)?,
        })
    }
}

fn required(name: &str) -> anyhow::Result<String> {
    match env::var(name) {
        Ok(v) if !v.is_empty() => Ok(v),
        _ => bail!("{} must be set", name),
    }
}

fn parsed<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}
