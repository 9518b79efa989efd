//! XRSS API Server
//!
//! Republishes the timelines of a set of X accounts as JSON and as an RSS feed.
//! Uses hexagonal (ports & adapters) architecture: the refresh coordinator
//! only sees the upstream and cache ports, never Redis or HTTP directly.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;
use tower_governor::GovernorLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod adapters;
mod app;
mod config;
mod domain;
mod error;
mod feed;
mod handlers;

#[cfg(test)]
mod test_utils;


use adapters::{HttpUpstreamClient, InMemoryCacheStore, RedisCacheStore};
use app::{
    FeedService, RateLimiter, RefreshCoordinator, RefreshSettings, RefreshWorkers, SessionManager,
    SessionStatus,
};
use config::{CacheBackend, Config};
use domain::entities::Handle;
use domain::ports::{CacheStore, UpstreamClient};

/// How long queued background refreshes may run after the server stops
const WORKER_DRAIN_DEADLINE: Duration = Duration::from_secs(10);

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub feed_service: Arc<FeedService<dyn UpstreamClient, dyn CacheStore>>,
    /// Served by `/feed.xml` when no usernames are given
    pub default_handles: Arc<Vec<Handle>>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    upstream_session: SessionStatus,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        upstream_session: state.feed_service.upstream_session(),
    })
}

/// Build the router (without inbound throttling, which needs peer addresses)
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", post(handlers::post_timelines))
        .route("/feed.xml", get(handlers::get_rss_feed))
        .route("/health", get(health))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,xrss_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting XRSS API...");

    // Load configuration
    let config = Config::from_env().context("Invalid configuration")?;

    // Create adapters
    let cache: Arc<dyn CacheStore> = match config.cache_backend {
        CacheBackend::Redis => {
            tracing::info!("Connecting to Redis...");
            Arc::new(
                RedisCacheStore::connect(&config.redis_url)
                    .await
                    .context("Failed to connect to Redis")?,
            )
        }
        CacheBackend::Memory => {
            tracing::warn!("Using in-process cache; entries are lost on restart");
            let store = InMemoryCacheStore::new();
            spawn_purge_task(store.clone(), config.cache_ttl);
            Arc::new(store)
        }
    };

    let upstream: Arc<dyn UpstreamClient> = Arc::new(
        HttpUpstreamClient::new(&config.upstream_url, config.upstream_timeout)
            .context("Failed to build upstream client")?,
    );

    // Create application services
    let sessions = SessionManager::new(
        upstream.clone(),
        config.credentials.clone(),
        Some(config.cookies_file.clone()),
    );
    let limiter = RateLimiter::new(
        config.max_concurrent_requests,
        config.request_delay,
        config.upstream_timeout,
    );
    let coordinator = Arc::new(RefreshCoordinator::new(
        upstream,
        cache,
        sessions,
        limiter,
        RefreshSettings {
            cache_ttl: config.cache_ttl,
            background_refresh_interval: config.background_refresh_interval,
        },
    ));

    let (refresh_queue, workers) = RefreshWorkers::spawn(
        coordinator.clone(),
        config.refresh_workers,
        config.refresh_queue_capacity,
    );

    // Create app state
    let state = AppState {
        feed_service: Arc::new(FeedService::new(coordinator, refresh_queue)),
        default_handles: Arc::new(config.default_handles.clone()),
    };

    // Inbound throttling per peer IP
    let governor_config = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(PeerIpKeyExtractor)
            .per_second(config.inbound_per_second)
            .burst_size(config.inbound_burst)
            .finish()
            .context("Invalid inbound rate limit settings")?,
    );

    let routes = router(state).layer(GovernorLayer {
        config: governor_config,
    });

    // Start server
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.host, config.port))?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(
        listener,
        routes.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    // The router held the only queue sender, so the workers now drain and stop.
    workers.shutdown(WORKER_DRAIN_DEADLINE).await;
    tracing::info!("Shutdown complete");

    Ok(())
}

fn spawn_purge_task(store: InMemoryCacheStore, every: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every.max(Duration::from_secs(1)));
        loop {
            ticker.tick().await;
            let purged = store.purge_expired();
            if purged > 0 {
                tracing::debug!(purged, "Purged expired cache entries");
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
