//! Application layer
//!
//! Contains use cases and service orchestration.
//! Services coordinate between domain entities, ports, and external systems.

pub mod classifier;
pub mod feed_service;
pub mod normalizer;
pub mod rate_limiter;
pub mod refresh_coordinator;
pub mod refresh_workers;
pub mod session;

pub use feed_service::{Feed, FeedService, PostFilter, Timelines};
pub use rate_limiter::RateLimiter;
pub use refresh_coordinator::{RefreshCoordinator, RefreshSettings};
pub use refresh_workers::{RefreshQueue, RefreshWorkers};
pub use session::{SessionManager, SessionStatus};
