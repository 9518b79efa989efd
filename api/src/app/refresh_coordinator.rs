//! Refresh coordinator
//!
//! Read-through access to cached timelines plus the refresh operation that
//! repopulates them. Per handle the coordinator is in one of three states:
//! - ABSENT: no unexpired `posts:{handle}` entry
//! - FRESH: an entry is cached and served without touching the upstream
//! - REFRESHING: the handle's in-flight guard is held by a refresh
//!
//! The in-flight guard is an in-process mutex per handle. It collapses
//! concurrent cold reads into one upstream fetch and keeps background
//! refreshes from piling onto a handle that is already being fetched.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::app::normalizer::build_timeline;
use crate::app::rate_limiter::RateLimiter;
use crate::app::session::{SessionManager, SessionStatus};
use crate::domain::entities::{Handle, Post, Profile};
use crate::domain::ports::{CacheKey, CacheStore, PostCategory, Session, UpstreamClient};
use crate::error::{CacheError, RefreshError, UpstreamError};

/// Coordinator tuning
#[derive(Debug, Clone)]
pub struct RefreshSettings {
    /// TTL applied to every cache write
    pub cache_ttl: Duration,
    /// Background refreshes skip handles refreshed more recently than this (zero disables)
    pub background_refresh_interval: Duration,
}

/// Everything one successful refresh produced
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub profile: Profile,
    pub posts: Vec<Post>,
}

/// What a background refresh did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundOutcome {
    Refreshed,
    /// Another refresh for the handle was running
    AlreadyInFlight,
    /// Refreshed within the background refresh interval
    RecentlyRefreshed,
}

#[derive(Debug, Default)]
struct HandleState {
    last_refreshed: Option<Instant>,
}

impl HandleState {
    /// Refreshed within `interval` (a zero interval is never recent)
    fn is_recent(&self, interval: Duration) -> bool {
        self.last_refreshed
            .is_some_and(|at| !interval.is_zero() && at.elapsed() < interval)
    }
}

type HandleSlot = Arc<Mutex<HandleState>>;
type SlotMap = std::sync::Mutex<HashMap<Handle, HandleSlot>>;

/// A handle's slot, checked out of the slot map
///
/// Dropping the lease removes the slot from the map once no other lease holds
/// it and its last refresh no longer matters to the background gate, so the
/// map only tracks handles that are in use or were refreshed recently.
struct SlotLease<'a> {
    slots: &'a SlotMap,
    handle: &'a Handle,
    slot: HandleSlot,
    gate: Duration,
}

impl Drop for SlotLease<'_> {
    fn drop(&mut self) {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());

        // The map and this lease hold one reference each.
        if Arc::strong_count(&self.slot) > 2 {
            return;
        }
        let Ok(state) = self.slot.try_lock() else {
            return;
        };
        let idle = !state.is_recent(self.gate);
        drop(state);

        if idle
            && slots
                .get(self.handle)
                .is_some_and(|current| Arc::ptr_eq(current, &self.slot))
        {
            slots.remove(self.handle);
        }
    }
}

pub struct RefreshCoordinator<U, C>
where
    U: UpstreamClient + ?Sized,
    C: CacheStore + ?Sized,
{
    upstream: Arc<U>,
    cache: Arc<C>,
    sessions: SessionManager<U>,
    limiter: RateLimiter,
    settings: RefreshSettings,
    slots: SlotMap,
}

impl<U, C> RefreshCoordinator<U, C>
where
    U: UpstreamClient + ?Sized,
    C: CacheStore + ?Sized,
{
    pub fn new(
        upstream: Arc<U>,
        cache: Arc<C>,
        sessions: SessionManager<U>,
        limiter: RateLimiter,
        settings: RefreshSettings,
    ) -> Self {
        Self {
            upstream,
            cache,
            sessions,
            limiter,
            settings,
            slots: std::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Read-through access to a handle's timeline
    ///
    /// A cached timeline is returned without an upstream call. On a miss the
    /// timeline is fetched and stored; a failed store is logged and the fetched
    /// posts are still returned.
    pub async fn get_posts(&self, handle: &Handle) -> Result<Vec<Post>, RefreshError> {
        if let Some(posts) = self.cached_posts(handle).await {
            tracing::debug!(handle = %handle, "Cache hit");
            return Ok(posts);
        }

        let lease = self.lease(handle);
        let mut state = lease.slot.lock().await;

        // A concurrent caller may have populated the cache while we waited.
        if let Some(posts) = self.cached_posts(handle).await {
            tracing::debug!(handle = %handle, "Cache populated by concurrent refresh");
            return Ok(posts);
        }

        tracing::debug!(handle = %handle, "Cache miss, refreshing");
        let snapshot = self.fetch_snapshot(handle).await?;

        match self.store_snapshot(handle, &snapshot).await {
            Ok(()) => state.last_refreshed = Some(Instant::now()),
            Err(e) => {
                tracing::warn!(handle = %handle, error = %e, "Failed to cache fresh timeline")
            }
        }

        Ok(snapshot.posts)
    }

    /// Cached profile, if any
    pub async fn get_profile(&self, handle: &Handle) -> Option<Profile> {
        self.read_json(&CacheKey::profile(handle)).await
    }

    /// Fetch a handle from the upstream and overwrite its cache entries
    ///
    /// Waits for any refresh of the same handle already in flight. On error
    /// the previous cache entries are left untouched.
    #[allow(dead_code)]
    pub async fn refresh(&self, handle: &Handle) -> Result<Snapshot, RefreshError> {
        let lease = self.lease(handle);
        let mut state = lease.slot.lock().await;
        self.refresh_locked(handle, &mut state).await
    }

    /// `refresh` behind the background gate
    ///
    /// Skips the handle when a refresh is already in flight or it was
    /// refreshed within the background refresh interval.
    pub async fn refresh_in_background(
        &self,
        handle: &Handle,
    ) -> Result<BackgroundOutcome, RefreshError> {
        let lease = self.lease(handle);
        let Ok(mut state) = lease.slot.try_lock() else {
            return Ok(BackgroundOutcome::AlreadyInFlight);
        };
        if state.is_recent(self.settings.background_refresh_interval) {
            return Ok(BackgroundOutcome::RecentlyRefreshed);
        }

        self.refresh_locked(handle, &mut state).await?;
        Ok(BackgroundOutcome::Refreshed)
    }

    pub fn session_status(&self) -> SessionStatus {
        self.sessions.status()
    }

    async fn refresh_locked(
        &self,
        handle: &Handle,
        state: &mut HandleState,
    ) -> Result<Snapshot, RefreshError> {
        let snapshot = self.fetch_snapshot(handle).await?;
        self.store_snapshot(handle, &snapshot).await?;
        state.last_refreshed = Some(Instant::now());

        tracing::info!(handle = %handle, posts = snapshot.posts.len(), "Refreshed timeline");
        Ok(snapshot)
    }

    fn lease<'a>(&'a self, handle: &'a Handle) -> SlotLease<'a> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            slots.entry(handle.clone()).or_default().clone()
        };

        SlotLease {
            slots: &self.slots,
            handle,
            slot,
            gate: self.settings.background_refresh_interval,
        }
    }

    /// Handles currently holding a slot
    #[cfg(test)]
    fn tracked_handles(&self) -> usize {
        self.slots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    async fn fetch_snapshot(&self, handle: &Handle) -> Result<Snapshot, RefreshError> {
        let session = self.sessions.session().await.map_err(|e| {
            tracing::error!(handle = %handle, error = %e, "Failed to obtain upstream session");
            RefreshError::from(e)
        })?;

        match self.fetch_with(&session, handle).await {
            Ok(snapshot) => Ok(snapshot),
            Err(UpstreamError::NotFound(_)) => {
                tracing::info!(handle = %handle, "User not found upstream");
                Err(RefreshError::NotFound(handle.to_string()))
            }
            Err(e) => {
                if matches!(e, UpstreamError::Unauthorized) {
                    self.sessions.invalidate(&session).await;
                }
                tracing::error!(handle = %handle, error = %e, "Error refreshing cache");
                Err(e.into())
            }
        }
    }

    async fn fetch_with(&self, session: &Session, handle: &Handle) -> Result<Snapshot, UpstreamError> {
        let user = self
            .limiter
            .run(self.upstream.get_user(session, handle))
            .await?;

        let (own, replies) = tokio::try_join!(
            self.limiter
                .run(self.upstream.get_posts(session, &user.id, PostCategory::Tweets)),
            self.limiter
                .run(self.upstream.get_posts(session, &user.id, PostCategory::Replies)),
        )?;

        Ok(Snapshot {
            profile: Profile {
                handle: user.screen_name,
                display_name: user.name,
                avatar_url: user.profile_image_url,
            },
            posts: build_timeline(vec![own, replies]),
        })
    }

    async fn store_snapshot(&self, handle: &Handle, snapshot: &Snapshot) -> Result<(), CacheError> {
        let ttl = self.settings.cache_ttl;
        let profile = serde_json::to_string(&snapshot.profile)?;
        let posts = serde_json::to_string(&snapshot.posts)?;

        self.cache
            .set(&CacheKey::profile(handle), &profile, ttl)
            .await?;
        self.cache.set(&CacheKey::posts(handle), &posts, ttl).await
    }

    async fn cached_posts(&self, handle: &Handle) -> Option<Vec<Post>> {
        self.read_json(&CacheKey::posts(handle)).await
    }

    /// Cache read where any failure counts as a miss
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.cache.get(key).await {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to deserialize cached value");
                None
            }
        }
    }
}
