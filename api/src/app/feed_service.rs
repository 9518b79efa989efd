//! Feed service
//!
//! Resolves the timelines for a list of handles in one request. Every handle
//! goes through the refresh coordinator (cache first); on success each one is
//! queued for a background refresh so the next request finds warm data.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::join_all;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::app::refresh_coordinator::RefreshCoordinator;
use crate::app::refresh_workers::RefreshQueue;
use crate::app::session::SessionStatus;
use crate::domain::entities::{Handle, Post, PostType, Profile};
use crate::domain::ports::{CacheStore, UpstreamClient};
use crate::error::RefreshError;

/// Which post types make it into a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PostFilter {
    pub include_posts: bool,
    pub include_replies: bool,
    pub include_retweets: bool,
    pub include_quotes: bool,
    pub include_threads: bool,
}

impl Default for PostFilter {
    fn default() -> Self {
        Self {
            include_posts: true,
            include_replies: true,
            include_retweets: true,
            include_quotes: true,
            include_threads: false,
        }
    }
}

impl PostFilter {
    pub fn allows(&self, post_type: PostType) -> bool {
        match post_type {
            PostType::Post => self.include_posts,
            PostType::Reply => self.include_replies,
            PostType::Retweet => self.include_retweets,
            PostType::Quote => self.include_quotes,
            PostType::Thread => self.include_threads,
        }
    }

    fn apply(&self, posts: Vec<Post>) -> Vec<Post> {
        posts.into_iter().filter(|p| self.allows(p.post_type)).collect()
    }
}

/// Filtered timelines in request order
///
/// Serializes as a JSON object keyed by handle, keeping the order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timelines(pub Vec<(Handle, Vec<Post>)>);

impl Timelines {
    pub fn iter(&self) -> impl Iterator<Item = (&Handle, &[Post])> {
        self.0.iter().map(|(h, posts)| (h, posts.as_slice()))
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Timelines {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (handle, posts) in &self.0 {
            map.serialize_entry(handle.as_str(), posts)?;
        }
        map.end()
    }
}

/// Timelines plus the cached profiles needed to render them as RSS
#[derive(Debug, Clone, Default)]
pub struct Feed {
    pub timelines: Timelines,
    pub profiles: HashMap<Handle, Profile>,
}

pub struct FeedService<U, C>
where
    U: UpstreamClient + ?Sized,
    C: CacheStore + ?Sized,
{
    coordinator: Arc<RefreshCoordinator<U, C>>,
    refresh_queue: RefreshQueue,
}

impl<U, C> FeedService<U, C>
where
    U: UpstreamClient + ?Sized,
    C: CacheStore + ?Sized,
{
    pub fn new(coordinator: Arc<RefreshCoordinator<U, C>>, refresh_queue: RefreshQueue) -> Self {
        Self {
            coordinator,
            refresh_queue,
        }
    }

    /// Fetch and filter the timelines of `handles`
    ///
    /// Duplicate handles are collapsed. Every handle's fetch runs to completion
    /// even when another one fails, so siblings of a failing handle are still
    /// cached. Any failure fails the whole request with the first error in
    /// request order; background refreshes are only scheduled on success.
    pub async fn timelines(
        &self,
        handles: &[Handle],
        filter: PostFilter,
    ) -> Result<Timelines, RefreshError> {
        let mut seen = HashSet::new();
        let unique: Vec<&Handle> = handles.iter().filter(|h| seen.insert(*h)).collect();

        let fetched = join_all(unique.iter().map(|h| self.coordinator.get_posts(h)))
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?;

        for handle in &unique {
            self.refresh_queue.schedule((*handle).clone());
        }

        let timelines = unique
            .into_iter()
            .cloned()
            .zip(fetched.into_iter().map(|posts| filter.apply(posts)))
            .collect();

        Ok(Timelines(timelines))
    }

    /// Timelines plus profiles, for the RSS feed
    pub async fn feed(&self, handles: &[Handle], filter: PostFilter) -> Result<Feed, RefreshError> {
        let timelines = self.timelines(handles, filter).await?;

        let mut profiles = HashMap::new();
        for (handle, _) in timelines.iter() {
            match self.coordinator.get_profile(handle).await {
                Some(profile) => {
                    profiles.insert(handle.clone(), profile);
                }
                None => tracing::debug!(handle = %handle, "No cached profile"),
            }
        }

        Ok(Feed { timelines, profiles })
    }

    pub fn upstream_session(&self) -> SessionStatus {
        self.coordinator.session_status()
    }
}
