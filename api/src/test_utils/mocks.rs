//! Mock implementations of port traits
//!
//! In-memory implementations that can be configured for testing. They count
//! the calls they receive so tests can verify how often the upstream was hit.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::domain::entities::Handle;
use crate::domain::ports::{
    CacheStore, Credentials, PostCategory, RawPost, RawUser, Session, UpstreamClient,
};
use crate::error::{CacheError, UpstreamError};

use super::fixtures::test_session;

// ============================================================================
// Mock Upstream Client
// ============================================================================

#[derive(Debug, Clone)]
struct MockUser {
    user: RawUser,
    /// Own posts first, then replies
    batches: Vec<Vec<RawPost>>,
}

#[derive(Default)]
pub struct MockUpstreamClient {
    users: Mutex<HashMap<String, MockUser>>,
    latency: Duration,
    reject_saved_sessions: bool,
    fail_login: bool,
    next_posts_error: Mutex<Option<UpstreamError>>,
    login_calls: AtomicUsize,
    validate_calls: AtomicUsize,
    get_user_calls: AtomicUsize,
    get_posts_calls: AtomicUsize,
}

impl MockUpstreamClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Register a user with an empty timeline
    pub fn with_user(self, handle: &str, name: &str) -> Self {
        let user = RawUser {
            id: format!("id-{}", handle),
            screen_name: handle.to_string(),
            name: name.to_string(),
            profile_image_url: format!("https://pbs.twimg.com/profile_images/1/{}_normal.jpg", handle),
        };
        self.users.lock().unwrap().insert(
            handle.to_string(),
            MockUser {
                user,
                batches: Vec::new(),
            },
        );
        self
    }

    pub fn with_timeline(self, handle: &str, batches: Vec<Vec<RawPost>>) -> Self {
        self.set_posts(handle, batches);
        self
    }

    /// Cookie-file sessions fail validation
    pub fn rejecting_saved_sessions(mut self) -> Self {
        self.reject_saved_sessions = true;
        self
    }

    pub fn failing_login(mut self) -> Self {
        self.fail_login = true;
        self
    }

    /// Replace a registered user's timeline
    pub fn set_posts(&self, handle: &str, batches: Vec<Vec<RawPost>>) {
        if let Some(user) = self.users.lock().unwrap().get_mut(handle) {
            user.batches = batches;
        }
    }

    /// Make the next `get_posts` call fail with `error`
    pub fn fail_next_posts(&self, error: UpstreamError) {
        *self.next_posts_error.lock().unwrap() = Some(error);
    }

    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub fn validate_calls(&self) -> usize {
        self.validate_calls.load(Ordering::SeqCst)
    }

    pub fn get_user_calls(&self) -> usize {
        self.get_user_calls.load(Ordering::SeqCst)
    }

    pub fn get_posts_calls(&self) -> usize {
        self.get_posts_calls.load(Ordering::SeqCst)
    }

    pub fn total_fetch_calls(&self) -> usize {
        self.get_user_calls() + self.get_posts_calls()
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl UpstreamClient for MockUpstreamClient {
    async fn login(&self, _credentials: &Credentials) -> Result<Session, UpstreamError> {
        let n = self.login_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.simulate_latency().await;

        if self.fail_login {
            return Err(UpstreamError::Login("bad credentials".to_string()));
        }
        Ok(test_session(&format!("login-{}", n)))
    }

    async fn validate(&self, _session: &Session) -> Result<(), UpstreamError> {
        self.validate_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if self.reject_saved_sessions {
            return Err(UpstreamError::Unauthorized);
        }
        Ok(())
    }

    async fn get_user(&self, _session: &Session, handle: &Handle) -> Result<RawUser, UpstreamError> {
        self.get_user_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        self.users
            .lock()
            .unwrap()
            .get(handle.as_str())
            .map(|u| u.user.clone())
            .ok_or_else(|| UpstreamError::NotFound(handle.to_string()))
    }

    async fn get_posts(
        &self,
        _session: &Session,
        user_id: &str,
        category: PostCategory,
    ) -> Result<Vec<RawPost>, UpstreamError> {
        self.get_posts_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if let Some(error) = self.next_posts_error.lock().unwrap().take() {
            return Err(error);
        }

        let index = match category {
            PostCategory::Tweets => 0,
            PostCategory::Replies => 1,
        };
        let users = self.users.lock().unwrap();
        let user = users
            .values()
            .find(|u| u.user.id == user_id)
            .ok_or_else(|| UpstreamError::Api {
                status: 404,
                message: format!("unknown user id {}", user_id),
            })?;

        Ok(user.batches.get(index).cloned().unwrap_or_default())
    }
}

// ============================================================================
// Failing Cache Store
// ============================================================================

/// Cache store whose backend is always down
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingCacheStore;

#[async_trait]
impl CacheStore for FailingCacheStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }
}
