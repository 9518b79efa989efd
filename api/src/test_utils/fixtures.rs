//! Test fixtures
//!
//! Factory functions for creating test data with sensible defaults.
//! Timestamps are given as seconds since the Unix epoch.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use crate::app::{RateLimiter, RefreshCoordinator, RefreshSettings, SessionManager};
use crate::domain::entities::{format_upstream_time, Handle, Post, PostType, Profile};
use crate::domain::ports::{
    CacheStore, Credentials, RawAuthor, RawPost, RawReply, Session, SessionCookie, UpstreamClient,
};

use super::mocks::MockUpstreamClient;

/// TTL used by coordinators built with `test_coordinator`
pub const TEST_TTL: Duration = Duration::from_secs(1800);

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

pub fn handle(name: &str) -> Handle {
    name.parse().unwrap()
}

/// Create a plain raw post (classifies as `Post`)
pub fn raw_post(id: &str, secs: i64) -> RawPost {
    RawPost {
        id: id.to_string(),
        created_at: format_upstream_time(&at(secs)),
        full_text: format!("post {}", id),
        thread: None,
        retweeted_post_id: None,
        replies: None,
        in_reply_to: None,
        is_quote_status: false,
    }
}

/// Create a reply attached to a raw post
pub fn raw_reply(id: &str, author: &str, secs: i64) -> RawReply {
    RawReply {
        id: id.to_string(),
        full_text: format!("reply {} by {}", id, author),
        user: RawAuthor {
            id: format!("id-{}", author),
            screen_name: author.to_string(),
        },
        created_at: format_upstream_time(&at(secs)),
    }
}

/// Create a classified post
pub fn post(id: &str, secs: i64, post_type: PostType) -> Post {
    Post {
        id: id.to_string(),
        created_at: at(secs),
        post_type,
        text: format!("post {}", id),
        in_reply_to: Vec::new(),
    }
}

pub fn test_profile(name: &str) -> Profile {
    Profile {
        handle: name.to_string(),
        display_name: name.to_uppercase(),
        avatar_url: format!("https://pbs.twimg.com/profile_images/1/{}_normal.jpg", name),
    }
}

/// The two batches fetched for "alice"
///
/// Batch A holds post "1" and retweet "2"; batch B repeats "2" and adds
/// reply "3" (a reply to post "9").
pub fn alice_batches() -> Vec<Vec<RawPost>> {
    let first = raw_post("1", 100);

    let mut retweet = raw_post("2", 200);
    retweet.retweeted_post_id = Some("99".to_string());
    retweet.full_text = "RT @bob: hello".to_string();

    let duplicate = raw_post("2", 200);

    let mut reply = raw_post("3", 300);
    reply.in_reply_to = Some("9".to_string());

    vec![vec![first, retweet], vec![duplicate, reply]]
}

/// Upstream knowing "alice" with the `alice_batches` timeline
pub fn alice_upstream() -> MockUpstreamClient {
    MockUpstreamClient::new()
        .with_user("alice", "Alice")
        .with_timeline("alice", alice_batches())
}

pub fn test_credentials() -> Credentials {
    Credentials {
        username: "rss-bot".to_string(),
        email: "rss-bot@example.com".to_string(),
        password: "correct horse battery staple".to_string(),
        totp_secret: None,
    }
}

pub fn test_session(token: &str) -> Session {
    Session {
        cookies: vec![
            SessionCookie {
                name: "auth_token".to_string(),
                value: token.to_string(),
            },
            SessionCookie {
                name: "ct0".to_string(),
                value: format!("csrf-{}", token),
            },
        ],
    }
}

/// Coordinator with two upstream slots, no pacing and no background gate
pub fn test_coordinator<U, C>(upstream: Arc<U>, cache: Arc<C>) -> RefreshCoordinator<U, C>
where
    U: UpstreamClient + ?Sized,
    C: CacheStore + ?Sized,
{
    RefreshCoordinator::new(
        upstream.clone(),
        cache,
        SessionManager::new(upstream, test_credentials(), None),
        RateLimiter::new(2, Duration::ZERO, Duration::from_secs(5)),
        RefreshSettings {
            cache_ttl: TEST_TTL,
            background_refresh_interval: Duration::ZERO,
        },
    )
}
