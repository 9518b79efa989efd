//! Upstream client port trait
//!
//! Defines the interface for fetching profiles and timelines from the social
//! network. The session is an explicit value: callers obtain one from
//! `login` and pass it to every call.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::entities::Handle;
use crate::error::UpstreamError;

/// Helper to deserialize null as default (empty vec, false, etc.)
fn deserialize_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::deserialize(deserializer)?.unwrap_or_default())
}

/// Account credentials used to open a session
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub email: String,
    pub password: String,
    pub totp_secret: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("totp_secret", &self.totp_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// A single session cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
}

/// Authenticated upstream session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub cookies: Vec<SessionCookie>,
}

impl Session {
    /// Render the cookies as a `Cookie` header value
    pub fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Timeline category to fetch for a user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostCategory {
    /// The user's own posts
    Tweets,
    /// The user's replies
    Replies,
}

impl PostCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostCategory::Tweets => "Tweets",
            PostCategory::Replies => "Replies",
        }
    }
}

/// Upstream user representation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawUser {
    pub id: String,
    pub screen_name: String,
    pub name: String,
    #[serde(default)]
    pub profile_image_url: String,
}

/// Author of an attached reply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawAuthor {
    pub id: String,
    pub screen_name: String,
}

/// Reply attached to a raw post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawReply {
    pub id: String,
    pub full_text: String,
    pub user: RawAuthor,
    pub created_at: String,
}

/// Upstream post representation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPost {
    pub id: String,
    /// `Dow Mon DD HH:MM:SS +0000 YYYY`
    pub created_at: String,
    pub full_text: String,
    /// Ids of the thread this post belongs to, if any
    #[serde(default)]
    pub thread: Option<Vec<String>>,
    /// Id of the retweeted original, if this is a retweet
    #[serde(default)]
    pub retweeted_post_id: Option<String>,
    #[serde(default)]
    pub replies: Option<Vec<RawReply>>,
    /// Id of the post this one replies to
    #[serde(default)]
    pub in_reply_to: Option<String>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub is_quote_status: bool,
}

/// Port trait for upstream operations
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Open a new session
    async fn login(&self, credentials: &Credentials) -> Result<Session, UpstreamError>;

    /// Check that a (restored) session is still accepted
    async fn validate(&self, session: &Session) -> Result<(), UpstreamError>;

    /// Look up a user by handle
    async fn get_user(&self, session: &Session, handle: &Handle)
        -> Result<RawUser, UpstreamError>;

    /// Fetch one timeline category for a user id
    async fn get_posts(
        &self,
        session: &Session,
        user_id: &str,
        category: PostCategory,
    ) -> Result<Vec<RawPost>, UpstreamError>;
}
