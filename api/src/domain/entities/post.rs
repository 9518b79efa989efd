//! Post domain entity
//!
//! A classified, cleaned post as served from the cache. Timestamps keep the
//! upstream textual format on the wire so cached entries and the JSON API look
//! the same as the raw source.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category assigned by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PostType {
    Post,
    Reply,
    Retweet,
    Quote,
    Thread,
}

impl std::fmt::Display for PostType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PostType::Post => write!(f, "Post"),
            PostType::Reply => write!(f, "Reply"),
            PostType::Retweet => write!(f, "Retweet"),
            PostType::Quote => write!(f, "Quote"),
            PostType::Thread => write!(f, "Thread"),
        }
    }
}

/// Snapshot of a related post, referenced by id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyRef {
    pub id: String,
    #[serde(rename = "full_text")]
    pub text: String,
    #[serde(rename = "username")]
    pub author_handle: String,
    #[serde(rename = "user_id")]
    pub author_id: String,
    #[serde(with = "upstream_time")]
    pub created_at: DateTime<Utc>,
}

/// A classified post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    #[serde(with = "upstream_time")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub post_type: PostType,
    #[serde(rename = "full_text")]
    pub text: String,
    #[serde(default)]
    pub in_reply_to: Vec<ReplyRef>,
}

/// Upstream timestamp format, e.g. `Wed Dec 31 23:59:59 +0000 2023`
pub const UPSTREAM_TIME_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Parse an upstream timestamp into UTC
pub fn parse_upstream_time(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_str(raw.trim(), UPSTREAM_TIME_FORMAT).map(|dt| dt.with_timezone(&Utc))
}

/// Format a UTC timestamp the way the upstream does
pub fn format_upstream_time(dt: &DateTime<Utc>) -> String {
    dt.format("%a %b %d %H:%M:%S +0000 %Y").to_string()
}

mod upstream_time {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_upstream_time(dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_upstream_time(&raw).map_err(serde::de::Error::custom)
    }
}
