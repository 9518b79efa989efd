//! Timeline normalizer
//!
//! Turns the raw batches fetched for one handle into the list that gets cached:
//! classified, retweet prefix stripped, one entry per id, newest first.

use std::collections::HashSet;

use crate::app::classifier::classify;
use crate::domain::entities::{parse_upstream_time, Post, ReplyRef};
use crate::domain::ports::{RawPost, RawReply};

const RETWEET_MARKER: &str = "RT @";

/// Strip the `RT @user: ` prefix from retweet text
///
/// Text without the marker, or with the marker but no colon, is returned as is.
pub fn clean(text: &str) -> &str {
    if !text.starts_with(RETWEET_MARKER) {
        return text;
    }

    match text.find(':') {
        Some(colon) => {
            // Skip the colon and the character after it (normally a space).
            let mut rest = text[colon + 1..].chars();
            rest.next();
            rest.as_str()
        }
        None => text,
    }
}

/// Merge batches keeping the first occurrence of each id, newest first
///
/// The sort is stable, so posts with equal timestamps keep the order in which
/// they were first seen across batches.
pub fn dedupe_and_sort<I>(batches: I) -> Vec<Post>
where
    I: IntoIterator<Item = Vec<Post>>,
{
    let mut seen = HashSet::new();
    let mut posts: Vec<Post> = batches
        .into_iter()
        .flatten()
        .filter(|post| seen.insert(post.id.clone()))
        .collect();

    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    posts
}

/// Classify and clean a raw post
pub fn normalize(raw: RawPost) -> Result<Post, chrono::ParseError> {
    let post_type = classify(&raw);
    let created_at = parse_upstream_time(&raw.created_at)?;

    let in_reply_to = raw
        .replies
        .unwrap_or_default()
        .into_iter()
        .map(reply_ref)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Post {
        id: raw.id,
        created_at,
        post_type,
        text: clean(&raw.full_text).to_string(),
        in_reply_to,
    })
}

fn reply_ref(reply: RawReply) -> Result<ReplyRef, chrono::ParseError> {
    Ok(ReplyRef {
        created_at: parse_upstream_time(&reply.created_at)?,
        text: clean(&reply.full_text).to_string(),
        id: reply.id,
        author_handle: reply.user.screen_name,
        author_id: reply.user.id,
    })
}

/// Build the cached timeline from raw batches (own posts first, then replies)
///
/// Posts with unparseable timestamps are dropped with a warning.
pub fn build_timeline(batches: Vec<Vec<RawPost>>) -> Vec<Post> {
    let normalized = batches.into_iter().map(|batch| {
        batch
            .into_iter()
            .filter_map(|raw| {
                let id = raw.id.clone();
                match normalize(raw) {
                    Ok(post) => Some(post),
                    Err(e) => {
                        tracing::warn!(post_id = %id, error = %e, "Dropping post with bad timestamp");
                        None
                    }
                }
            })
            .collect::<Vec<_>>()
    });

    dedupe_and_sort(normalized)
}
