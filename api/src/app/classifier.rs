//! Post classifier
//!
//! Assigns exactly one `PostType` to a raw post. Rules are checked in order and
//! the first match wins, so a reply that belongs to a thread is a `Thread`.

use crate::domain::entities::PostType;
use crate::domain::ports::RawPost;

/// Classify a raw post
pub fn classify(post: &RawPost) -> PostType {
    if post.thread.is_some() {
        return PostType::Thread;
    }

    if post.retweeted_post_id.is_some() {
        return PostType::Retweet;
    }

    // Either signal counts: attached replies, or the post itself replies to another.
    let has_replies = post.replies.as_ref().is_some_and(|r| !r.is_empty());
    if has_replies || post.in_reply_to.is_some() {
        return PostType::Reply;
    }

    if post.is_quote_status {
        return PostType::Quote;
    }

    PostType::Post
}
