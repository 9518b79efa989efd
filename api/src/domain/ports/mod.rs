//! Domain ports (traits)
//!
//! Port traits define interfaces that the domain layer requires.
//! Adapters provide concrete implementations of these traits.

pub mod cache;
pub mod upstream;

pub use cache::{CacheKey, CacheStore};
pub use upstream::{
    Credentials, PostCategory, RawAuthor, RawPost, RawReply, RawUser, Session, SessionCookie,
    UpstreamClient,
};
