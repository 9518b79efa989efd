//! Domain entities
//!
//! Pure domain models: what gets fetched, classified, cached and served.

pub mod handle;
pub mod post;
pub mod profile;

pub use handle::Handle;
pub use post::{format_upstream_time, parse_upstream_time, Post, PostType, ReplyRef};
pub use profile::Profile;
