//! Domain layer
//!
//! Contains pure business logic with no external dependencies.
//! - `entities`: Domain models (handles, posts, profiles)
//! - `ports`: Trait definitions for the upstream and the cache

pub mod entities;
pub mod ports;
