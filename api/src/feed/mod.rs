//! Feed module
//!
//! RSS rendering of resolved timelines.

pub mod renderer;

pub use renderer::render_rss;
