//! Upstream adapter
//!
//! HTTP client for the X gateway.

pub mod client;

pub use client::HttpUpstreamClient;
