//! Social feed access
//!
//! Posts and their comments come from an external social source. The engine
//! only cares about a handful of fields, so the source sits behind a trait
//! and tests can feed fixtures through the same pipeline as production.

mod reddit;

pub use reddit::*;

use crate::error::Result;
use async_trait::async_trait;

/// A comment on a feed post
#[derive(Debug, Clone)]
pub struct FeedComment {
    pub body: String,
    pub score: i64,
}

/// A feed post with its flattened top-level comments
#[derive(Debug, Clone)]
pub struct FeedPost {
    pub id: String,
    pub title: String,
    pub score: i64,
    pub is_self: bool,
    pub stickied: bool,
    pub comments: Vec<FeedComment>,
}

/// Trait for social feed providers
#[async_trait]
pub trait FeedClient: Send + Sync {
    /// Fetch the current hot posts for one feed, comments included
    async fn fetch_hot(&self, feed: &str, limit: u32) -> Result<Vec<FeedPost>>;
}
