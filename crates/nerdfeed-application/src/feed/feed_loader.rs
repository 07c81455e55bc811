//! Loads the feed.

use nerdfeed_core::Result;
use nerdfeed_core::post::{Post, PostRepository};
use std::sync::Arc;

/// Fetches every post with its author's display data, newest first.
#[derive(Clone)]
pub struct FeedLoader {
    posts: Arc<dyn PostRepository>,
}

impl FeedLoader {
    pub fn new(posts: Arc<dyn PostRepository>) -> Self {
        Self { posts }
    }

    /// Full fetch, no pagination. The result is always sorted by
    /// `created_at` descending; ties keep the backend's order.
    pub async fn load(&self) -> Result<Vec<Post>> {
        let mut posts = self.posts.list_feed().await?;
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tracing::debug!("[FeedLoader] Loaded {} posts", posts.len());
        Ok(posts)
    }
}
