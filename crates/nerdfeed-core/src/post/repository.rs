//! Post repository trait.

use super::model::{NewPost, Post};
use crate::error::Result;
use async_trait::async_trait;

/// Access to the `posts` relation.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Lists every post with its author's display data, newest first.
    async fn list_feed(&self) -> Result<Vec<Post>>;

    /// Inserts a new post row.
    async fn insert(&self, post: &NewPost) -> Result<()>;
}
