//! Like reactions.
//!
//! Likes are write-only from the client's point of view: there is no count
//! and no unlike.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A user's like of a post. At most one per `(post_id, user_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Like {
    pub post_id: String,
    pub user_id: String,
}

impl Like {
    pub fn new(post_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            post_id: post_id.into(),
            user_id: user_id.into(),
        }
    }
}

/// Access to the `post_likes` relation.
#[async_trait]
pub trait LikeRepository: Send + Sync {
    /// Inserts the like, or does nothing if the pair already exists.
    async fn upsert(&self, like: &Like) -> Result<()>;
}
