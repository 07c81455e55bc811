//! Records likes.

use nerdfeed_core::Result;
use nerdfeed_core::like::{Like, LikeRepository};
use nerdfeed_core::user::User;
use std::sync::Arc;

/// Writes `(post, user)` likes as idempotent upserts.
#[derive(Clone)]
pub struct ReactionRecorder {
    likes: Arc<dyn LikeRepository>,
}

impl ReactionRecorder {
    pub fn new(likes: Arc<dyn LikeRepository>) -> Self {
        Self { likes }
    }

    pub async fn record(&self, post_id: &str, user: &User) -> Result<()> {
        self.likes.upsert(&Like::new(post_id, user.id.clone())).await?;
        tracing::debug!("[ReactionRecorder] User {} liked post {}", user.id, post_id);
        Ok(())
    }
}
