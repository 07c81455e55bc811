//! Publishes a post: ensure profile, upload image, insert row.

use super::profile_ensurer::ProfileEnsurer;
use chrono::Utc;
use nerdfeed_core::Result;
use nerdfeed_core::post::{NewPost, PostRepository};
use nerdfeed_core::profile::Profile;
use nerdfeed_core::storage::{ImageUpload, ObjectStorage};
use nerdfeed_core::user::User;
use std::sync::Arc;

/// What happened during a successful publish.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// The author's profile, when it could be established
    pub profile: Option<Profile>,
    pub profile_created: bool,
    /// Public URL of the uploaded image; `None` without a file or when the
    /// upload failed
    pub image_url: Option<String>,
    /// True when a file was selected but could not be uploaded
    pub image_dropped: bool,
}

#[derive(Clone)]
pub struct PostComposer {
    ensurer: ProfileEnsurer,
    posts: Arc<dyn PostRepository>,
    storage: Arc<dyn ObjectStorage>,
    bucket: String,
}

impl PostComposer {
    pub fn new(
        ensurer: ProfileEnsurer,
        posts: Arc<dyn PostRepository>,
        storage: Arc<dyn ObjectStorage>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            ensurer,
            posts,
            storage,
            bucket: bucket.into(),
        }
    }

    /// Runs the publish sequence for `author`.
    ///
    /// Only the post insert is fatal: a profile that cannot be ensured or an
    /// image that cannot be uploaded is logged and the sequence continues.
    pub async fn publish(
        &self,
        author: &User,
        content: &str,
        image: Option<&ImageUpload>,
    ) -> Result<PublishReport> {
        let mut report = PublishReport::default();

        match self.ensurer.ensure(author).await {
            Ok(ensured) => {
                report.profile_created = ensured.was_created();
                report.profile = Some(ensured.into_profile());
            }
            Err(e) => {
                tracing::warn!("[PostComposer] Could not ensure profile for {}: {}", author.id, e);
            }
        }

        if let Some(image) = image {
            report.image_url = self.upload_image(image).await;
            report.image_dropped = report.image_url.is_none();
        }

        let post = NewPost {
            author: author.id.clone(),
            content: content.to_string(),
            image_url: report.image_url.clone(),
            created_at: Utc::now(),
        };
        self.posts.insert(&post).await?;

        tracing::info!(
            "[PostComposer] Published post by {} (image: {})",
            author.id,
            post.image_url.is_some()
        );
        Ok(report)
    }

    /// Uploads the image and resolves its public URL; `None` on any failure.
    async fn upload_image(&self, image: &ImageUpload) -> Option<String> {
        let name = image.object_name(Utc::now().timestamp_millis());
        let stored = match self.storage.upload(&self.bucket, &name, image).await {
            Ok(path) => path,
            Err(e) => {
                tracing::error!("[PostComposer] Image upload of {} failed: {}", name, e);
                return None;
            }
        };
        match self.storage.public_url(&self.bucket, &stored) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::error!("[PostComposer] No public URL for {}: {}", stored, e);
                None
            }
        }
    }
}
