//! Object storage port.

use crate::error::Result;
use async_trait::async_trait;

/// Bucket holding images attached to posts.
pub const POST_IMAGES_BUCKET: &str = "post-images";

/// A file selected in the composer, ready to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    /// Original file name (no directories)
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// MIME type, guessed from the file name when absent
    pub content_type: Option<String>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            content_type: None,
        }
    }

    /// Object name used for the upload: `<unix-millis>_<file name>`.
    ///
    /// Two uploads of the same file name within the same millisecond collide.
    pub fn object_name(&self, unix_millis: i64) -> String {
        format!("{}_{}", unix_millis, self.file_name)
    }
}

/// Blob storage with publicly retrievable URLs.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Uploads `upload` as `name` inside `bucket` and returns the stored path.
    async fn upload(&self, bucket: &str, name: &str, upload: &ImageUpload) -> Result<String>;

    /// Resolves a stored path to a public URL.
    fn public_url(&self, bucket: &str, path: &str) -> Result<String>;
}
