//! Object storage adapter.

use super::client::SupabaseClient;
use async_trait::async_trait;
use nerdfeed_core::Result;
use nerdfeed_core::storage::{ImageUpload, ObjectStorage};
use reqwest::Method;

/// `ObjectStorage` backed by the hosted storage service.
pub struct SupabaseStorage {
    client: SupabaseClient,
}

impl SupabaseStorage {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    fn object_segments<'a>(prefix: &[&'a str], bucket: &'a str, path: &'a str) -> Vec<&'a str> {
        let mut segments: Vec<&str> = prefix.to_vec();
        segments.push(bucket);
        segments.extend(path.split('/').filter(|s| !s.is_empty()));
        segments
    }
}

#[async_trait]
impl ObjectStorage for SupabaseStorage {
    async fn upload(&self, bucket: &str, name: &str, upload: &ImageUpload) -> Result<String> {
        let content_type = upload.content_type.clone().unwrap_or_else(|| {
            mime_guess::from_path(&upload.file_name)
                .first_or_octet_stream()
                .to_string()
        });
        let segments = Self::object_segments(&["storage", "v1", "object"], bucket, name);
        let url = self.client.endpoint(&segments)?;

        let request = self
            .client
            .request(Method::POST, url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(upload.bytes.clone());
        self.client.send(request).await?;

        tracing::debug!(
            "[Storage] Uploaded {} bytes to {}/{}",
            upload.bytes.len(),
            bucket,
            name
        );
        Ok(name.to_string())
    }

    fn public_url(&self, bucket: &str, path: &str) -> Result<String> {
        let segments = Self::object_segments(&["storage", "v1", "object", "public"], bucket, path);
        Ok(self.client.endpoint(&segments)?.to_string())
    }
}
