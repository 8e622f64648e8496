use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error};
use uuid::Uuid;

use shared_config::AppConfig;

#[derive(Error, Debug)]
pub enum ImageStoreError {
    #[error("Image upload failed: {0}")]
    Upload(String),
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store raw image bytes and return a public URL.
    async fn upload(&self, bytes: Vec<u8>, content_type: &str) -> Result<String, ImageStoreError>;
}

pub struct RestImageStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RestImageStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.image_store_url.clone(),
            api_key: config.image_store_api_key.clone(),
        }
    }
}

#[async_trait]
impl ImageStore for RestImageStore {
    async fn upload(&self, bytes: Vec<u8>, content_type: &str) -> Result<String, ImageStoreError> {
        let object_name = Uuid::new_v4().to_string();
        let url = format!("{}/objects/{}", self.base_url, object_name);
        debug!("Uploading {} bytes to {}", bytes.len(), url);

        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.api_key)
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| ImageStoreError::Upload(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            error!("Image store error ({}): {}", status, detail);
            return Err(ImageStoreError::Upload(format!("{}: {}", status, detail)));
        }

        Ok(url)
    }
}

/// In-memory stand-in that fabricates URLs without any network traffic.
#[derive(Default)]
pub struct MemoryImageStore;

impl MemoryImageStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn upload(&self, _bytes: Vec<u8>, _content_type: &str) -> Result<String, ImageStoreError> {
        Ok(format!("memory://images/{}", Uuid::new_v4()))
    }
}
