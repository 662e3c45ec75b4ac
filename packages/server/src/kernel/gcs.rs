//! Blob store implementation against the Cloud Storage JSON API.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use super::{BaseBlobStore, BaseTokenProvider};

const DEFAULT_BASE_URL: &str = "https://storage.googleapis.com/storage/v1";

/// Image downloads can be slow on cold buckets; generous but bounded.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct GcsBlobStore {
    http_client: Client,
    token_provider: Arc<dyn BaseTokenProvider>,
    base_url: String,
}

impl GcsBlobStore {
    pub fn new(token_provider: Arc<dyn BaseTokenProvider>) -> Self {
        Self {
            http_client: Client::new(),
            token_provider,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Set a custom base URL (for the storage emulator).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[async_trait]
impl BaseBlobStore for GcsBlobStore {
    async fn download(&self, bucket: &str, object_key: &str) -> Result<Vec<u8>> {
        let token = self.token_provider.token().await?;
        let url = format!(
            "{}/b/{}/o/{}?alt=media",
            self.base_url,
            bucket,
            urlencoding::encode(object_key)
        );

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&token)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .with_context(|| format!("Failed to download gs://{}/{}", bucket, object_key))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "Download of gs://{}/{} failed: {} {}",
                bucket,
                object_key,
                status,
                body
            ));
        }

        let bytes = response
            .bytes()
            .await
            .context("Failed to read object body")?;
        Ok(bytes.to_vec())
    }
}
