//! OAuth token sources for the Google REST APIs.
//!
//! Production runs on Cloud Run, where the metadata server mints tokens for
//! the service account. Local development injects a static token instead
//! (see `Config::google_access_token`).

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Deserialize;

use super::BaseTokenProvider;

/// Fixed token from configuration. No refresh.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

#[async_trait]
impl BaseTokenProvider for StaticTokenProvider {
    async fn token(&self) -> Result<String> {
        Ok(self.token.clone())
    }
}

const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Refresh this long before the reported expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct MetadataTokenResponse {
    access_token: String,
    expires_in: u64,
}

/// Tokens from the GCE/Cloud Run metadata server, cached until shortly
/// before expiry.
pub struct MetadataTokenProvider {
    http_client: reqwest::Client,
    cached: Mutex<Option<(String, Instant)>>,
}

impl MetadataTokenProvider {
    pub fn new() -> Self {
        Self {
            http_client: reqwest::Client::new(),
            cached: Mutex::new(None),
        }
    }
}

impl Default for MetadataTokenProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseTokenProvider for MetadataTokenProvider {
    async fn token(&self) -> Result<String> {
        if let Some((token, expires_at)) = self.cached.lock().unwrap().clone() {
            if Instant::now() < expires_at {
                return Ok(token);
            }
        }

        let response: MetadataTokenResponse = self
            .http_client
            .get(METADATA_TOKEN_URL)
            .header("Metadata-Flavor", "Google")
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .context("Failed to reach metadata server")?
            .error_for_status()
            .context("Metadata server rejected token request")?
            .json()
            .await
            .context("Failed to parse metadata token response")?;

        let expires_at = Instant::now()
            + Duration::from_secs(response.expires_in).saturating_sub(EXPIRY_MARGIN);
        *self.cached.lock().unwrap() = Some((response.access_token.clone(), expires_at));

        Ok(response.access_token)
    }
}
