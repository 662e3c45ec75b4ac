//! Pure Gemini REST API client
//!
//! A clean, minimal client for the Gemini `generateContent` API with no
//! domain-specific logic. Supports vision prompts (image + text) with
//! JSON-mode structured output.
//!
//! # Example
//!
//! ```rust,ignore
//! use gemini_client::GeminiClient;
//!
//! let client = GeminiClient::from_env()?;
//!
//! let json = client
//!     .generate_json(&image_bytes, "image/jpeg", "Is this image safe? Return ONLY JSON.")
//!     .await?;
//! ```

pub mod error;
pub mod types;

pub use error::{GeminiError, Result};
pub use types::*;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Default model: fast, cheap, good enough for image classification.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default sampling temperature for classification prompts.
const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Pure Gemini API client.
#[derive(Clone)]
pub struct GeminiClient {
    http_client: Client,
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl GeminiClient {
    /// Create a new Gemini client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create from environment variable `GEMINI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| GeminiError::Config("GEMINI_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Set a custom base URL (for proxies, regional endpoints).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the model (e.g. "gemini-1.5-pro").
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Vision prompt with JSON-mode output.
    ///
    /// Sends one image plus a text prompt and returns the model's raw JSON
    /// text. Callers deserialize with `serde_json::from_str`.
    pub async fn generate_json(
        &self,
        image_bytes: &[u8],
        mime_type: &str,
        prompt: &str,
    ) -> Result<String> {
        let request = GenerateContentRequest::vision(mime_type, BASE64.encode(image_bytes), prompt)
            .generation_config(GenerationConfig::json(DEFAULT_TEMPERATURE));

        self.generate_content(&request).await
    }

    /// Raw `generateContent` call returning the first candidate's text.
    pub async fn generate_content(&self, request: &GenerateContentRequest) -> Result<String> {
        let start = std::time::Instant::now();

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Gemini request failed");
                GeminiError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "Gemini API error");
            return Err(GeminiError::Api(format!("Gemini API error: {}", error_text)));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GeminiError::Parse(e.to_string()))?;

        debug!(
            model = %self.model,
            duration_ms = start.elapsed().as_millis(),
            "Gemini generateContent"
        );

        body.text()
            .ok_or_else(|| GeminiError::Api("No candidates from Gemini".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builder() {
        let client = GeminiClient::new("test-key")
            .with_base_url("https://custom.api.com")
            .with_model("gemini-1.5-pro");

        assert_eq!(client.api_key, "test-key");
        assert_eq!(client.base_url, "https://custom.api.com");
        assert_eq!(client.model(), "gemini-1.5-pro");
    }
}
