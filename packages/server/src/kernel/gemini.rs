// Vision model implementation using Gemini
//
// This is the infrastructure implementation of BaseVisionModel.
// Business logic (what to prompt for) lives in the scoring domain.

use anyhow::Result;
use async_trait::async_trait;
use gemini_client::GeminiClient;

use super::BaseVisionModel;

/// Uploaded images are stored as JPEG by the app's upload flow.
const IMAGE_MIME_TYPE: &str = "image/jpeg";

/// Gemini implementation of the vision model capability
#[derive(Clone)]
pub struct GeminiVisionModel {
    client: GeminiClient,
}

impl GeminiVisionModel {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BaseVisionModel for GeminiVisionModel {
    async fn generate_json(&self, image_bytes: &[u8], prompt: &str) -> Result<String> {
        let response = self
            .client
            .generate_json(image_bytes, IMAGE_MIME_TYPE, prompt)
            .await?;
        Ok(response)
    }
}
