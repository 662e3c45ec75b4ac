//! Gemini API request and response types.

use serde::{Deserialize, Serialize};

// =============================================================================
// generateContent request
// =============================================================================

/// Request body for `models/{model}:generateContent`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateContentRequest {
    /// Prompt contents (a single multi-part turn for vision prompts)
    pub contents: Vec<Content>,

    /// Generation parameters
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    /// Build a single-turn vision request: one image part followed by a text prompt.
    pub fn vision(mime_type: impl Into<String>, image_base64: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![
                    Part::inline_data(mime_type, image_base64),
                    Part::text(prompt),
                ],
            }],
            generation_config: None,
        }
    }

    /// Set the generation config.
    pub fn generation_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = Some(config);
        self
    }
}

/// One conversational turn.
#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

/// A single part of a turn: either text or inline binary data.
#[derive(Debug, Clone, Serialize)]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(rename = "inlineData", skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

impl Part {
    /// Create a text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    /// Create an inline-data part from already base64-encoded bytes.
    pub fn inline_data(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            }),
        }
    }
}

/// Base64-encoded binary payload with its MIME type.
#[derive(Debug, Clone, Serialize)]
pub struct InlineData {
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub data: String,
}

/// Generation parameters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationConfig {
    /// Response MIME type ("application/json" forces structured output)
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,

    /// Sampling temperature (0.0 to 2.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl GenerationConfig {
    /// JSON output at the given temperature.
    pub fn json(temperature: f32) -> Self {
        Self {
            response_mime_type: Some("application/json".to_string()),
            temperature: Some(temperature),
        }
    }
}

// =============================================================================
// generateContent response
// =============================================================================

/// Raw response from `generateContent`.
#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate's parts, if any.
    pub fn text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let text: String = candidate
            .content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: CandidateContent,

    #[serde(rename = "finishReason", default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePart {
    #[serde(default)]
    pub text: Option<String>,
}
