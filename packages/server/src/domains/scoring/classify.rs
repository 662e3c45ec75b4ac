//! Classifier client: one structured classification request per call.
//!
//! Fail-safe-closed: transport failures, timeouts, and unparseable payloads
//! all yield the empty verdict (serde defaults), never an error. Callers
//! must treat absent fields as negative. Retries, if any, belong to the
//! triggering infrastructure, not this layer.

use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::warn;

use crate::kernel::BaseVisionModel;

use super::models::{RelevanceVerdict, SafetyVerdict};
use super::prompts::{SAFETY_PROMPT, SDG_SCORING_PROMPT};

/// Issues the safety and relevance checks against the vision model.
#[derive(Clone)]
pub struct ClassifierClient {
    model: Arc<dyn BaseVisionModel>,
}

impl ClassifierClient {
    pub fn new(model: Arc<dyn BaseVisionModel>) -> Self {
        Self { model }
    }

    /// Moderation check. Empty verdict (unsafe) on any failure.
    pub async fn check_safety(&self, image_bytes: &[u8]) -> SafetyVerdict {
        self.classify(image_bytes, SAFETY_PROMPT, "safety").await
    }

    /// SDG relevance scoring. Empty verdict (not relevant) on any failure.
    pub async fn score_relevance(&self, image_bytes: &[u8]) -> RelevanceVerdict {
        self.classify(image_bytes, SDG_SCORING_PROMPT, "relevance").await
    }

    async fn classify<T: DeserializeOwned + Default>(
        &self,
        image_bytes: &[u8],
        prompt: &str,
        check: &'static str,
    ) -> T {
        let body = match self.model.generate_json(image_bytes, prompt).await {
            Ok(body) => body,
            Err(e) => {
                warn!(check, error = %e, "classifier call failed, using empty verdict");
                return T::default();
            }
        };

        match serde_json::from_str(&body) {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!(check, error = %e, "classifier response did not match schema, using empty verdict");
                T::default()
            }
        }
    }
}
