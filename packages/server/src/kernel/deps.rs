//! Server dependencies for the scoring pipeline (traits for testability)
//!
//! This module provides the central dependency container used by the
//! dispatcher. All external services sit behind trait abstractions so tests
//! substitute fakes.

use std::sync::Arc;

use super::{BaseBlobStore, BaseContentStore, BaseVisionModel};

/// Dependencies accessible to the pipeline
#[derive(Clone)]
pub struct ServerDeps {
    pub content_store: Arc<dyn BaseContentStore>,
    pub blob_store: Arc<dyn BaseBlobStore>,
    pub vision_model: Arc<dyn BaseVisionModel>,
}

impl ServerDeps {
    pub fn new(
        content_store: Arc<dyn BaseContentStore>,
        blob_store: Arc<dyn BaseBlobStore>,
        vision_model: Arc<dyn BaseVisionModel>,
    ) -> Self {
        Self {
            content_store,
            blob_store,
            vision_model,
        }
    }
}
