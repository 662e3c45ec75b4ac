// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Business logic (decide, streak, dispatch) lives in domain functions that
// use these traits.
//
// Naming convention: Base* for trait names (e.g., BaseContentStore)

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domains::scoring::models::{Decision, Post, User};

/// Opaque document version used for compare-and-set writes.
///
/// Firestore returns the document's update time; fakes use a counter. The
/// only valid operation is passing it back unchanged to a conditional write.
pub type RecordVersion = String;

// =============================================================================
// Vision Model Trait (Infrastructure - one image + prompt in, JSON text out)
// =============================================================================

#[async_trait]
pub trait BaseVisionModel: Send + Sync {
    /// Send one image plus a prompt, expecting a compact JSON response.
    /// Returns the raw response text; callers parse it.
    async fn generate_json(&self, image_bytes: &[u8], prompt: &str) -> Result<String>;
}

// =============================================================================
// Content Store Trait (Infrastructure - post/user documents)
// =============================================================================

#[async_trait]
pub trait BaseContentStore: Send + Sync {
    /// Fetch a post document with its current version.
    async fn get_post(&self, post_id: &str) -> Result<Option<(Post, RecordVersion)>>;

    /// Write the decision onto a post, conditional on the version read
    /// earlier. Returns false when the post changed in between (a concurrent
    /// invocation already finalized it) - the write is not applied.
    async fn finalize_post(
        &self,
        post_id: &str,
        decision: &Decision,
        version: &RecordVersion,
    ) -> Result<bool>;

    /// Fetch a user document with its current version.
    async fn get_user(&self, user_id: &str) -> Result<Option<(User, RecordVersion)>>;

    /// Atomically add `points` to the user's cumulative score. Must use the
    /// store's server-side increment, never read-modify-write, so concurrent
    /// accepted posts never lose an update.
    async fn increment_user_score(&self, user_id: &str, points: u32) -> Result<()>;

    /// Set the user's streak and last-post timestamp, conditional on the
    /// version. Returns false on a version conflict - the caller re-reads
    /// and retries.
    async fn set_user_activity(
        &self,
        user_id: &str,
        streak: u32,
        last_post_date: DateTime<Utc>,
        version: &RecordVersion,
    ) -> Result<bool>;
}

// =============================================================================
// Blob Store Trait (Infrastructure - uploaded object bytes)
// =============================================================================

#[async_trait]
pub trait BaseBlobStore: Send + Sync {
    /// Download a whole object.
    async fn download(&self, bucket: &str, object_key: &str) -> Result<Vec<u8>>;
}

// =============================================================================
// Token Provider Trait (Infrastructure - Google API auth)
// =============================================================================

#[async_trait]
pub trait BaseTokenProvider: Send + Sync {
    /// A currently valid OAuth bearer token.
    async fn token(&self) -> Result<String>;
}
