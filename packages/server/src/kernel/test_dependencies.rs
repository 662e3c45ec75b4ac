// TestDependencies - mock implementations for testing
//
// Provides fakes that can be injected into ServerDeps so the whole pipeline
// runs without network access. The in-memory content store mirrors the
// concurrency semantics the real store provides: atomic increments and
// version-checked conditional writes.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::domains::scoring::models::{Decision, Post, User};

use super::{BaseBlobStore, BaseContentStore, BaseVisionModel, RecordVersion};

// =============================================================================
// Mock Vision Model
// =============================================================================

/// Scripted vision model. Responses are consumed in order; prompts are
/// recorded for assertions.
pub struct MockVisionModel {
    responses: Mutex<VecDeque<Result<String, String>>>,
    default_response: Mutex<Option<String>>,
    prompts: Mutex<Vec<String>>,
}

impl MockVisionModel {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            default_response: Mutex::new(None),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful raw-JSON response.
    pub fn with_json(self, body: &str) -> Self {
        self.responses.lock().unwrap().push_back(Ok(body.to_string()));
        self
    }

    /// Queue a transport failure.
    pub fn with_error(self, message: &str) -> Self {
        self.responses.lock().unwrap().push_back(Err(message.to_string()));
        self
    }

    /// Response returned for every call once the scripted queue is empty.
    /// Lets concurrency tests answer interleaved calls deterministically.
    pub fn with_default_json(self, body: &str) -> Self {
        *self.default_response.lock().unwrap() = Some(body.to_string());
        self
    }

    /// Prompts seen so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

impl Default for MockVisionModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseVisionModel for MockVisionModel {
    async fn generate_json(&self, _image_bytes: &[u8], prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(body)) => Ok(body),
            Some(Err(message)) => Err(anyhow!("{}", message)),
            None => self
                .default_response
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| anyhow!("MockVisionModel: no scripted response left")),
        }
    }
}

// =============================================================================
// Mock Blob Store
// =============================================================================

pub struct MockBlobStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    fail: Mutex<bool>,
    downloads: Mutex<Vec<String>>,
}

impl MockBlobStore {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            fail: Mutex::new(false),
            downloads: Mutex::new(Vec::new()),
        }
    }

    pub fn with_object(self, bucket: &str, object_key: &str, bytes: &[u8]) -> Self {
        self.objects
            .lock()
            .unwrap()
            .insert(format!("{}/{}", bucket, object_key), bytes.to_vec());
        self
    }

    /// Make every download fail (transport error).
    pub fn failing(self) -> Self {
        *self.fail.lock().unwrap() = true;
        self
    }

    pub fn download_count(&self) -> usize {
        self.downloads.lock().unwrap().len()
    }
}

impl Default for MockBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseBlobStore for MockBlobStore {
    async fn download(&self, bucket: &str, object_key: &str) -> Result<Vec<u8>> {
        let key = format!("{}/{}", bucket, object_key);
        self.downloads.lock().unwrap().push(key.clone());
        if *self.fail.lock().unwrap() {
            return Err(anyhow!("MockBlobStore: simulated download failure"));
        }
        self.objects
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .ok_or_else(|| anyhow!("MockBlobStore: no object at {}", key))
    }
}

// =============================================================================
// In-Memory Content Store
// =============================================================================

/// In-memory posts/users keyed by id, each carrying a version counter that
/// stands in for Firestore's update time.
pub struct InMemoryContentStore {
    posts: Mutex<HashMap<String, (Post, u64)>>,
    users: Mutex<HashMap<String, (User, u64)>>,
    /// Remaining finalize calls to fail with a transport error.
    finalize_failures: Mutex<usize>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self {
            posts: Mutex::new(HashMap::new()),
            users: Mutex::new(HashMap::new()),
            finalize_failures: Mutex::new(0),
        }
    }

    pub fn with_post(self, post: Post) -> Self {
        self.posts.lock().unwrap().insert(post.id.clone(), (post, 1));
        self
    }

    pub fn with_user(self, user: User) -> Self {
        self.users.lock().unwrap().insert(user.id.clone(), (user, 1));
        self
    }

    /// Fail the next `count` finalize calls before succeeding.
    pub fn fail_finalizes(&self, count: usize) {
        *self.finalize_failures.lock().unwrap() = count;
    }

    pub fn post(&self, post_id: &str) -> Option<Post> {
        self.posts.lock().unwrap().get(post_id).map(|(p, _)| p.clone())
    }

    pub fn user(&self, user_id: &str) -> Option<User> {
        self.users.lock().unwrap().get(user_id).map(|(u, _)| u.clone())
    }
}

impl Default for InMemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseContentStore for InMemoryContentStore {
    async fn get_post(&self, post_id: &str) -> Result<Option<(Post, RecordVersion)>> {
        Ok(self
            .posts
            .lock()
            .unwrap()
            .get(post_id)
            .map(|(post, version)| (post.clone(), version.to_string())))
    }

    async fn finalize_post(
        &self,
        post_id: &str,
        decision: &Decision,
        version: &RecordVersion,
    ) -> Result<bool> {
        {
            let mut failures = self.finalize_failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(anyhow!("InMemoryContentStore: simulated write failure"));
            }
        }

        let mut posts = self.posts.lock().unwrap();
        let Some((post, current)) = posts.get_mut(post_id) else {
            return Ok(false);
        };
        if current.to_string() != *version {
            return Ok(false);
        }

        post.status = decision.status;
        post.sdg_score = decision.score;
        post.sdg_goals = decision.sdg_goals.clone();
        post.ai_reason = Some(decision.reason.clone());
        *current += 1;
        Ok(true)
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<(User, RecordVersion)>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .get(user_id)
            .map(|(user, version)| (user.clone(), version.to_string())))
    }

    async fn increment_user_score(&self, user_id: &str, points: u32) -> Result<()> {
        let mut users = self.users.lock().unwrap();
        let (user, version) = users
            .get_mut(user_id)
            .ok_or_else(|| anyhow!("User {} not found for score increment", user_id))?;
        user.sdg_score += points as u64;
        *version += 1;
        Ok(())
    }

    async fn set_user_activity(
        &self,
        user_id: &str,
        streak: u32,
        last_post_date: DateTime<Utc>,
        version: &RecordVersion,
    ) -> Result<bool> {
        let mut users = self.users.lock().unwrap();
        let Some((user, current)) = users.get_mut(user_id) else {
            return Ok(false);
        };
        if current.to_string() != *version {
            return Ok(false);
        }
        user.streak = streak;
        user.last_post_date = Some(last_post_date);
        *current += 1;
        Ok(true)
    }
}
