//! Content store implementation against the Firestore REST API.
//!
//! Documents live in the `posts` and `users` collections. Conditional writes
//! use Firestore's `currentDocument.updateTime` precondition, which is the
//! version callers get back from reads; score increments use a server-side
//! `fieldTransforms` increment so they commute with concurrent writers.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::domains::scoring::models::{Decision, Post, PostKind, PostStatus, User};

use super::{BaseContentStore, BaseTokenProvider, RecordVersion};

const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub struct FirestoreContentStore {
    http_client: Client,
    token_provider: Arc<dyn BaseTokenProvider>,
    base_url: String,
    project_id: String,
}

impl FirestoreContentStore {
    pub fn new(project_id: impl Into<String>, token_provider: Arc<dyn BaseTokenProvider>) -> Self {
        Self {
            http_client: Client::new(),
            token_provider,
            base_url: DEFAULT_BASE_URL.to_string(),
            project_id: project_id.into(),
        }
    }

    /// Set a custom base URL (for the Firestore emulator).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn documents_root(&self) -> String {
        format!(
            "projects/{}/databases/(default)/documents",
            self.project_id
        )
    }

    fn document_name(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}", self.documents_root(), collection, id)
    }

    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<(Value, RecordVersion)>> {
        let token = self.token_provider.token().await?;
        let url = format!("{}/{}", self.base_url, self.document_name(collection, id));

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&token)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}/{}", collection, id))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Firestore get {}/{} failed: {} {}", collection, id, status, body));
        }

        let document: Value = response
            .json()
            .await
            .context("Failed to parse Firestore document")?;
        let version = document["updateTime"]
            .as_str()
            .ok_or_else(|| anyhow!("Firestore document missing updateTime"))?
            .to_string();

        Ok(Some((document, version)))
    }

    /// Run a commit with a single write. Returns false when the write's
    /// precondition failed (concurrent writer won), true on success.
    async fn commit_single(&self, write: Value) -> Result<bool> {
        let token = self.token_provider.token().await?;
        let url = format!(
            "{}/projects/{}/databases/(default)/documents:commit",
            self.base_url, self.project_id
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&token)
            .timeout(REQUEST_TIMEOUT)
            .json(&json!({ "writes": [write] }))
            .send()
            .await
            .context("Firestore commit request failed")?;

        let status = response.status();
        if status.is_success() {
            return Ok(true);
        }

        let body = response.text().await.unwrap_or_default();
        if body.contains("FAILED_PRECONDITION") || body.contains("NOT_FOUND") {
            warn!(status = %status, "Firestore commit lost precondition race");
            return Ok(false);
        }

        Err(anyhow!("Firestore commit failed: {} {}", status, body))
    }
}

#[async_trait]
impl BaseContentStore for FirestoreContentStore {
    async fn get_post(&self, post_id: &str) -> Result<Option<(Post, RecordVersion)>> {
        let Some((document, version)) = self.get_document("posts", post_id).await? else {
            return Ok(None);
        };
        Ok(Some((post_from_document(post_id, &document), version)))
    }

    async fn finalize_post(
        &self,
        post_id: &str,
        decision: &Decision,
        version: &RecordVersion,
    ) -> Result<bool> {
        let (fields, mask) = decision_fields(decision);
        let write = json!({
            "update": {
                "name": self.document_name("posts", post_id),
                "fields": fields,
            },
            "updateMask": { "fieldPaths": mask },
            "currentDocument": { "updateTime": version },
        });
        self.commit_single(write).await
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<(User, RecordVersion)>> {
        let Some((document, version)) = self.get_document("users", user_id).await? else {
            return Ok(None);
        };
        Ok(Some((user_from_document(user_id, &document), version)))
    }

    async fn increment_user_score(&self, user_id: &str, points: u32) -> Result<()> {
        let write = json!({
            "transform": {
                "document": self.document_name("users", user_id),
                "fieldTransforms": [{
                    "fieldPath": "sdgScore",
                    "increment": { "integerValue": points.to_string() },
                }],
            },
            // Without this a transform would create the missing document.
            "currentDocument": { "exists": true },
        });
        if !self.commit_single(write).await? {
            return Err(anyhow!("User {} not found for score increment", user_id));
        }
        Ok(())
    }

    async fn set_user_activity(
        &self,
        user_id: &str,
        streak: u32,
        last_post_date: DateTime<Utc>,
        version: &RecordVersion,
    ) -> Result<bool> {
        let write = json!({
            "update": {
                "name": self.document_name("users", user_id),
                "fields": {
                    "streak": integer_value(streak as i64),
                    "lastPostDate": timestamp_value(last_post_date),
                },
            },
            "updateMask": { "fieldPaths": ["streak", "lastPostDate"] },
            "currentDocument": { "updateTime": version },
        });
        self.commit_single(write).await
    }
}

// =============================================================================
// Field mapping (Firestore's typed value envelopes <-> domain types)
// =============================================================================

fn string_value(s: &str) -> Value {
    json!({ "stringValue": s })
}

fn integer_value(n: i64) -> Value {
    // Firestore integers travel as strings
    json!({ "integerValue": n.to_string() })
}

fn timestamp_value(dt: DateTime<Utc>) -> Value {
    json!({ "timestampValue": dt.to_rfc3339_opts(SecondsFormat::Micros, true) })
}

fn int_array_value(values: &[u32]) -> Value {
    let values: Vec<Value> = values.iter().map(|v| integer_value(*v as i64)).collect();
    json!({ "arrayValue": { "values": values } })
}

fn string_field(fields: &Value, name: &str) -> Option<String> {
    fields[name]["stringValue"].as_str().map(str::to_string)
}

fn int_field(fields: &Value, name: &str) -> Option<i64> {
    let value = &fields[name]["integerValue"];
    // Integers normally arrive as strings but tolerate bare numbers
    value.as_str().and_then(|s| s.parse().ok()).or_else(|| value.as_i64())
}

fn timestamp_field(fields: &Value, name: &str) -> Option<DateTime<Utc>> {
    let raw = fields[name]["timestampValue"].as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn int_array_field(fields: &Value, name: &str) -> Vec<u32> {
    fields[name]["arrayValue"]["values"]
        .as_array()
        .map(|values| {
            values
                .iter()
                .filter_map(|v| {
                    v["integerValue"]
                        .as_str()
                        .and_then(|s| s.parse::<u32>().ok())
                })
                .collect()
        })
        .unwrap_or_default()
}

fn post_from_document(id: &str, document: &Value) -> Post {
    let fields = &document["fields"];
    Post {
        id: id.to_string(),
        user_id: string_field(fields, "userId").unwrap_or_default(),
        kind: PostKind::parse(&string_field(fields, "type").unwrap_or_default()),
        status: PostStatus::parse(&string_field(fields, "status").unwrap_or_default()),
        sdg_score: int_field(fields, "sdgScore").map(|s| s.clamp(0, 100) as u32),
        sdg_goals: int_array_field(fields, "sdgGoals"),
        ai_reason: string_field(fields, "aiReason"),
    }
}

fn user_from_document(id: &str, document: &Value) -> User {
    let fields = &document["fields"];
    User {
        id: id.to_string(),
        sdg_score: int_field(fields, "sdgScore").unwrap_or(0).max(0) as u64,
        streak: int_field(fields, "streak").unwrap_or(0).clamp(0, u32::MAX as i64) as u32,
        last_post_date: timestamp_field(fields, "lastPostDate"),
    }
}

/// Build the update fields and mask for a decision. Safety rejections carry
/// no score or goals; relevance outcomes persist all audit fields.
fn decision_fields(decision: &Decision) -> (Value, Vec<&'static str>) {
    let mut fields = json!({
        "status": string_value(decision.status.as_str()),
        "aiReason": string_value(&decision.reason),
    });
    let mut mask = vec!["status", "aiReason"];

    if let Some(score) = decision.score {
        fields["sdgScore"] = integer_value(score as i64);
        fields["sdgGoals"] = int_array_value(&decision.sdg_goals);
        mask.push("sdgScore");
        mask.push("sdgGoals");
    }

    (fields, mask)
}
