//! Domain types for the scoring pipeline.

use chrono::{DateTime, Utc};
use serde::Deserialize;

// =============================================================================
// Storage trigger
// =============================================================================

/// Upload notification payload from the storage bucket.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageEvent {
    pub bucket: String,
    /// Object key, e.g. "posts/abc123.jpg"
    pub name: String,
}

// =============================================================================
// Post
// =============================================================================

/// What a post was submitted as. Only SDG posts are scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostKind {
    Sdg,
    Normal,
}

impl PostKind {
    pub fn parse(s: &str) -> Self {
        match s {
            "sdg" => Self::Sdg,
            _ => Self::Normal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sdg => "sdg",
            Self::Normal => "normal",
        }
    }
}

/// Post lifecycle. Transitions only `Pending -> {Scored, Rejected}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostStatus {
    Pending,
    Scored,
    Rejected,
}

impl PostStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "scored" => Self::Scored,
            "rejected" => Self::Rejected,
            _ => Self::Pending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Scored => "scored",
            Self::Rejected => "rejected",
        }
    }
}

/// A user-submitted content record eligible for SDG scoring.
#[derive(Debug, Clone)]
pub struct Post {
    pub id: String,
    pub user_id: String,
    pub kind: PostKind,
    pub status: PostStatus,
    pub sdg_score: Option<u32>,
    pub sdg_goals: Vec<u32>,
    pub ai_reason: Option<String>,
}

// =============================================================================
// User
// =============================================================================

/// The per-user aggregate this pipeline maintains.
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub sdg_score: u64,
    /// Consecutive UTC calendar days with at least one accepted post.
    pub streak: u32,
    pub last_post_date: Option<DateTime<Utc>>,
}

// =============================================================================
// Classifier verdicts
// =============================================================================

/// Safety check response. The default verdict is unsafe: a failed or
/// unparseable classifier call must never publish an unchecked image.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SafetyVerdict {
    pub is_safe: bool,
    pub reason: String,
}

/// SDG relevance response. Defaults are all-negative so a failed call
/// scores as not-relevant.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RelevanceVerdict {
    pub is_sdg_related: bool,
    pub sdg_goals: Vec<u32>,
    pub score: i64,
    pub reason: String,
}

// =============================================================================
// Decision
// =============================================================================

/// The terminal outcome to persist onto a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Always `Scored` or `Rejected`, never `Pending`.
    pub status: PostStatus,
    /// Absent only when the image never reached relevance scoring.
    pub score: Option<u32>,
    pub sdg_goals: Vec<u32>,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_kind_parses_unknown_as_normal() {
        assert_eq!(PostKind::parse("sdg"), PostKind::Sdg);
        assert_eq!(PostKind::parse("normal"), PostKind::Normal);
        assert_eq!(PostKind::parse("story"), PostKind::Normal);
    }

    #[test]
    fn post_status_round_trips() {
        for status in [PostStatus::Pending, PostStatus::Scored, PostStatus::Rejected] {
            assert_eq!(PostStatus::parse(status.as_str()), status);
        }
    }

    #[test]
    fn safety_verdict_defaults_to_unsafe() {
        let verdict = SafetyVerdict::default();
        assert!(!verdict.is_safe);
    }

    #[test]
    fn relevance_verdict_tolerates_missing_fields() {
        let verdict: RelevanceVerdict = serde_json::from_str(r#"{"is_sdg_related": true}"#).unwrap();
        assert!(verdict.is_sdg_related);
        assert_eq!(verdict.score, 0);
        assert!(verdict.sdg_goals.is_empty());
    }
}
