//! Decision engine: combines the two classifier verdicts into the terminal
//! outcome persisted on the post.

use super::models::{Decision, PostStatus, RelevanceVerdict, SafetyVerdict};

/// Relevance scores must exceed this to be accepted (exclusive boundary:
/// a score of exactly 20 is rejected).
pub const ACCEPT_THRESHOLD: i64 = 20;

/// Pure accept/reject decision.
///
/// An unsafe verdict short-circuits to rejection and never consults the
/// relevance result; the empty (failed-call) safety verdict is unsafe, so
/// classifier outages reject rather than publish. Otherwise a post is
/// accepted iff the model called it SDG-related with a score above
/// [`ACCEPT_THRESHOLD`]. Rejected-but-safe posts keep the relevance fields
/// for audit.
pub fn decide(safety: &SafetyVerdict, relevance: &RelevanceVerdict) -> Decision {
    if !safety.is_safe {
        return Decision {
            status: PostStatus::Rejected,
            score: None,
            sdg_goals: Vec::new(),
            reason: "failed safety check".to_string(),
        };
    }

    let accepted = relevance.is_sdg_related && relevance.score > ACCEPT_THRESHOLD;

    // The model is told 0-100 but is not trusted to stay in range.
    let score = relevance.score.clamp(0, 100) as u32;
    let sdg_goals: Vec<u32> = relevance
        .sdg_goals
        .iter()
        .copied()
        .filter(|g| (1..=17).contains(g))
        .collect();

    Decision {
        status: if accepted { PostStatus::Scored } else { PostStatus::Rejected },
        score: Some(score),
        sdg_goals,
        reason: relevance.reason.clone(),
    }
}
