//! Pipeline dispatcher: drives one upload event to a terminal state.
//!
//! Flow: guard filters, blob fetch, safety check, relevance check, decision,
//! conditional post write, then (accepted only) user aggregation. Blob fetch
//! failures propagate as errors before any write has happened, so the
//! triggering infrastructure can safely retry the whole event.

use anyhow::{Context, Result};
use chrono::Utc;
use std::time::Duration;
use tracing::{info, warn};

use crate::kernel::ServerDeps;

use super::aggregator::apply_accepted;
use super::classify::ClassifierClient;
use super::decision::decide;
use super::models::{PostKind, PostStatus, StorageEvent};

/// Only objects under this prefix are scored.
pub const UPLOAD_PREFIX: &str = "posts/";

/// Attempts for the decision write before giving the event back to the
/// trigger for redelivery.
const FINALIZE_ATTEMPTS: usize = 3;
const FINALIZE_BACKOFF: Duration = Duration::from_millis(200);

/// Terminal state of one pipeline invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Event did not match the trigger filter or the post was not scoreable.
    Skipped,
    Scored,
    Rejected,
}

/// Post id derived from the object key: the basename without its extension.
/// `posts/abc123.jpg` -> `abc123`.
fn post_id_from_key(object_key: &str) -> Option<&str> {
    let rest = object_key.strip_prefix(UPLOAD_PREFIX)?;
    let basename = rest.rsplit('/').next().unwrap_or(rest);
    let id = basename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(basename);
    (!id.is_empty()).then_some(id)
}

/// Handle one upload notification end to end.
pub async fn handle_upload(deps: &ServerDeps, event: &StorageEvent) -> Result<PipelineOutcome> {
    let Some(post_id) = post_id_from_key(&event.name) else {
        return Ok(PipelineOutcome::Skipped);
    };

    let Some((post, version)) = deps.content_store.get_post(post_id).await? else {
        // Object uploaded without a matching record; nothing to score.
        warn!(post_id, object = %event.name, "no post record for uploaded object");
        return Ok(PipelineOutcome::Skipped);
    };

    if post.kind != PostKind::Sdg {
        info!(post_id, "not an SDG post, skipping scoring");
        return Ok(PipelineOutcome::Skipped);
    }
    if post.status != PostStatus::Pending {
        // Retried trigger for an already-finalized post.
        info!(post_id, status = post.status.as_str(), "post already finalized, skipping");
        return Ok(PipelineOutcome::Skipped);
    }

    // Fatal on failure: nothing has been written yet, the trigger retries.
    let image_bytes = deps
        .blob_store
        .download(&event.bucket, &event.name)
        .await
        .context("blob fetch failed before any state was written")?;

    let classifier = ClassifierClient::new(deps.vision_model.clone());

    let safety = classifier.check_safety(&image_bytes).await;
    let relevance = if safety.is_safe {
        Some(classifier.score_relevance(&image_bytes).await)
    } else {
        None
    };
    let decision = decide(&safety, &relevance.unwrap_or_default());

    let mut finalized = false;
    for attempt in 1..=FINALIZE_ATTEMPTS {
        match deps.content_store.finalize_post(post_id, &decision, &version).await {
            Ok(true) => {
                finalized = true;
                break;
            }
            Ok(false) => {
                // Lost the conditional write: a concurrent invocation beat us.
                info!(post_id, "post finalized concurrently, skipping");
                return Ok(PipelineOutcome::Skipped);
            }
            Err(e) if attempt < FINALIZE_ATTEMPTS => {
                warn!(post_id, attempt, error = %e, "decision write failed, retrying");
                tokio::time::sleep(FINALIZE_BACKOFF * attempt as u32).await;
            }
            Err(e) => return Err(e).context("decision write exhausted retries"),
        }
    }
    debug_assert!(finalized);

    if decision.status == PostStatus::Scored {
        let points = decision.score.unwrap_or(0);
        if post.user_id.is_empty() {
            warn!(post_id, "scored post has no owning user");
        } else if points > 0 {
            apply_accepted(deps.content_store.as_ref(), &post.user_id, points, Utc::now())
                .await
                .context("user aggregation failed after post was scored")?;
        }
        info!(
            post_id,
            score = points,
            goals = ?decision.sdg_goals,
            "post scored"
        );
        return Ok(PipelineOutcome::Scored);
    }

    info!(post_id, reason = %decision.reason, "post rejected");
    Ok(PipelineOutcome::Rejected)
}
