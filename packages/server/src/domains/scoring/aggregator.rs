//! Score aggregator: applies an accepted post's points to the owning user.
//!
//! Two effects, each concurrency-safe on its own terms:
//! - the cumulative score uses the store's atomic increment, so concurrent
//!   accepted posts by the same user all land;
//! - streak and last-post-date are a read-modify-write pair, guarded by an
//!   optimistic version check and a bounded retry loop.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::kernel::BaseContentStore;

use super::streak::next_streak;

/// Retries for the streak CAS. Conflicts only arise from concurrent accepted
/// posts by the same user; each failed attempt means another writer made
/// progress, so a burst of simultaneous accepts still settles well inside
/// this budget.
const ACTIVITY_WRITE_ATTEMPTS: usize = 10;

/// Apply an accepted decision's points to the user record.
///
/// Precondition: `points > 0` (the decision was `scored`). The increment and
/// the streak update are two separate writes; the increment lands first so a
/// failed streak write never loses points.
pub async fn apply_accepted(
    store: &dyn BaseContentStore,
    user_id: &str,
    points: u32,
    now: DateTime<Utc>,
) -> Result<()> {
    store.increment_user_score(user_id, points).await?;

    for attempt in 1..=ACTIVITY_WRITE_ATTEMPTS {
        let Some((user, version)) = store.get_user(user_id).await? else {
            // The increment above would already have failed; only reachable
            // if the user record vanished between the two writes.
            warn!(user_id, "user disappeared before streak update");
            return Ok(());
        };

        let streak = next_streak(user.last_post_date, user.streak, now);
        if store.set_user_activity(user_id, streak, now, &version).await? {
            debug!(user_id, points, streak, "user score aggregated");
            return Ok(());
        }

        debug!(user_id, attempt, "streak write conflicted, retrying");
    }

    Err(anyhow!(
        "Gave up updating streak for user {} after {} attempts",
        user_id,
        ACTIVITY_WRITE_ATTEMPTS
    ))
}
