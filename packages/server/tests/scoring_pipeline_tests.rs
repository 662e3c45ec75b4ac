//! End-to-end pipeline tests against the in-memory fakes.
//!
//! Everything runs through `handle_upload`, the same entry point the
//! webhook calls, so these cover the guard rails, both classifier stages,
//! persistence, and user aggregation together.

use std::sync::Arc;

use chrono::Utc;
use sdg_core::domains::scoring::{
    handle_upload, PipelineOutcome, Post, PostKind, PostStatus, StorageEvent, User,
};
use sdg_core::kernel::test_dependencies::{InMemoryContentStore, MockBlobStore, MockVisionModel};
use sdg_core::kernel::ServerDeps;

const BUCKET: &str = "sdg-app-uploads";

fn pending_post(id: &str, user_id: &str) -> Post {
    Post {
        id: id.to_string(),
        user_id: user_id.to_string(),
        kind: PostKind::Sdg,
        status: PostStatus::Pending,
        sdg_score: None,
        sdg_goals: Vec::new(),
        ai_reason: None,
    }
}

fn fresh_user(id: &str) -> User {
    User {
        id: id.to_string(),
        sdg_score: 0,
        streak: 0,
        last_post_date: None,
    }
}

fn event(object_key: &str) -> StorageEvent {
    serde_json::from_value(serde_json::json!({ "bucket": BUCKET, "name": object_key })).unwrap()
}

fn deps(
    store: &Arc<InMemoryContentStore>,
    blob: &Arc<MockBlobStore>,
    model: &Arc<MockVisionModel>,
) -> ServerDeps {
    ServerDeps::new(store.clone(), blob.clone(), model.clone())
}

const SAFE: &str = r#"{"is_safe": true, "reason": "family friendly"}"#;

#[tokio::test]
async fn accepted_post_scores_post_and_user() {
    let store = Arc::new(
        InMemoryContentStore::new()
            .with_post(pending_post("postA", "user1"))
            .with_user(fresh_user("user1")),
    );
    let blob = Arc::new(MockBlobStore::new().with_object(BUCKET, "posts/postA.jpg", b"jpeg"));
    let model = Arc::new(MockVisionModel::new().with_json(SAFE).with_json(
        r#"{"is_sdg_related": true, "sdg_goals": [4, 10], "score": 90, "reason": "education drive"}"#,
    ));

    let outcome = handle_upload(&deps(&store, &blob, &model), &event("posts/postA.jpg"))
        .await
        .unwrap();
    assert_eq!(outcome, PipelineOutcome::Scored);

    let post = store.post("postA").unwrap();
    assert_eq!(post.status, PostStatus::Scored);
    assert_eq!(post.sdg_score, Some(90));
    assert_eq!(post.sdg_goals, vec![4, 10]);
    assert_eq!(post.ai_reason.as_deref(), Some("education drive"));

    let user = store.user("user1").unwrap();
    assert_eq!(user.sdg_score, 90);
    assert_eq!(user.streak, 1);
    assert!(user.last_post_date.is_some());
}

#[tokio::test]
async fn irrelevant_post_is_rejected_without_user_update() {
    let store = Arc::new(
        InMemoryContentStore::new()
            .with_post(pending_post("postB", "user1"))
            .with_user(fresh_user("user1")),
    );
    let blob = Arc::new(MockBlobStore::new().with_object(BUCKET, "posts/postB.jpg", b"jpeg"));
    let model = Arc::new(
        MockVisionModel::new()
            .with_json(SAFE)
            .with_json(r#"{"is_sdg_related": false, "score": 5, "reason": "just a selfie"}"#),
    );

    let outcome = handle_upload(&deps(&store, &blob, &model), &event("posts/postB.jpg"))
        .await
        .unwrap();
    assert_eq!(outcome, PipelineOutcome::Rejected);

    let post = store.post("postB").unwrap();
    assert_eq!(post.status, PostStatus::Rejected);
    assert_eq!(post.sdg_score, Some(5));

    let user = store.user("user1").unwrap();
    assert_eq!(user.sdg_score, 0);
    assert_eq!(user.streak, 0);
    assert!(user.last_post_date.is_none());
}

#[tokio::test]
async fn unsafe_image_never_reaches_relevance_scoring() {
    let store = Arc::new(InMemoryContentStore::new().with_post(pending_post("postC", "user1")));
    let blob = Arc::new(MockBlobStore::new().with_object(BUCKET, "posts/postC.jpg", b"jpeg"));
    let model = Arc::new(
        MockVisionModel::new().with_json(r#"{"is_safe": false, "reason": "graphic content"}"#),
    );

    let outcome = handle_upload(&deps(&store, &blob, &model), &event("posts/postC.jpg"))
        .await
        .unwrap();
    assert_eq!(outcome, PipelineOutcome::Rejected);
    assert_eq!(model.call_count(), 1);
    assert!(model.prompts()[0].contains("safe and appropriate"));

    let post = store.post("postC").unwrap();
    assert_eq!(post.status, PostStatus::Rejected);
    assert_eq!(post.sdg_score, None);
    assert_eq!(post.ai_reason.as_deref(), Some("failed safety check"));
}

#[tokio::test]
async fn classifier_outage_rejects_instead_of_publishing() {
    // Fail-safe-closed: a dead classifier must not let an unchecked image
    // onto the feed.
    let store = Arc::new(InMemoryContentStore::new().with_post(pending_post("postD", "user1")));
    let blob = Arc::new(MockBlobStore::new().with_object(BUCKET, "posts/postD.jpg", b"jpeg"));
    let model = Arc::new(MockVisionModel::new().with_error("connection timed out"));

    let outcome = handle_upload(&deps(&store, &blob, &model), &event("posts/postD.jpg"))
        .await
        .unwrap();
    assert_eq!(outcome, PipelineOutcome::Rejected);
    assert_eq!(model.call_count(), 1);
    assert_eq!(
        store.post("postD").unwrap().ai_reason.as_deref(),
        Some("failed safety check")
    );
}

#[tokio::test]
async fn non_sdg_post_is_never_classified() {
    let mut post = pending_post("postE", "user1");
    post.kind = PostKind::Normal;
    let store = Arc::new(InMemoryContentStore::new().with_post(post));
    let blob = Arc::new(MockBlobStore::new());
    let model = Arc::new(MockVisionModel::new());

    let outcome = handle_upload(&deps(&store, &blob, &model), &event("posts/postE.jpg"))
        .await
        .unwrap();
    assert_eq!(outcome, PipelineOutcome::Skipped);
    assert_eq!(model.call_count(), 0);
    assert_eq!(blob.download_count(), 0);
    assert_eq!(store.post("postE").unwrap().status, PostStatus::Pending);
}

#[tokio::test]
async fn finalized_post_is_not_reprocessed() {
    let mut post = pending_post("postF", "user1");
    post.status = PostStatus::Scored;
    post.sdg_score = Some(70);
    let store = Arc::new(InMemoryContentStore::new().with_post(post).with_user(fresh_user("user1")));
    let blob = Arc::new(MockBlobStore::new());
    let model = Arc::new(MockVisionModel::new());

    let outcome = handle_upload(&deps(&store, &blob, &model), &event("posts/postF.jpg"))
        .await
        .unwrap();
    assert_eq!(outcome, PipelineOutcome::Skipped);
    assert_eq!(model.call_count(), 0);
    assert_eq!(store.user("user1").unwrap().sdg_score, 0);
}

#[tokio::test]
async fn missing_post_record_is_skipped() {
    let store = Arc::new(InMemoryContentStore::new());
    let blob = Arc::new(MockBlobStore::new());
    let model = Arc::new(MockVisionModel::new());

    let outcome = handle_upload(&deps(&store, &blob, &model), &event("posts/ghost.jpg"))
        .await
        .unwrap();
    assert_eq!(outcome, PipelineOutcome::Skipped);
    assert_eq!(blob.download_count(), 0);
}

#[tokio::test]
async fn key_outside_upload_prefix_is_skipped() {
    let store = Arc::new(InMemoryContentStore::new().with_post(pending_post("postG", "user1")));
    let blob = Arc::new(MockBlobStore::new());
    let model = Arc::new(MockVisionModel::new());

    let outcome = handle_upload(&deps(&store, &blob, &model), &event("avatars/postG.jpg"))
        .await
        .unwrap();
    assert_eq!(outcome, PipelineOutcome::Skipped);
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn blob_failure_errors_before_any_write() {
    let store = Arc::new(InMemoryContentStore::new().with_post(pending_post("postH", "user1")));
    let blob = Arc::new(MockBlobStore::new().failing());
    let model = Arc::new(MockVisionModel::new());

    let result = handle_upload(&deps(&store, &blob, &model), &event("posts/postH.jpg")).await;
    assert!(result.is_err());

    // No partial state: the post is still pending and eligible for a retried
    // trigger, and the classifier was never consulted.
    assert_eq!(store.post("postH").unwrap().status, PostStatus::Pending);
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn transient_write_failures_are_retried() {
    let store = Arc::new(
        InMemoryContentStore::new()
            .with_post(pending_post("postI", "user1"))
            .with_user(fresh_user("user1")),
    );
    store.fail_finalizes(2);
    let blob = Arc::new(MockBlobStore::new().with_object(BUCKET, "posts/postI.jpg", b"jpeg"));
    let model = Arc::new(MockVisionModel::new().with_json(SAFE).with_json(
        r#"{"is_sdg_related": true, "sdg_goals": [13], "score": 55, "reason": "climate action"}"#,
    ));

    let outcome = handle_upload(&deps(&store, &blob, &model), &event("posts/postI.jpg"))
        .await
        .unwrap();
    assert_eq!(outcome, PipelineOutcome::Scored);
    assert_eq!(store.post("postI").unwrap().sdg_score, Some(55));
    assert_eq!(store.user("user1").unwrap().sdg_score, 55);
}

#[tokio::test]
async fn exhausted_write_retries_leave_post_pending() {
    let store = Arc::new(
        InMemoryContentStore::new()
            .with_post(pending_post("postJ", "user1"))
            .with_user(fresh_user("user1")),
    );
    store.fail_finalizes(10);
    let blob = Arc::new(MockBlobStore::new().with_object(BUCKET, "posts/postJ.jpg", b"jpeg"));
    let model = Arc::new(MockVisionModel::new().with_json(SAFE).with_json(
        r#"{"is_sdg_related": true, "sdg_goals": [13], "score": 55, "reason": "climate action"}"#,
    ));

    let result = handle_upload(&deps(&store, &blob, &model), &event("posts/postJ.jpg")).await;
    assert!(result.is_err());

    // Eligible for a later retry trigger; the user saw no effects.
    assert_eq!(store.post("postJ").unwrap().status, PostStatus::Pending);
    assert_eq!(store.user("user1").unwrap().sdg_score, 0);
}

#[tokio::test]
async fn duplicate_trigger_scores_exactly_once() {
    let store = Arc::new(
        InMemoryContentStore::new()
            .with_post(pending_post("postK", "user1"))
            .with_user(fresh_user("user1")),
    );
    let blob = Arc::new(MockBlobStore::new().with_object(BUCKET, "posts/postK.jpg", b"jpeg"));
    let model = Arc::new(MockVisionModel::new().with_json(SAFE).with_json(
        r#"{"is_sdg_related": true, "sdg_goals": [4], "score": 80, "reason": "solid"}"#,
    ));

    let deps = deps(&store, &blob, &model);
    let first = handle_upload(&deps, &event("posts/postK.jpg")).await.unwrap();
    let second = handle_upload(&deps, &event("posts/postK.jpg")).await.unwrap();

    assert_eq!(first, PipelineOutcome::Scored);
    assert_eq!(second, PipelineOutcome::Skipped);
    assert_eq!(store.user("user1").unwrap().sdg_score, 80);
}

#[tokio::test]
async fn concurrent_accepted_posts_all_land_on_user_score() {
    const POSTS: usize = 8;
    const POINTS: u32 = 50;

    let mut store = InMemoryContentStore::new().with_user(fresh_user("user1"));
    let mut blob = MockBlobStore::new();
    for i in 0..POSTS {
        store = store.with_post(pending_post(&format!("post{}", i), "user1"));
        blob = blob.with_object(BUCKET, &format!("posts/post{}.jpg", i), b"jpeg");
    }
    let store = Arc::new(store);

    // One response satisfies both schemas, so interleaved calls from
    // concurrent invocations all resolve the same way.
    let model = Arc::new(MockVisionModel::new().with_default_json(
        r#"{"is_safe": true, "is_sdg_related": true, "sdg_goals": [4], "score": 50, "reason": "ok"}"#,
    ));

    let deps = Arc::new(ServerDeps::new(store.clone(), Arc::new(blob), model));
    let mut handles = Vec::new();
    for i in 0..POSTS {
        let deps = Arc::clone(&deps);
        handles.push(tokio::spawn(async move {
            handle_upload(&deps, &event(&format!("posts/post{}.jpg", i))).await
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), PipelineOutcome::Scored);
    }

    // No lost increments: every accepted post contributed its full value.
    let user = store.user("user1").unwrap();
    assert_eq!(user.sdg_score, (POSTS as u64) * (POINTS as u64));
    // All posts share one UTC day, so the streak settles at 1.
    assert_eq!(user.streak, 1);
    assert_eq!(Utc::now().date_naive(), user.last_post_date.unwrap().date_naive());
}
