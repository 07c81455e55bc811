//! End-to-end feed flows against the in-memory backend.

use chrono::{Duration as ChronoDuration, Utc};
use nerdfeed_application::{FeedSettings, FeedState, FeedUseCase, LikeOutcome, Notice, PublishOutcome};
use nerdfeed_core::storage::ImageUpload;
use nerdfeed_infrastructure::memory::new_post;
use nerdfeed_infrastructure::{InMemoryBackend, MemoryOperation};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn setup() -> (InMemoryBackend, Arc<FeedUseCase>) {
    let memory = InMemoryBackend::new();
    let usecase = Arc::new(FeedUseCase::new(memory.backend(), FeedSettings::default()));
    (memory, usecase)
}

/// Polls the view state until `predicate` holds or two seconds pass.
async fn wait_for<F>(usecase: &FeedUseCase, predicate: F) -> FeedState
where
    F: Fn(&FeedState) -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let state = usecase.snapshot().await;
        if predicate(&state) || tokio::time::Instant::now() >= deadline {
            return state;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Signs in through the emailed-code flow and waits for the view to follow.
async fn sign_in(memory: &InMemoryBackend, usecase: &FeedUseCase, email: &str) -> FeedState {
    assert!(usecase.request_sign_in(email).await.unwrap());
    let code = memory.pending_code(email).unwrap();
    usecase.verify_sign_in(email, &code).await.unwrap();
    wait_for(usecase, |s| s.is_signed_in()).await
}

#[tokio::test]
async fn test_first_post_creates_profile_and_leads_feed() {
    let (memory, usecase) = setup();
    let _tracker = usecase.start().await;
    memory.insert_post(new_post(
        "someone-else",
        "older",
        Utc::now() - ChronoDuration::hours(1),
    ));
    assert_eq!(usecase.refresh_feed().await.unwrap(), 1);

    let state = sign_in(&memory, &usecase, "ada@example.com").await;
    let ada = state.user.unwrap();
    assert!(state.profile.is_none());

    usecase.set_draft_content("First post").await;
    let report = match usecase.publish().await {
        PublishOutcome::Published(report) => report,
        other => panic!("unexpected outcome: {other:?}"),
    };

    assert!(report.profile_created);
    let profile = memory.profile(&ada.id).unwrap();
    assert_eq!(profile.username, "ada");
    assert_eq!(profile.display_name.as_deref(), Some("ada"));
    assert_eq!(memory.profile_inserts(), 1);

    let state = usecase.snapshot().await;
    let first = &state.posts[0];
    assert_eq!(first.author, ada.id);
    assert_eq!(first.content, "First post");
    assert!(first.image_url.is_none());
    assert_eq!(first.author_name(), "ada");
    assert!(state.draft.is_empty());
    assert_eq!(state.profile.map(|p| p.username), Some("ada".to_string()));
}

#[tokio::test]
async fn test_publish_grows_feed_by_one_and_reuses_profile() {
    let (memory, usecase) = setup();
    let _tracker = usecase.start().await;
    sign_in(&memory, &usecase, "grace@example.com").await;

    usecase.set_draft_content("one").await;
    assert!(matches!(usecase.publish().await, PublishOutcome::Published(_)));
    let before = usecase.snapshot().await.posts.len();

    usecase.set_draft_content("two").await;
    let outcome = usecase.publish().await;

    assert!(matches!(outcome, PublishOutcome::Published(ref r) if !r.profile_created));
    let posts = usecase.snapshot().await.posts;
    assert_eq!(posts.len(), before + 1);
    assert_eq!(posts[0].content, "two");
    assert_eq!(memory.profile_inserts(), 1);
}

#[tokio::test]
async fn test_image_is_uploaded_and_resolvable() {
    let (memory, usecase) = setup();
    let _tracker = usecase.start().await;
    sign_in(&memory, &usecase, "ada@example.com").await;

    usecase.set_draft_content("with a picture").await;
    usecase
        .select_image(ImageUpload::new("engine.png", vec![0xde, 0xad]))
        .await;
    let report = match usecase.publish().await {
        PublishOutcome::Published(report) => report,
        other => panic!("unexpected outcome: {other:?}"),
    };

    let url = report.image_url.unwrap();
    assert!(url.ends_with("_engine.png"));
    assert_eq!(memory.resolve_public_url(&url), Some(vec![0xde, 0xad]));
    let posts = usecase.snapshot().await.posts;
    assert_eq!(posts[0].image_url.as_deref(), Some(url.as_str()));
}

#[tokio::test]
async fn test_failed_upload_still_publishes_text() {
    let (memory, usecase) = setup();
    let _tracker = usecase.start().await;
    sign_in(&memory, &usecase, "ada@example.com").await;
    memory.set_failing(MemoryOperation::Upload, true);

    usecase.set_draft_content("picture lost").await;
    usecase
        .select_image(ImageUpload::new("lost.png", vec![1]))
        .await;
    let outcome = usecase.publish().await;

    assert!(matches!(outcome, PublishOutcome::Published(ref r) if r.image_dropped));
    let posts = usecase.snapshot().await.posts;
    assert_eq!(posts.len(), 1);
    assert!(posts[0].image_url.is_none());
}

#[tokio::test]
async fn test_double_like_keeps_single_row() {
    let (memory, usecase) = setup();
    let _tracker = usecase.start().await;
    sign_in(&memory, &usecase, "ada@example.com").await;
    usecase.set_draft_content("like me").await;
    usecase.publish().await;
    let post_id = usecase.snapshot().await.posts[0].id.clone();

    assert!(matches!(usecase.like(&post_id).await, LikeOutcome::Recorded));
    assert!(matches!(usecase.like(&post_id).await, LikeOutcome::Recorded));

    assert_eq!(memory.like_count(), 1);
}

#[tokio::test]
async fn test_signed_out_gestures_write_nothing() {
    let (memory, usecase) = setup();
    let _tracker = usecase.start().await;
    let notices = Arc::new(Mutex::new(Vec::new()));
    let sink = notices.clone();
    usecase
        .set_notifier(Arc::new(move |notice: Notice| sink.lock().unwrap().push(notice)))
        .await;

    usecase.set_draft_content("nope").await;
    let published = usecase.publish().await;
    let liked = usecase.like("1").await;

    assert!(matches!(published, PublishOutcome::Rejected(Notice::SignInRequired)));
    assert!(matches!(liked, LikeOutcome::Rejected(Notice::SignInRequiredToLike)));
    assert_eq!(memory.write_count(), 0);
    assert_eq!(
        *notices.lock().unwrap(),
        vec![Notice::SignInRequired, Notice::SignInRequiredToLike]
    );
}

#[tokio::test]
async fn test_sign_out_clears_user_and_profile() {
    let (memory, usecase) = setup();
    let _tracker = usecase.start().await;
    sign_in(&memory, &usecase, "ada@example.com").await;
    usecase.set_draft_content("hello").await;
    usecase.publish().await;
    assert!(usecase.snapshot().await.profile.is_some());

    usecase.sign_out().await.unwrap();
    let state = wait_for(&usecase, |s| !s.is_signed_in()).await;

    assert!(state.user.is_none());
    assert!(state.profile.is_none());
}

#[tokio::test]
async fn test_feed_failure_keeps_previous_feed() {
    let (memory, usecase) = setup();
    memory.insert_post(new_post("u-1", "kept", Utc::now()));
    let _tracker = usecase.start().await;
    assert_eq!(usecase.snapshot().await.posts.len(), 1);

    memory.set_failing(MemoryOperation::FeedFetch, true);
    assert!(usecase.refresh_feed().await.is_err());

    let posts = usecase.snapshot().await.posts;
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].content, "kept");
}

#[tokio::test]
async fn test_profile_fetch_failure_never_creates_profile() {
    let (memory, usecase) = setup();
    let _tracker = usecase.start().await;
    sign_in(&memory, &usecase, "ada@example.com").await;
    memory.set_failing(MemoryOperation::ProfileLookup, true);

    usecase.set_draft_content("who am I").await;
    usecase.publish().await;

    assert_eq!(memory.profile_inserts(), 0);
}

#[tokio::test]
async fn test_failed_insert_keeps_draft() {
    let (memory, usecase) = setup();
    let _tracker = usecase.start().await;
    sign_in(&memory, &usecase, "ada@example.com").await;
    memory.set_failing(MemoryOperation::PostInsert, true);

    usecase.set_draft_content("retry me").await;
    let outcome = usecase.publish().await;

    assert!(matches!(outcome, PublishOutcome::Failed(_)));
    let state = usecase.snapshot().await;
    assert_eq!(state.draft.content, "retry me");
    assert_eq!(state.last_notice, Some(Notice::PostFailed));
    assert_eq!(memory.post_count(), 0);
}

#[tokio::test]
async fn test_dropped_tracker_stops_view_updates() {
    let (memory, usecase) = setup();
    let tracker = usecase.start().await;
    assert_eq!(memory.listener_count(), 1);

    tracker.stop();
    assert_eq!(memory.listener_count(), 0);

    memory.sign_in_as("ada@example.com");
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(!usecase.snapshot().await.is_signed_in());
}

#[tokio::test]
async fn test_existing_profile_is_loaded_on_sign_in() {
    let (memory, usecase) = setup();
    let _tracker = usecase.start().await;
    sign_in(&memory, &usecase, "ada@example.com").await;
    usecase.set_draft_content("creates profile").await;
    usecase.publish().await;
    usecase.sign_out().await.unwrap();
    wait_for(&usecase, |s| !s.is_signed_in()).await;

    sign_in(&memory, &usecase, "ada@example.com").await;
    let state = wait_for(&usecase, |s| s.profile.is_some()).await;

    assert_eq!(state.profile.map(|p| p.username), Some("ada".to_string()));
}
