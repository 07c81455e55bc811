//! Feed use case implementation.
//!
//! `FeedUseCase` owns the view state of the feed page and sequences the
//! backend calls behind every user gesture: session bootstrap, profile
//! ensure, image upload, post insert, feed refresh and likes.

use crate::feed::{FeedLoader, PostComposer, ProfileEnsurer, ProfileLookup, PublishReport, ReactionRecorder};
use crate::notice::{Notice, Notifier};
use crate::session_tracker::{ForwardingListener, SessionTracker};
use crate::state::FeedState;
use nerdfeed_core::auth::SessionEvent;
use nerdfeed_core::storage::{ImageUpload, POST_IMAGES_BUCKET};
use nerdfeed_core::user::User;
use nerdfeed_core::{Backend, FeedError, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// Tunables of the use case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSettings {
    /// Bucket receiving post images
    pub storage_bucket: String,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            storage_bucket: POST_IMAGES_BUCKET.to_string(),
        }
    }
}

/// Result of `FeedUseCase::publish`.
#[derive(Debug, Clone)]
pub enum PublishOutcome {
    Published(PublishReport),
    /// Refused before any backend call (not signed in)
    Rejected(Notice),
    /// Another publish is still in flight; nothing was sent
    Busy,
    /// The post insert failed; the draft is kept for a retry
    Failed(FeedError),
}

/// Result of `FeedUseCase::like`.
#[derive(Debug, Clone)]
pub enum LikeOutcome {
    Recorded,
    Rejected(Notice),
    Failed(FeedError),
}

/// Clears the in-flight flag when the publish sequence ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Use case behind the feed page.
///
/// # Thread Safety
///
/// State lives behind a `tokio::sync::RwLock`; share the use case through an
/// `Arc`. No lock is held across a backend call.
pub struct FeedUseCase {
    backend: Backend,
    ensurer: ProfileEnsurer,
    composer: PostComposer,
    loader: FeedLoader,
    recorder: ReactionRecorder,
    state: RwLock<FeedState>,
    notifier: RwLock<Option<Notifier>>,
    publishing: AtomicBool,
}

impl FeedUseCase {
    /// Creates a use case bound to `backend`.
    pub fn new(backend: Backend, settings: FeedSettings) -> Self {
        let ensurer = ProfileEnsurer::new(backend.profiles.clone());
        let composer = PostComposer::new(
            ensurer.clone(),
            backend.posts.clone(),
            backend.storage.clone(),
            settings.storage_bucket,
        );
        Self {
            loader: FeedLoader::new(backend.posts.clone()),
            recorder: ReactionRecorder::new(backend.likes.clone()),
            ensurer,
            composer,
            backend,
            state: RwLock::new(FeedState::default()),
            notifier: RwLock::new(None),
            publishing: AtomicBool::new(false),
        }
    }

    /// Sets the callback receiving user-visible notices.
    pub async fn set_notifier(&self, notifier: Notifier) {
        *self.notifier.write().await = Some(notifier);
    }

    /// A copy of the current view state.
    pub async fn snapshot(&self) -> FeedState {
        let mut state = self.state.read().await.clone();
        state.loading = self.publishing.load(Ordering::SeqCst);
        state
    }

    async fn notify(&self, notice: Notice) {
        tracing::info!("[FeedUseCase] Notice: {}", notice);
        self.state.write().await.last_notice = Some(notice);
        let notifier = self.notifier.read().await.clone();
        if let Some(notifier) = notifier {
            notifier(notice);
        }
    }

    async fn current_user(&self) -> Option<User> {
        self.state.read().await.user.clone()
    }

    // ============================================================================
    // Session tracking
    // ============================================================================

    /// Initializes the page: applies the current session, subscribes to
    /// session changes and loads the feed.
    ///
    /// Keep the returned tracker for the lifetime of the view; dropping it
    /// unsubscribes.
    pub async fn start(self: &Arc<Self>) -> SessionTracker {
        let (listener, mut events) = ForwardingListener::channel();
        let subscription = self.backend.auth.subscribe(Arc::new(listener));

        let initial = match self.backend.auth.current_session().await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("[SessionTracker] Initial session fetch failed: {}", e);
                None
            }
        };
        self.apply_session_event(SessionEvent::from_session(initial))
            .await;

        // Events raised while the initial session was applied are queued in
        // the channel and replayed here, in order.
        let usecase = Arc::clone(self);
        let task = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                usecase.apply_session_event(event).await;
            }
        });

        if let Err(e) = self.refresh_feed().await {
            tracing::warn!("[FeedUseCase] Initial feed load failed: {}", e);
        }

        SessionTracker::new(subscription, task)
    }

    /// Applies one session-change notification to the view state.
    pub async fn apply_session_event(&self, event: SessionEvent) {
        self.apply_user(event.user().cloned()).await;
    }

    async fn apply_user(&self, user: Option<User>) {
        let Some(user) = user else {
            let mut state = self.state.write().await;
            if state.user.is_some() {
                tracing::info!("[SessionTracker] Signed out");
            }
            state.user = None;
            state.profile = None;
            return;
        };

        {
            let mut state = self.state.write().await;
            let same_user = state.user.as_ref().map(|u| u.id.as_str()) == Some(user.id.as_str());
            if !same_user {
                tracing::info!("[SessionTracker] Signed in as {}", user.id);
                state.profile = None;
            }
            state.user = Some(user.clone());
        }

        match self.ensurer.lookup(&user.id).await {
            ProfileLookup::Found(profile) => {
                let mut state = self.state.write().await;
                // The user may have changed while the profile was loading.
                if state.user.as_ref().map(|u| &u.id) == Some(&profile.id) {
                    state.profile = Some(profile);
                }
            }
            ProfileLookup::Missing => {
                tracing::debug!("[SessionTracker] No profile yet for {}", user.id);
            }
            ProfileLookup::Failed(_) => {}
        }
    }

    // ============================================================================
    // Sign-in / sign-out
    // ============================================================================

    /// Requests a sign-in link for `email`.
    ///
    /// An empty email is treated as a cancelled prompt: no backend call,
    /// `Ok(false)`.
    pub async fn request_sign_in(&self, email: &str) -> Result<bool> {
        let email = email.trim();
        if email.is_empty() {
            return Ok(false);
        }
        self.backend.auth.send_sign_in_link(email).await?;
        self.notify(Notice::CheckEmail).await;
        Ok(true)
    }

    /// Completes a sign-in with the emailed one-time code.
    ///
    /// The session is applied to the view before returning, so the next
    /// gesture already sees the signed-in user. The notification that follows
    /// re-applies the same user.
    pub async fn verify_sign_in(&self, email: &str, code: &str) -> Result<User> {
        let session = self
            .backend
            .auth
            .verify_sign_in(email.trim(), code.trim())
            .await?;
        self.apply_user(Some(session.user.clone())).await;
        Ok(session.user)
    }

    pub async fn sign_out(&self) -> Result<()> {
        self.backend.auth.sign_out().await
    }

    // ============================================================================
    // Composer
    // ============================================================================

    pub async fn set_draft_content(&self, content: impl Into<String>) {
        self.state.write().await.draft.content = content.into();
    }

    pub async fn select_image(&self, image: ImageUpload) {
        self.state.write().await.draft.image = Some(image);
    }

    pub async fn clear_image(&self) {
        self.state.write().await.draft.image = None;
    }

    /// Publishes the current draft.
    ///
    /// On success the draft is cleared and the feed reloaded; on failure the
    /// draft is left untouched and "Error creating post" is shown.
    pub async fn publish(&self) -> PublishOutcome {
        let Some(user) = self.current_user().await else {
            self.notify(Notice::SignInRequired).await;
            return PublishOutcome::Rejected(Notice::SignInRequired);
        };

        if self.publishing.swap(true, Ordering::SeqCst) {
            tracing::debug!("[PostComposer] Publish already in flight, ignoring");
            return PublishOutcome::Busy;
        }
        let _in_flight = InFlight(&self.publishing);

        let draft = self.state.read().await.draft.clone();
        match self
            .composer
            .publish(&user, &draft.content, draft.image.as_ref())
            .await
        {
            Ok(report) => {
                {
                    let mut state = self.state.write().await;
                    state.draft = Default::default();
                    if let Some(profile) = &report.profile {
                        if state.user.as_ref().map(|u| &u.id) == Some(&profile.id) {
                            state.profile = Some(profile.clone());
                        }
                    }
                }
                if let Err(e) = self.refresh_feed().await {
                    tracing::warn!("[FeedUseCase] Feed refresh after publish failed: {}", e);
                }
                PublishOutcome::Published(report)
            }
            Err(e) => {
                tracing::error!("[PostComposer] Error creating post: {}", e);
                self.notify(Notice::PostFailed).await;
                PublishOutcome::Failed(e)
            }
        }
    }

    // ============================================================================
    // Feed and likes
    // ============================================================================

    /// Reloads the feed. On failure the previous feed is kept.
    pub async fn refresh_feed(&self) -> Result<usize> {
        match self.loader.load().await {
            Ok(posts) => {
                let count = posts.len();
                self.state.write().await.posts = posts;
                Ok(count)
            }
            Err(e) => {
                tracing::warn!("[FeedLoader] Keeping previous feed, fetch failed: {}", e);
                Err(e)
            }
        }
    }

    /// Likes `post_id` as the current user. Likes are write-only: the feed
    /// is not reloaded.
    pub async fn like(&self, post_id: &str) -> LikeOutcome {
        let Some(user) = self.current_user().await else {
            self.notify(Notice::SignInRequiredToLike).await;
            return LikeOutcome::Rejected(Notice::SignInRequiredToLike);
        };

        match self.recorder.record(post_id, &user).await {
            Ok(()) => LikeOutcome::Recorded,
            Err(e) => {
                tracing::warn!("[ReactionRecorder] Like of post {} failed: {}", post_id, e);
                LikeOutcome::Failed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use nerdfeed_core::auth::AuthService;
    use nerdfeed_core::post::{NewPost, Post, PostRepository};
    use nerdfeed_core::profile::Profile;
    use nerdfeed_core::user::Session;
    use nerdfeed_infrastructure::{InMemoryBackend, MemoryOperation};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Post table whose inserts take a while, so two publishes overlap.
    struct SlowPosts {
        inner: InMemoryBackend,
        delay: Duration,
    }

    #[async_trait]
    impl PostRepository for SlowPosts {
        async fn list_feed(&self) -> Result<Vec<Post>> {
            PostRepository::list_feed(&self.inner).await
        }

        async fn insert(&self, post: &NewPost) -> Result<()> {
            tokio::time::sleep(self.delay).await;
            PostRepository::insert(&self.inner, post).await
        }
    }

    fn usecase(memory: &InMemoryBackend) -> Arc<FeedUseCase> {
        Arc::new(FeedUseCase::new(memory.backend(), FeedSettings::default()))
    }

    fn ada_session(memory: &InMemoryBackend) -> Session {
        memory.sign_in_as("ada@example.com")
    }

    #[tokio::test]
    async fn test_sign_out_clears_user_and_profile() {
        let memory = InMemoryBackend::new();
        let session = ada_session(&memory);
        memory.insert_profile(Profile {
            id: session.user.id.clone(),
            username: "ada".to_string(),
            display_name: Some("Ada".to_string()),
            avatar_url: None,
        });
        let usecase = usecase(&memory);

        usecase
            .apply_session_event(SessionEvent::SignedIn(session))
            .await;
        let signed_in = usecase.snapshot().await;
        assert!(signed_in.user.is_some());
        assert_eq!(signed_in.profile.map(|p| p.username), Some("ada".to_string()));

        usecase.apply_session_event(SessionEvent::SignedOut).await;
        let signed_out = usecase.snapshot().await;
        assert!(signed_out.user.is_none());
        assert!(signed_out.profile.is_none());
    }

    #[tokio::test]
    async fn test_publish_signed_out_is_rejected_without_writes() {
        let memory = InMemoryBackend::new();
        let usecase = usecase(&memory);
        let notices = Arc::new(Mutex::new(Vec::new()));
        let sink = notices.clone();
        usecase
            .set_notifier(Arc::new(move |n: Notice| sink.lock().unwrap().push(n)))
            .await;
        usecase.set_draft_content("hello").await;

        let outcome = usecase.publish().await;

        assert!(matches!(outcome, PublishOutcome::Rejected(Notice::SignInRequired)));
        assert_eq!(memory.write_count(), 0);
        assert_eq!(*notices.lock().unwrap(), vec![Notice::SignInRequired]);
        assert_eq!(usecase.snapshot().await.draft.content, "hello");
    }

    #[tokio::test]
    async fn test_like_signed_out_is_rejected_without_writes() {
        let memory = InMemoryBackend::new();
        let usecase = usecase(&memory);

        let outcome = usecase.like("1").await;

        assert!(matches!(outcome, LikeOutcome::Rejected(Notice::SignInRequiredToLike)));
        assert_eq!(memory.write_count(), 0);
        assert_eq!(
            usecase.snapshot().await.last_notice,
            Some(Notice::SignInRequiredToLike)
        );
    }

    #[tokio::test]
    async fn test_failed_insert_keeps_draft_and_notifies() {
        let memory = InMemoryBackend::new();
        let usecase = usecase(&memory);
        usecase
            .apply_session_event(SessionEvent::SignedIn(ada_session(&memory)))
            .await;
        memory.set_failing(MemoryOperation::PostInsert, true);
        usecase.set_draft_content("try again").await;
        usecase
            .select_image(ImageUpload::new("cat.png", vec![1]))
            .await;

        let outcome = usecase.publish().await;

        assert!(matches!(outcome, PublishOutcome::Failed(_)));
        let state = usecase.snapshot().await;
        assert_eq!(state.draft.content, "try again");
        assert!(state.draft.image.is_some());
        assert_eq!(state.last_notice, Some(Notice::PostFailed));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_feed_failure_keeps_previous_posts() {
        let memory = InMemoryBackend::new();
        let usecase = usecase(&memory);
        usecase
            .apply_session_event(SessionEvent::SignedIn(ada_session(&memory)))
            .await;
        usecase.set_draft_content("kept").await;
        assert!(matches!(usecase.publish().await, PublishOutcome::Published(_)));

        memory.set_failing(MemoryOperation::FeedFetch, true);
        assert!(usecase.refresh_feed().await.is_err());

        let posts = usecase.snapshot().await.posts;
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].content, "kept");
    }

    #[tokio::test]
    async fn test_profile_lookup_failure_does_not_create_profile() {
        let memory = InMemoryBackend::new();
        let usecase = usecase(&memory);
        usecase
            .apply_session_event(SessionEvent::SignedIn(ada_session(&memory)))
            .await;
        memory.set_failing(MemoryOperation::ProfileLookup, true);
        usecase.set_draft_content("no profile").await;

        let outcome = usecase.publish().await;

        // The insert is rejected by the backend because the author has no profile.
        assert!(matches!(outcome, PublishOutcome::Failed(_)));
        assert_eq!(memory.profile_inserts(), 0);
    }

    #[tokio::test]
    async fn test_empty_email_sends_nothing() {
        let memory = InMemoryBackend::new();
        let usecase = usecase(&memory);

        assert!(!usecase.request_sign_in("   ").await.unwrap());
        assert!(usecase.snapshot().await.last_notice.is_none());
    }

    #[tokio::test]
    async fn test_request_sign_in_notifies_check_email() {
        let memory = InMemoryBackend::new();
        let usecase = usecase(&memory);

        assert!(usecase.request_sign_in("ada@example.com").await.unwrap());

        assert!(memory.pending_code("ada@example.com").is_some());
        assert_eq!(usecase.snapshot().await.last_notice, Some(Notice::CheckEmail));
    }

    #[tokio::test]
    async fn test_start_applies_existing_session_and_loads_feed() {
        let memory = InMemoryBackend::new();
        let session = ada_session(&memory);
        let usecase = usecase(&memory);

        let tracker = usecase.start().await;

        let state = usecase.snapshot().await;
        assert_eq!(state.user.map(|u| u.id), Some(session.user.id));
        assert!(tracker.is_active());
        assert_eq!(memory.listener_count(), 1);

        drop(tracker);
        assert_eq!(memory.listener_count(), 0);
        assert!(memory.current_session().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_second_publish_while_first_in_flight_is_busy() {
        let memory = InMemoryBackend::new();
        let mut backend = memory.backend();
        backend.posts = Arc::new(SlowPosts {
            inner: memory.clone(),
            delay: Duration::from_millis(100),
        });
        let usecase = FeedUseCase::new(backend, FeedSettings::default());
        usecase
            .apply_session_event(SessionEvent::SignedIn(ada_session(&memory)))
            .await;
        usecase.set_draft_content("only once").await;

        let (first, second) = tokio::join!(usecase.publish(), usecase.publish());

        let outcomes = [first, second];
        let busy = outcomes
            .iter()
            .filter(|o| matches!(o, PublishOutcome::Busy))
            .count();
        let published = outcomes
            .iter()
            .filter(|o| matches!(o, PublishOutcome::Published(_)))
            .count();
        assert_eq!(busy, 1);
        assert_eq!(published, 1);
        assert_eq!(memory.post_count(), 1);
        assert!(!usecase.snapshot().await.loading);
    }

    #[tokio::test]
    async fn test_verify_sign_in_updates_view_before_returning() {
        let memory = InMemoryBackend::new();
        let usecase = usecase(&memory);
        usecase.request_sign_in("ada@example.com").await.unwrap();
        let code = memory.pending_code("ada@example.com").unwrap();

        // No tracker is running, so only the direct update can set the user.
        let user = usecase
            .verify_sign_in("ada@example.com", &code)
            .await
            .unwrap();

        let state = usecase.snapshot().await;
        assert_eq!(state.user.map(|u| u.id), Some(user.id));
        usecase.set_draft_content("right away").await;
        assert!(matches!(usecase.publish().await, PublishOutcome::Published(_)));
    }
}
