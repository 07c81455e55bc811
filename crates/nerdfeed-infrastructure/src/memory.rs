//! In-memory backend.
//!
//! Implements every port without a network so the orchestration layer can be
//! exercised in tests and the terminal client can run offline. Individual
//! operations can be switched to fail to exercise partial-failure paths.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nerdfeed_core::auth::{AuthService, ListenerRegistry, SessionEvent, SessionListener, Subscription};
use nerdfeed_core::like::{Like, LikeRepository};
use nerdfeed_core::post::{NewPost, Post, PostAuthor, PostRepository};
use nerdfeed_core::profile::{NewProfile, Profile, ProfileRepository};
use nerdfeed_core::storage::{ImageUpload, ObjectStorage};
use nerdfeed_core::user::{Session, User};
use nerdfeed_core::{Backend, FeedError, Result};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

const PUBLIC_URL_SCHEME: &str = "memory://";

/// Operations that can be forced to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryOperation {
    SendSignInLink,
    VerifySignIn,
    ProfileLookup,
    ProfileInsert,
    FeedFetch,
    PostInsert,
    Upload,
    LikeUpsert,
}

#[derive(Debug, Clone)]
struct StoredPost {
    seq: u64,
    post: NewPost,
}

#[derive(Default)]
struct MemoryState {
    session: Option<Session>,
    users_by_email: HashMap<String, User>,
    pending_codes: HashMap<String, String>,
    profiles: HashMap<String, Profile>,
    posts: Vec<StoredPost>,
    likes: HashSet<Like>,
    blobs: HashMap<(String, String), Vec<u8>>,
    failing: HashSet<MemoryOperation>,
    next_post_seq: u64,
    write_count: usize,
    profile_inserts: usize,
}

/// Backend whose every relation lives in process memory.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    state: Arc<Mutex<MemoryState>>,
    listeners: ListenerRegistry,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bundles this backend as every port.
    pub fn backend(&self) -> Backend {
        let shared = Arc::new(self.clone());
        Backend {
            auth: shared.clone(),
            profiles: shared.clone(),
            posts: shared.clone(),
            likes: shared.clone(),
            storage: shared,
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn check(state: &MemoryState, operation: MemoryOperation) -> Result<()> {
        if state.failing.contains(&operation) {
            Err(FeedError::backend(
                503,
                format!("{:?} failed (injected)", operation),
            ))
        } else {
            Ok(())
        }
    }

    // ============================================================================
    // Test and demo controls
    // ============================================================================

    /// Makes `operation` fail (or succeed again) on every subsequent call.
    pub fn set_failing(&self, operation: MemoryOperation, failing: bool) {
        let mut state = self.lock();
        if failing {
            state.failing.insert(operation);
        } else {
            state.failing.remove(&operation);
        }
    }

    /// Signs `email` in directly, as if the emailed code had been verified.
    pub fn sign_in_as(&self, email: &str) -> Session {
        let session = {
            let mut state = self.lock();
            Self::open_session(&mut state, email)
        };
        self.listeners.notify(&SessionEvent::SignedIn(session.clone()));
        session
    }

    /// The one-time code most recently issued for `email`.
    pub fn pending_code(&self, email: &str) -> Option<String> {
        self.lock().pending_codes.get(email).cloned()
    }

    /// Seeds a profile row.
    pub fn insert_profile(&self, profile: Profile) {
        self.lock().profiles.insert(profile.id.clone(), profile);
    }

    pub fn profile(&self, id: &str) -> Option<Profile> {
        self.lock().profiles.get(id).cloned()
    }

    /// Seeds a post row.
    pub fn insert_post(&self, post: NewPost) {
        let mut state = self.lock();
        Self::push_post(&mut state, post);
    }

    pub fn post_count(&self) -> usize {
        self.lock().posts.len()
    }

    pub fn like_count(&self) -> usize {
        self.lock().likes.len()
    }

    /// Number of profile rows created through `ProfileRepository::insert`.
    pub fn profile_inserts(&self) -> usize {
        self.lock().profile_inserts
    }

    /// Total successful writes (profile and post inserts, like upserts, uploads).
    pub fn write_count(&self) -> usize {
        self.lock().write_count
    }

    /// Bytes behind a public URL produced by this backend.
    pub fn resolve_public_url(&self, url: &str) -> Option<Vec<u8>> {
        let rest = url.strip_prefix(PUBLIC_URL_SCHEME)?;
        let (bucket, path) = rest.split_once('/')?;
        self.lock()
            .blobs
            .get(&(bucket.to_string(), path.to_string()))
            .cloned()
    }

    /// Number of registered session listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn open_session(state: &mut MemoryState, email: &str) -> Session {
        let user = state
            .users_by_email
            .entry(email.to_string())
            .or_insert_with(|| User::new(Uuid::new_v4().to_string(), email))
            .clone();
        let session = Session::new(format!("memory-{}", Uuid::new_v4()), user);
        state.session = Some(session.clone());
        session
    }

    fn push_post(state: &mut MemoryState, post: NewPost) {
        state.next_post_seq += 1;
        let seq = state.next_post_seq;
        state.posts.push(StoredPost { seq, post });
    }
}

fn issue_code() -> String {
    format!("{:06}", Uuid::new_v4().as_u128() % 1_000_000)
}

#[async_trait]
impl AuthService for InMemoryBackend {
    async fn current_session(&self) -> Result<Option<Session>> {
        Ok(self.lock().session.clone())
    }

    fn subscribe(&self, listener: Arc<dyn SessionListener>) -> Subscription {
        self.listeners.subscribe(listener)
    }

    async fn send_sign_in_link(&self, email: &str) -> Result<()> {
        let mut state = self.lock();
        Self::check(&state, MemoryOperation::SendSignInLink)?;
        let code = issue_code();
        tracing::debug!("[MemoryBackend] Issued sign-in code for {}", email);
        state.pending_codes.insert(email.to_string(), code);
        Ok(())
    }

    async fn verify_sign_in(&self, email: &str, code: &str) -> Result<Session> {
        let session = {
            let mut state = self.lock();
            Self::check(&state, MemoryOperation::VerifySignIn)?;
            match state.pending_codes.get(email) {
                Some(expected) if expected == code => {}
                _ => return Err(FeedError::backend(403, "Token has expired or is invalid")),
            }
            state.pending_codes.remove(email);
            Self::open_session(&mut state, email)
        };
        self.listeners.notify(&SessionEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        self.lock().session = None;
        self.listeners.notify(&SessionEvent::SignedOut);
        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for InMemoryBackend {
    async fn find_by_id(&self, id: &str) -> Result<Option<Profile>> {
        let state = self.lock();
        Self::check(&state, MemoryOperation::ProfileLookup)?;
        Ok(state.profiles.get(id).cloned())
    }

    async fn insert(&self, profile: &NewProfile) -> Result<()> {
        let mut state = self.lock();
        Self::check(&state, MemoryOperation::ProfileInsert)?;
        if state.profiles.contains_key(&profile.id) {
            return Err(FeedError::backend(
                409,
                format!("duplicate key value violates unique constraint (id={})", profile.id),
            ));
        }
        state
            .profiles
            .insert(profile.id.clone(), Profile::from(profile.clone()));
        state.profile_inserts += 1;
        state.write_count += 1;
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryBackend {
    async fn list_feed(&self) -> Result<Vec<Post>> {
        let state = self.lock();
        Self::check(&state, MemoryOperation::FeedFetch)?;

        let mut rows: Vec<&StoredPost> = state.posts.iter().collect();
        rows.sort_by(|a, b| {
            b.post
                .created_at
                .cmp(&a.post.created_at)
                .then(b.seq.cmp(&a.seq))
        });

        Ok(rows
            .into_iter()
            .map(|row| Post {
                id: row.seq.to_string(),
                author: row.post.author.clone(),
                content: row.post.content.clone(),
                image_url: row.post.image_url.clone(),
                created_at: row.post.created_at,
                author_profile: state.profiles.get(&row.post.author).map(|p| PostAuthor {
                    display_name: p.display_name.clone(),
                    avatar_url: p.avatar_url.clone(),
                }),
            })
            .collect())
    }

    async fn insert(&self, post: &NewPost) -> Result<()> {
        let mut state = self.lock();
        Self::check(&state, MemoryOperation::PostInsert)?;
        if !state.profiles.contains_key(&post.author) {
            return Err(FeedError::backend(
                409,
                format!("posts.author references missing profile {}", post.author),
            ));
        }
        Self::push_post(&mut state, post.clone());
        state.write_count += 1;
        Ok(())
    }
}

#[async_trait]
impl LikeRepository for InMemoryBackend {
    async fn upsert(&self, like: &Like) -> Result<()> {
        let mut state = self.lock();
        Self::check(&state, MemoryOperation::LikeUpsert)?;
        state.likes.insert(like.clone());
        state.write_count += 1;
        Ok(())
    }
}

#[async_trait]
impl ObjectStorage for InMemoryBackend {
    async fn upload(&self, bucket: &str, name: &str, upload: &ImageUpload) -> Result<String> {
        let mut state = self.lock();
        Self::check(&state, MemoryOperation::Upload)?;
        let key = (bucket.to_string(), name.to_string());
        if state.blobs.contains_key(&key) {
            return Err(FeedError::backend(409, "The resource already exists"));
        }
        state.blobs.insert(key, upload.bytes.clone());
        state.write_count += 1;
        Ok(name.to_string())
    }

    fn public_url(&self, bucket: &str, path: &str) -> Result<String> {
        Ok(format!("{}{}/{}", PUBLIC_URL_SCHEME, bucket, path))
    }
}

/// Builds a post row without an image, for seeding.
pub fn new_post(author: &str, content: &str, created_at: DateTime<Utc>) -> NewPost {
    NewPost {
        author: author.to_string(),
        content: content.to_string(),
        image_url: None,
        created_at,
    }
}
