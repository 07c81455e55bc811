//! Table-backed repository implementations.

use super::client::SupabaseClient;
use super::postgrest::Order;
use async_trait::async_trait;
use nerdfeed_core::Result;
use nerdfeed_core::like::{Like, LikeRepository};
use nerdfeed_core::post::{NewPost, Post, PostRepository};
use nerdfeed_core::profile::{NewProfile, Profile, ProfileRepository};

const PROFILES: &str = "profiles";
const POSTS: &str = "posts";
const POST_LIKES: &str = "post_likes";

/// Projection joining each post's author display data.
pub const FEED_SELECT: &str = "*, profiles:author(display_name, avatar_url)";

pub struct SupabaseProfileRepository {
    client: SupabaseClient,
}

impl SupabaseProfileRepository {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProfileRepository for SupabaseProfileRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Profile>> {
        self.client
            .from(PROFILES)
            .select("*")
            .eq("id", id)
            .fetch_optional()
            .await
    }

    async fn insert(&self, profile: &NewProfile) -> Result<()> {
        self.client.from(PROFILES).insert(profile).await
    }
}

pub struct SupabasePostRepository {
    client: SupabaseClient,
}

impl SupabasePostRepository {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PostRepository for SupabasePostRepository {
    async fn list_feed(&self) -> Result<Vec<Post>> {
        self.client
            .from(POSTS)
            .select(FEED_SELECT)
            .order("created_at", Order::Descending)
            .fetch()
            .await
    }

    async fn insert(&self, post: &NewPost) -> Result<()> {
        self.client.from(POSTS).insert(post).await
    }
}

pub struct SupabaseLikeRepository {
    client: SupabaseClient,
}

impl SupabaseLikeRepository {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LikeRepository for SupabaseLikeRepository {
    async fn upsert(&self, like: &Like) -> Result<()> {
        self.client
            .from(POST_LIKES)
            .upsert(like, "post_id,user_id")
            .await
    }
}
