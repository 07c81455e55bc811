//! Adapters for the hosted backend-as-a-service.
//!
//! # Module Structure
//!
//! - `client`: shared HTTP client (base URL, anon key, bearer token)
//! - `auth`: passwordless auth and session notifications
//! - `postgrest`: table query builder
//! - `repositories`: profile/post/like repositories over the table builder
//! - `storage`: blob upload and public URLs

mod auth;
mod client;
mod postgrest;
mod repositories;
mod storage;

pub use auth::SupabaseAuth;
pub use client::SupabaseClient;
pub use postgrest::{Order, Table};
pub use repositories::{
    FEED_SELECT, SupabaseLikeRepository, SupabasePostRepository, SupabaseProfileRepository,
};
pub use storage::SupabaseStorage;

use crate::config::BackendConfig;
use nerdfeed_core::{Backend, Result};
use std::sync::Arc;

/// Wires every port to the hosted backend described by `config`.
pub fn connect(config: &BackendConfig) -> Result<Backend> {
    let client = SupabaseClient::new(config)?;
    tracing::info!("[Backend] Using hosted backend at {}", config.url);

    Ok(Backend {
        auth: Arc::new(SupabaseAuth::new(client.clone())),
        profiles: Arc::new(SupabaseProfileRepository::new(client.clone())),
        posts: Arc::new(SupabasePostRepository::new(client.clone())),
        likes: Arc::new(SupabaseLikeRepository::new(client.clone())),
        storage: Arc::new(SupabaseStorage::new(client)),
    })
}
