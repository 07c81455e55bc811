//! The bundle of backend ports handed to the orchestration layer.

use crate::auth::AuthService;
use crate::like::LikeRepository;
use crate::post::PostRepository;
use crate::profile::ProfileRepository;
use crate::storage::ObjectStorage;
use std::sync::Arc;

/// Every capability of the backend-as-a-service the client binds to.
///
/// Constructed once by the binary (or a test) and passed in explicitly.
#[derive(Clone)]
pub struct Backend {
    pub auth: Arc<dyn AuthService>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub likes: Arc<dyn LikeRepository>,
    pub storage: Arc<dyn ObjectStorage>,
}
