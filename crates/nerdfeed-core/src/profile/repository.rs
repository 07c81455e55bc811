//! Profile repository trait.

use super::model::{NewProfile, Profile};
use crate::error::Result;
use async_trait::async_trait;

/// Access to the `profiles` relation.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Finds the profile with the given id.
    ///
    /// Returns `Ok(None)` when no such profile exists; `Err` is reserved for
    /// failures to reach or query the backend.
    async fn find_by_id(&self, id: &str) -> Result<Option<Profile>>;

    /// Inserts a new profile row.
    async fn insert(&self, profile: &NewProfile) -> Result<()>;
}
