//! Makes sure an identity has a profile before it publishes.

use nerdfeed_core::profile::{NewProfile, Profile, ProfileRepository};
use nerdfeed_core::user::User;
use nerdfeed_core::{FeedError, Result};
use std::sync::Arc;

/// Outcome of a profile fetch.
///
/// "Missing" and "failed" are kept apart: only a confirmed missing profile
/// may be created.
#[derive(Debug, Clone)]
pub enum ProfileLookup {
    Found(Profile),
    Missing,
    Failed(FeedError),
}

/// Result of `ProfileEnsurer::ensure`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnsuredProfile {
    /// The profile was already there
    Existing(Profile),
    /// The profile was created just now
    Created(Profile),
}

impl EnsuredProfile {
    pub fn into_profile(self) -> Profile {
        match self {
            Self::Existing(profile) | Self::Created(profile) => profile,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

#[derive(Clone)]
pub struct ProfileEnsurer {
    profiles: Arc<dyn ProfileRepository>,
}

impl ProfileEnsurer {
    pub fn new(profiles: Arc<dyn ProfileRepository>) -> Self {
        Self { profiles }
    }

    /// Fetches the profile for `user_id`.
    pub async fn lookup(&self, user_id: &str) -> ProfileLookup {
        match self.profiles.find_by_id(user_id).await {
            Ok(Some(profile)) => ProfileLookup::Found(profile),
            Ok(None) => ProfileLookup::Missing,
            Err(e) => {
                tracing::warn!("[ProfileEnsurer] Profile fetch for {} failed: {}", user_id, e);
                ProfileLookup::Failed(e)
            }
        }
    }

    /// Returns the user's profile, creating the default one if it is missing.
    ///
    /// A failed lookup is returned as an error without creating anything.
    pub async fn ensure(&self, user: &User) -> Result<EnsuredProfile> {
        match self.lookup(&user.id).await {
            ProfileLookup::Found(profile) => Ok(EnsuredProfile::Existing(profile)),
            ProfileLookup::Failed(e) => Err(e),
            ProfileLookup::Missing => {
                let new_profile = NewProfile::for_user(user);
                tracing::info!(
                    "[ProfileEnsurer] Creating profile '{}' for user {}",
                    new_profile.username,
                    user.id
                );
                self.profiles.insert(&new_profile).await?;

                let created = match self.lookup(&user.id).await {
                    ProfileLookup::Found(profile) => profile,
                    _ => Profile::from(new_profile),
                };
                Ok(EnsuredProfile::Created(created))
            }
        }
    }
}
