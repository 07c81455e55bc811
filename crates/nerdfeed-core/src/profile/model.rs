//! Profile domain model.

use crate::user::User;
use serde::{Deserialize, Serialize};

/// Public profile of a user, one-to-one with the identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Same value as the owning user's id
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl Profile {
    /// Name shown next to the user's posts.
    pub fn shown_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}

/// Row written when a profile is created lazily.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProfile {
    pub id: String,
    pub username: String,
    pub display_name: String,
}

impl NewProfile {
    /// Synthesizes the default profile for a user: both username and
    /// display name are the local part of the email address.
    pub fn for_user(user: &User) -> Self {
        let name = user.email_local_part().to_string();
        Self {
            id: user.id.clone(),
            username: name.clone(),
            display_name: name,
        }
    }
}

impl From<NewProfile> for Profile {
    fn from(new: NewProfile) -> Self {
        Self {
            id: new.id,
            username: new.username,
            display_name: Some(new.display_name),
            avatar_url: None,
        }
    }
}
