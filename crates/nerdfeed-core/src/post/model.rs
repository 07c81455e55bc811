//! Post domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Name shown for posts whose author profile could not be joined.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Author display data joined onto a post (`profiles:author(...)`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostAuthor {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// A published post as shown in the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Row id; numeric ids from the backend are kept in their decimal form
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    /// Id of the authoring user (and profile)
    pub author: String,
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "profiles", default)]
    pub author_profile: Option<PostAuthor>,
}

impl Post {
    /// Author name for display, `"Unknown"` when the join produced nothing.
    pub fn author_name(&self) -> &str {
        self.author_profile
            .as_ref()
            .and_then(|p| p.display_name.as_deref())
            .filter(|name| !name.is_empty())
            .unwrap_or(UNKNOWN_AUTHOR)
    }
}

/// Row written by the post composer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    pub author: String,
    pub content: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(id) => id,
        RawId::Number(id) => id.to_string(),
    })
}
