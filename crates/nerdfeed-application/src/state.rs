//! View state maintained by the feed use case.

use crate::notice::Notice;
use nerdfeed_core::post::Post;
use nerdfeed_core::profile::Profile;
use nerdfeed_core::storage::ImageUpload;
use nerdfeed_core::user::User;

/// Composer input: text plus an optional selected file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposerDraft {
    pub content: String,
    pub image: Option<ImageUpload>,
}

impl ComposerDraft {
    pub fn is_empty(&self) -> bool {
        self.content.is_empty() && self.image.is_none()
    }
}

/// Everything the page renders.
///
/// The backend owns the data; this is a transient copy.
#[derive(Debug, Clone, Default)]
pub struct FeedState {
    pub user: Option<User>,
    pub profile: Option<Profile>,
    /// Newest first
    pub posts: Vec<Post>,
    pub draft: ComposerDraft,
    /// True while a publish is in flight
    pub loading: bool,
    pub last_notice: Option<Notice>,
}

impl FeedState {
    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }
}
