//! User-visible notices.

use std::fmt;
use std::sync::Arc;

/// A message that must be shown to the user (the terminal equivalent of a
/// blocking alert).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// Publishing was attempted while signed out
    SignInRequired,
    /// Liking was attempted while signed out
    SignInRequiredToLike,
    /// A sign-in link/code was sent
    CheckEmail,
    /// Inserting the post failed
    PostFailed,
}

impl Notice {
    pub fn message(&self) -> &'static str {
        match self {
            Self::SignInRequired => "Please sign in first.",
            Self::SignInRequiredToLike => "Please sign in to like.",
            Self::CheckEmail => "Check your email for sign-in link.",
            Self::PostFailed => "Error creating post",
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Callback invoked for every notice (e.g. to print it).
pub type Notifier = Arc<dyn Fn(Notice) + Send + Sync>;
