//! Application layer for nerdfeed.
//!
//! This crate provides the feed use case that coordinates the backend ports
//! defined in `nerdfeed-core` to implement the feed page: session tracking,
//! publishing, feed loading and likes.

pub mod feed;
pub mod feed_usecase;
pub mod notice;
pub mod session_tracker;
pub mod state;

pub use feed_usecase::{FeedSettings, FeedUseCase, LikeOutcome, PublishOutcome};
pub use notice::{Notice, Notifier};
pub use session_tracker::SessionTracker;
pub use state::{ComposerDraft, FeedState};
