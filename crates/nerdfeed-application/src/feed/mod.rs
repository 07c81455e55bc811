//! Building blocks of the feed use case.
//!
//! Each component wraps one or two backend ports and returns typed outcomes;
//! `FeedUseCase` decides what to show the user.

mod feed_loader;
mod post_composer;
mod profile_ensurer;
mod reaction_recorder;

pub use feed_loader::FeedLoader;
pub use post_composer::{PostComposer, PublishReport};
pub use profile_ensurer::{EnsuredProfile, ProfileEnsurer, ProfileLookup};
pub use reaction_recorder::ReactionRecorder;
