//! Domain layer for nerdfeed.
//!
//! Holds the domain models, the shared error type and the port traits that
//! backend adapters implement.

pub mod auth;
pub mod backend;
pub mod error;
pub mod like;
pub mod post;
pub mod profile;
pub mod storage;
pub mod user;

// Re-export common types
pub use backend::Backend;
pub use error::{FeedError, Result};
