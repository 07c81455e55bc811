//! User and session domain models.
//!
//! Identities are issued by the external auth service; the client only
//! observes them.

mod model;

pub use model::{Session, User};
