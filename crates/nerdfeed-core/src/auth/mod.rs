//! Authentication port.
//!
//! # Module Structure
//!
//! - `events`: session-change notifications, listeners and subscriptions
//! - `service`: the `AuthService` trait implemented by backend adapters

mod events;
mod service;

pub use events::{ListenerRegistry, SessionEvent, SessionListener, Subscription};
pub use service::AuthService;
