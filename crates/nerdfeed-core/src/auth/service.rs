//! Auth service trait.

use super::events::{SessionListener, Subscription};
use crate::error::Result;
use crate::user::Session;
use async_trait::async_trait;
use std::sync::Arc;

/// Passwordless authentication against the backend.
///
/// Implementations keep the current session and notify subscribed
/// listeners whenever it changes (sign-in, sign-out).
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Returns the current session, or `None` when signed out.
    async fn current_session(&self) -> Result<Option<Session>>;

    /// Registers a listener for session changes.
    ///
    /// The listener stays registered until the returned `Subscription` is
    /// dropped or explicitly unsubscribed.
    fn subscribe(&self, listener: Arc<dyn SessionListener>) -> Subscription;

    /// Asks the backend to email a one-time sign-in link/code.
    async fn send_sign_in_link(&self, email: &str) -> Result<()>;

    /// Exchanges the emailed one-time code for a session.
    ///
    /// Emits `SessionEvent::SignedIn` on success.
    async fn verify_sign_in(&self, email: &str, code: &str) -> Result<Session>;

    /// Ends the current session.
    ///
    /// Emits `SessionEvent::SignedOut`.
    async fn sign_out(&self) -> Result<()>;
}
