//! Mirrors the auth service's session into the view state.

use nerdfeed_core::auth::{SessionEvent, SessionListener, Subscription};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Listener that hands events to the tracker task without blocking the
/// notifying side.
pub(crate) struct ForwardingListener {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl ForwardingListener {
    pub(crate) fn channel() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl SessionListener for ForwardingListener {
    fn on_session_change(&self, event: &SessionEvent) {
        if self.tx.send(event.clone()).is_err() {
            tracing::debug!("[SessionTracker] Event dropped, tracker already stopped");
        }
    }
}

/// Keeps the view subscribed to session changes.
///
/// Created by `FeedUseCase::start`. Dropping it (view teardown)
/// unsubscribes the listener and stops the task applying events.
pub struct SessionTracker {
    subscription: Option<Subscription>,
    task: JoinHandle<()>,
}

impl SessionTracker {
    pub(crate) fn new(subscription: Subscription, task: JoinHandle<()>) -> Self {
        Self {
            subscription: Some(subscription),
            task,
        }
    }

    /// Stops tracking now; equivalent to dropping the tracker.
    pub fn stop(self) {
        drop(self);
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_some() && !self.task.is_finished()
    }
}

impl Drop for SessionTracker {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        self.task.abort();
        tracing::debug!("[SessionTracker] Stopped");
    }
}
