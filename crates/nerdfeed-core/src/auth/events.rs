//! Session-change notifications.

use crate::user::{Session, User};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// A change of the authentication state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn(Session),
    SignedOut,
}

impl SessionEvent {
    /// Builds an event from an optional session (as returned by an initial fetch).
    pub fn from_session(session: Option<Session>) -> Self {
        match session {
            Some(session) => Self::SignedIn(session),
            None => Self::SignedOut,
        }
    }

    /// The identity carried by the event, if any.
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::SignedIn(session) => Some(&session.user),
            Self::SignedOut => None,
        }
    }
}

/// Observer of session changes.
///
/// Called synchronously from the notifying side; implementations must not
/// block and should hand the event off (e.g. over a channel).
pub trait SessionListener: Send + Sync {
    fn on_session_change(&self, event: &SessionEvent);
}

/// Handle that keeps a listener registered.
///
/// Dropping the handle unregisters the listener.
#[must_use = "dropping a Subscription immediately unsubscribes the listener"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(unsubscribe: impl FnOnce() + Send + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// Unregisters the listener now.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

type ListenerMap = HashMap<u64, Arc<dyn SessionListener>>;

/// Registry of session listeners shared by auth adapters.
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    listeners: Arc<Mutex<ListenerMap>>,
    next_id: Arc<AtomicU64>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener and returns the subscription that removes it.
    pub fn subscribe(&self, listener: Arc<dyn SessionListener>) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.insert(id, listener);
        }

        let listeners = Arc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                if let Ok(mut listeners) = listeners.lock() {
                    listeners.remove(&id);
                }
            }
        })
    }

    /// Delivers an event to every registered listener.
    pub fn notify(&self, event: &SessionEvent) {
        // Snapshot so listeners may unsubscribe from inside the callback.
        let snapshot: Vec<Arc<dyn SessionListener>> = match self.listeners.lock() {
            Ok(listeners) => listeners.values().cloned().collect(),
            Err(_) => return,
        };
        tracing::debug!("[Auth] Notifying {} listener(s)", snapshot.len());
        for listener in snapshot {
            listener.on_session_change(event);
        }
    }

    /// Number of currently registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.lock().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingListener {
        events: Mutex<Vec<SessionEvent>>,
    }

    impl RecordingListener {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                events: Mutex::new(Vec::new()),
            })
        }

        fn count(&self) -> usize {
            self.events.lock().unwrap().len()
        }
    }

    impl SessionListener for RecordingListener {
        fn on_session_change(&self, event: &SessionEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    #[test]
    fn test_notify_reaches_subscribed_listener() {
        let registry = ListenerRegistry::new();
        let listener = RecordingListener::new();
        let _subscription = registry.subscribe(listener.clone());

        registry.notify(&SessionEvent::SignedOut);

        assert_eq!(listener.count(), 1);
    }

    #[test]
    fn test_dropping_subscription_unregisters() {
        let registry = ListenerRegistry::new();
        let listener = RecordingListener::new();
        let subscription = registry.subscribe(listener.clone());
        assert_eq!(registry.len(), 1);

        drop(subscription);
        registry.notify(&SessionEvent::SignedOut);

        assert!(registry.is_empty());
        assert_eq!(listener.count(), 0);
    }

    #[test]
    fn test_explicit_unsubscribe() {
        let registry = ListenerRegistry::new();
        let first = RecordingListener::new();
        let second = RecordingListener::new();
        let first_sub = registry.subscribe(first.clone());
        let _second_sub = registry.subscribe(second.clone());

        first_sub.unsubscribe();
        registry.notify(&SessionEvent::SignedOut);

        assert_eq!(first.count(), 0);
        assert_eq!(second.count(), 1);
    }

    #[test]
    fn test_subscription_outliving_registry_is_harmless() {
        let registry = ListenerRegistry::new();
        let subscription = registry.subscribe(RecordingListener::new());
        drop(registry);
        drop(subscription);
    }

    #[test]
    fn test_event_user() {
        let session = Session::new("token", User::new("u-1", "ada@example.com"));
        let event = SessionEvent::from_session(Some(session));
        assert_eq!(event.user().map(|u| u.id.as_str()), Some("u-1"));
        assert_eq!(SessionEvent::from_session(None).user(), None);
    }
}
