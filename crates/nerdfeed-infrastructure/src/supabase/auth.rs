//! Passwordless auth against the hosted auth service.

use super::client::SupabaseClient;
use async_trait::async_trait;
use nerdfeed_core::auth::{AuthService, ListenerRegistry, SessionEvent, SessionListener, Subscription};
use nerdfeed_core::user::Session;
use nerdfeed_core::Result;
use reqwest::Method;
use serde::Serialize;
use std::sync::{Arc, RwLock};

#[derive(Debug, Serialize)]
struct OtpRequest<'a> {
    email: &'a str,
    create_user: bool,
}

#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    email: &'a str,
    token: &'a str,
}

/// `AuthService` backed by the hosted auth endpoints.
///
/// Keeps the session in memory only; nothing is persisted locally.
pub struct SupabaseAuth {
    client: SupabaseClient,
    session: RwLock<Option<Session>>,
    listeners: ListenerRegistry,
}

impl SupabaseAuth {
    pub fn new(client: SupabaseClient) -> Self {
        Self {
            client,
            session: RwLock::new(None),
            listeners: ListenerRegistry::new(),
        }
    }

    fn replace_session(&self, session: Option<Session>) {
        self.client
            .set_access_token(session.as_ref().map(|s| s.access_token.clone()));
        match self.session.write() {
            Ok(mut guard) => *guard = session,
            Err(poisoned) => *poisoned.into_inner() = session,
        }
    }
}

#[async_trait]
impl AuthService for SupabaseAuth {
    async fn current_session(&self) -> Result<Option<Session>> {
        let guard = match self.session.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Ok(guard.clone())
    }

    fn subscribe(&self, listener: Arc<dyn SessionListener>) -> Subscription {
        self.listeners.subscribe(listener)
    }

    async fn send_sign_in_link(&self, email: &str) -> Result<()> {
        let url = self.client.endpoint(&["auth", "v1", "otp"])?;
        let request = self.client.request(Method::POST, url).json(&OtpRequest {
            email,
            create_user: true,
        });
        self.client.send(request).await?;
        tracing::info!("[Auth] Sign-in link requested");
        Ok(())
    }

    async fn verify_sign_in(&self, email: &str, code: &str) -> Result<Session> {
        let url = self.client.endpoint(&["auth", "v1", "verify"])?;
        let request = self.client.request(Method::POST, url).json(&VerifyRequest {
            kind: "email",
            email,
            token: code,
        });
        let session: Session = self.client.send(request).await?.json().await?;

        tracing::info!("[Auth] Signed in as user {}", session.user.id);
        self.replace_session(Some(session.clone()));
        self.listeners.notify(&SessionEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        let signed_in = self.current_session().await?.is_some();
        if signed_in {
            let url = self.client.endpoint(&["auth", "v1", "logout"])?;
            let request = self.client.request(Method::POST, url);
            // The local session is dropped even when the server call fails.
            if let Err(e) = self.client.send(request).await {
                tracing::warn!("[Auth] Logout request failed: {}", e);
            }
        }

        self.replace_session(None);
        tracing::info!("[Auth] Signed out");
        self.listeners.notify(&SessionEvent::SignedOut);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendConfig;
    use serde_json::json;
    use std::sync::Mutex;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct Recorder(Mutex<Vec<SessionEvent>>);

    impl SessionListener for Recorder {
        fn on_session_change(&self, event: &SessionEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    fn auth_for(server: &MockServer) -> SupabaseAuth {
        let client = SupabaseClient::new(&BackendConfig::new(server.uri(), "anon")).unwrap();
        SupabaseAuth::new(client)
    }

    async fn mount_verify(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/auth/v1/verify"))
            .and(body_json(json!({
                "type": "email",
                "email": "ada@example.com",
                "token": "123456"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "jwt-ada",
                "token_type": "bearer",
                "expires_in": 3600,
                "refresh_token": "refresh",
                "user": { "id": "u-ada", "email": "ada@example.com" }
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_send_sign_in_link_posts_email() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/otp"))
            .and(body_json(json!({"email": "ada@example.com", "create_user": true})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        auth_for(&server)
            .send_sign_in_link("ada@example.com")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_verify_stores_session_and_notifies() {
        let server = MockServer::start().await;
        mount_verify(&server).await;

        let auth = auth_for(&server);
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        let _subscription = auth.subscribe(recorder.clone());

        let session = auth.verify_sign_in("ada@example.com", "123456").await.unwrap();

        assert_eq!(session.user.id, "u-ada");
        assert_eq!(
            auth.current_session().await.unwrap().map(|s| s.access_token),
            Some("jwt-ada".to_string())
        );
        let events = recorder.0.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], SessionEvent::SignedIn(s) if s.user.id == "u-ada"));
    }

    #[tokio::test]
    async fn test_requests_after_sign_in_use_session_token() {
        let server = MockServer::start().await;
        mount_verify(&server).await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .and(header("authorization", "Bearer jwt-ada"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let auth = auth_for(&server);
        auth.verify_sign_in("ada@example.com", "123456").await.unwrap();
        auth.sign_out().await.unwrap();

        assert!(auth.current_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sign_out_clears_session_even_if_server_fails() {
        let server = MockServer::start().await;
        mount_verify(&server).await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let auth = auth_for(&server);
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        let _subscription = auth.subscribe(recorder.clone());
        auth.verify_sign_in("ada@example.com", "123456").await.unwrap();

        auth.sign_out().await.unwrap();

        assert!(auth.current_session().await.unwrap().is_none());
        let events = recorder.0.lock().unwrap();
        assert_eq!(events.last(), Some(&SessionEvent::SignedOut));
    }

    #[tokio::test]
    async fn test_rejected_code_is_backend_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/verify"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "code": 403,
                "error_code": "otp_expired",
                "msg": "Token has expired or is invalid"
            })))
            .mount(&server)
            .await;

        let err = auth_for(&server)
            .verify_sign_in("ada@example.com", "000000")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("otp_expired"));
    }
}
