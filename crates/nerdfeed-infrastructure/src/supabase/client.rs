//! Shared HTTP client for the hosted backend.

use crate::config::BackendConfig;
use nerdfeed_core::{FeedError, Result};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde_json::Value;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// PostgREST code for "single row expected, zero (or many) returned".
pub(crate) const PGRST_NO_ROWS: &str = "PGRST116";

/// Thin wrapper around `reqwest::Client` that knows the project URL, the
/// anon key and the bearer token of the current session.
///
/// Cloning is cheap; clones share the bearer token.
#[derive(Clone)]
pub struct SupabaseClient {
    http: Client,
    base_url: Url,
    anon_key: String,
    access_token: Arc<RwLock<Option<String>>>,
}

/// Error body returned by the auth, table and storage services.
///
/// The three services disagree on field names, so everything is optional.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<Value>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// A decoded non-success response.
#[derive(Debug, Clone)]
pub(crate) struct ApiError {
    pub status: u16,
    pub code: Option<String>,
    pub message: String,
}

impl ApiError {
    async fn from_response(response: Response) -> Self {
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();

        let code = body.error_code.or(match body.code {
            Some(Value::String(code)) => Some(code),
            Some(Value::Number(code)) => Some(code.to_string()),
            _ => None,
        });
        let message = body
            .message
            .or(body.msg)
            .or(body.error_description)
            .or(body.error)
            .unwrap_or_else(|| {
                if text.is_empty() {
                    "Unknown error".to_string()
                } else {
                    text
                }
            });

        Self {
            status,
            code,
            message,
        }
    }

    pub fn is_no_rows(&self) -> bool {
        self.code.as_deref() == Some(PGRST_NO_ROWS)
    }
}

impl From<ApiError> for FeedError {
    fn from(err: ApiError) -> Self {
        match err.code {
            Some(code) => FeedError::backend(err.status, format!("{} ({})", err.message, code)),
            None => FeedError::backend(err.status, err.message),
        }
    }
}

impl SupabaseClient {
    /// Creates a client for the configured project.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        let base_url = Url::parse(&config.url)
            .map_err(|e| FeedError::config(format!("Invalid backend url '{}': {}", config.url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(FeedError::config(format!(
                "Backend url '{}' cannot be used as a base",
                config.url
            )));
        }

        Ok(Self {
            http,
            base_url,
            anon_key: config.anon_key.clone(),
            access_token: Arc::new(RwLock::new(None)),
        })
    }

    /// Builds `<base>/<segment>/<segment>/...`, percent-encoding each segment.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FeedError::config("Backend url cannot be used as a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Replaces the bearer token used for subsequent requests.
    pub fn set_access_token(&self, token: Option<String>) {
        match self.access_token.write() {
            Ok(mut guard) => *guard = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }

    /// The session token when signed in, the anon key otherwise.
    fn bearer(&self) -> String {
        let token = match self.access_token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        token.unwrap_or_else(|| self.anon_key.clone())
    }

    /// Starts a request carrying the `apikey` and bearer headers.
    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer())
    }

    /// Sends the request and turns non-success statuses into `ApiError`.
    pub(crate) async fn execute(
        &self,
        request: RequestBuilder,
    ) -> std::result::Result<Response, RequestFailure> {
        let response = request.send().await.map_err(RequestFailure::Transport)?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(RequestFailure::Api(ApiError::from_response(response).await))
        }
    }

    /// Like `execute`, collapsing both failure kinds into `FeedError`.
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response> {
        self.execute(request).await.map_err(FeedError::from)
    }
}

/// Why a request did not produce a success response.
#[derive(Debug)]
pub(crate) enum RequestFailure {
    Transport(reqwest::Error),
    Api(ApiError),
}

impl From<RequestFailure> for FeedError {
    fn from(failure: RequestFailure) -> Self {
        match failure {
            RequestFailure::Transport(err) => FeedError::from(err),
            RequestFailure::Api(err) => FeedError::from(err),
        }
    }
}
