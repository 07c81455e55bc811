//! Backend configuration.
//!
//! Credentials are supplied externally. Each field is resolved from the
//! environment first and then from `config.toml`
//! (`~/.config/nerdfeed/config.toml` unless a path is given).
//!
//! ```toml
//! [backend]
//! url = "https://xyzcompany.supabase.co"
//! anon_key = "public-anon-key"
//! storage_bucket = "post-images"
//! request_timeout_secs = 30
//! ```

use nerdfeed_core::storage::POST_IMAGES_BUCKET;
use nerdfeed_core::{FeedError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_URL: &str = "NERDFEED_SUPABASE_URL";
pub const ENV_ANON_KEY: &str = "NERDFEED_SUPABASE_ANON_KEY";
pub const ENV_STORAGE_BUCKET: &str = "NERDFEED_STORAGE_BUCKET";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "NERDFEED_REQUEST_TIMEOUT_SECS";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Resolved connection settings for the hosted backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project base URL, without trailing slash
    pub url: String,
    /// Public anon key sent as `apikey`
    pub anon_key: String,
    pub storage_bucket: String,
    pub request_timeout_secs: u64,
}

/// `[backend]` table of the config file; every field optional.
#[derive(Debug, Clone, Default, Deserialize)]
struct BackendSection {
    url: Option<String>,
    anon_key: Option<String>,
    storage_bucket: Option<String>,
    request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    backend: BackendSection,
}

impl BackendConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: normalize_url(&url.into()),
            anon_key: anon_key.into(),
            storage_bucket: POST_IMAGES_BUCKET.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }

    /// Default location of the config file.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("nerdfeed").join("config.toml"))
    }

    /// Loads the configuration from the process environment and the config
    /// file at `path` (or the default path).
    ///
    /// A missing config file is not an error as long as the environment
    /// provides the credentials.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path(),
        };

        let file = match path {
            Some(path) if path.exists() => {
                tracing::debug!("[Config] Reading {}", path.display());
                let text = tokio::fs::read_to_string(&path).await?;
                Some(text)
            }
            Some(path) => {
                tracing::debug!("[Config] No config file at {}", path.display());
                None
            }
            None => None,
        };

        Self::resolve(file.as_deref(), |key| std::env::var(key).ok())
    }

    /// Builds the configuration from optional config file text and an
    /// environment lookup. Environment values win.
    pub fn resolve(
        file_text: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let file: ConfigFile = match file_text {
            Some(text) => toml::from_str(text)?,
            None => ConfigFile::default(),
        };
        let section = file.backend;
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        let url = non_empty(env(ENV_URL))
            .or_else(|| non_empty(section.url))
            .ok_or_else(|| FeedError::config(format!("{} is not set", ENV_URL)))?;
        let anon_key = non_empty(env(ENV_ANON_KEY))
            .or_else(|| non_empty(section.anon_key))
            .ok_or_else(|| FeedError::config(format!("{} is not set", ENV_ANON_KEY)))?;
        let storage_bucket = non_empty(env(ENV_STORAGE_BUCKET))
            .or_else(|| non_empty(section.storage_bucket))
            .unwrap_or_else(|| POST_IMAGES_BUCKET.to_string());

        let request_timeout_secs = match non_empty(env(ENV_REQUEST_TIMEOUT_SECS)) {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                FeedError::config(format!(
                    "{} must be a number of seconds, got '{}'",
                    ENV_REQUEST_TIMEOUT_SECS, raw
                ))
            })?,
            None => section
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        };

        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(FeedError::config(format!(
                "backend url must start with http:// or https://, got '{}'",
                url
            )));
        }

        Ok(Self {
            url: normalize_url(&url),
            anon_key,
            storage_bucket,
            request_timeout_secs,
        })
    }
}

fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
