//! Server configuration read from the environment.
//!
//! `.env` is loaded by the binary before [`ServerConfig::from_env`] runs, so
//! every setting can live in either place.

use std::path::PathBuf;
use std::time::Duration;

use autoblog_core::defaults::{
    ASSET_CONTAINER, ASSET_FETCH_TIMEOUT_SECS, MAX_UPLOAD_BYTES,
};
use autoblog_inference::OpenAIConfig;
use autoblog_webhooks::WebhookConfig;

/// Default public base URL used to build entry and asset URLs.
pub const DEFAULT_SITE_URL: &str = "http://localhost:3000";

/// Default knowledge-base document for page generation.
pub const DEFAULT_KB_PATH: &str = "kb.md";

/// Settings handlers read at request time.
#[derive(Debug, Clone)]
pub struct AppSettings {
    /// Public base URL without a trailing slash.
    pub site_url: String,
    pub kb_path: PathBuf,
    pub allowed_origins: String,
    pub max_upload_bytes: usize,
    pub asset_fetch_timeout: Duration,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            site_url: DEFAULT_SITE_URL.to_string(),
            kb_path: PathBuf::from(DEFAULT_KB_PATH),
            allowed_origins: DEFAULT_SITE_URL.to_string(),
            max_upload_bytes: MAX_UPLOAD_BYTES,
            asset_fetch_timeout: Duration::from_secs(ASSET_FETCH_TIMEOUT_SECS),
        }
    }
}

/// Everything the `autoblog-api` binary needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub settings: AppSettings,
    pub asset_containers: Vec<String>,
    pub webhook: WebhookConfig,
    pub openai: OpenAIConfig,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .unwrap_or(3000);

        let settings = AppSettings {
            site_url: std::env::var("SITE_URL")
                .unwrap_or_else(|_| DEFAULT_SITE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            kb_path: std::env::var("KB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_KB_PATH)),
            allowed_origins: std::env::var("ALLOWED_ORIGINS")
                .unwrap_or_else(|_| DEFAULT_SITE_URL.to_string()),
            max_upload_bytes: std::env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(MAX_UPLOAD_BYTES),
            asset_fetch_timeout: Duration::from_secs(
                std::env::var("ASSET_FETCH_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(ASSET_FETCH_TIMEOUT_SECS),
            ),
        };

        let asset_containers = parse_list(
            &std::env::var("ASSET_CONTAINERS").unwrap_or_else(|_| ASSET_CONTAINER.to_string()),
        );

        Self {
            host,
            port,
            settings,
            asset_containers,
            webhook: WebhookConfig::from_env(),
            openai: OpenAIConfig::from_env(),
        }
    }
}

/// Split a comma-separated setting, dropping blanks.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
