//! Notifier configuration.

use std::time::Duration;

use autoblog_core::defaults::{WEBHOOK_QUEUE_CAPACITY, WEBHOOK_TIMEOUT_SECS};

/// Where and how mutation events are delivered.
///
/// A missing `url` disables delivery entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookConfig {
    pub url: Option<String>,
    pub secret: Option<String>,
    pub timeout: Duration,
    pub queue_capacity: usize,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: None,
            secret: None,
            timeout: Duration::from_secs(WEBHOOK_TIMEOUT_SECS),
            queue_capacity: WEBHOOK_QUEUE_CAPACITY,
        }
    }
}

impl WebhookConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Read `WEBHOOK_URL`, `WEBHOOK_SECRET`, `WEBHOOK_TIMEOUT_SECS` and
    /// `WEBHOOK_QUEUE_CAPACITY`. Empty strings count as unset.
    pub fn from_env() -> Self {
        let non_empty = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            url: non_empty("WEBHOOK_URL"),
            secret: non_empty("WEBHOOK_SECRET"),
            timeout: Duration::from_secs(
                non_empty("WEBHOOK_TIMEOUT_SECS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(WEBHOOK_TIMEOUT_SECS),
            ),
            queue_capacity: non_empty("WEBHOOK_QUEUE_CAPACITY")
                .and_then(|v| v.parse::<usize>().ok())
                .map(|c| c.max(1))
                .unwrap_or(WEBHOOK_QUEUE_CAPACITY),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.url.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_disabled() {
        let config = WebhookConfig::default();
        assert!(!config.is_enabled());
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.queue_capacity, 1024);
    }

    #[test]
    fn test_builder() {
        let config = WebhookConfig::new("http://hooks.test/in")
            .with_secret("s3cret")
            .with_queue_capacity(0);
        assert!(config.is_enabled());
        assert_eq!(config.secret.as_deref(), Some("s3cret"));
        assert_eq!(config.queue_capacity, 1);
    }
}
