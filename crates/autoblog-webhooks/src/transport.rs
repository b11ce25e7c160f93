//! Delivery of a single event to a receiver.

use std::time::Duration;

use async_trait::async_trait;

use autoblog_core::{Error, MutationEvent, Result};

use crate::signing::sign_payload;

/// Receiver endpoint plus optional shared secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookTarget {
    pub url: String,
    pub secret: Option<String>,
}

/// Sends one event to one receiver.
///
/// Returns the receiver's HTTP status on a 2xx response; anything else is an
/// error for the notifier to log.
#[async_trait]
pub trait WebhookTransport: Send + Sync + 'static {
    async fn deliver(&self, target: &WebhookTarget, event: &MutationEvent) -> Result<u16>;
}

/// `reqwest` transport posting the event as JSON.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create webhook client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl WebhookTransport for HttpTransport {
    async fn deliver(&self, target: &WebhookTarget, event: &MutationEvent) -> Result<u16> {
        let body = serde_json::to_vec(event)?;

        let mut request = self
            .client
            .post(&target.url)
            .header("Content-Type", "application/json")
            .header("X-Webhook-Event", event.event.as_str());

        if let Some(secret) = &target.secret {
            request = request.header("X-Webhook-Secret", secret.as_str());
            if let Some(signature) = sign_payload(secret, &body) {
                request = request.header("X-Webhook-Signature", signature);
            }
        }

        let response = request.body(body).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(status.as_u16())
        } else {
            Err(Error::Request(format!(
                "webhook receiver returned {}",
                status.as_u16()
            )))
        }
    }
}
