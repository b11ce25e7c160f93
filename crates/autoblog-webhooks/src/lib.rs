//! # autoblog-webhooks
//!
//! Fire-and-forget notification of content mutations.
//!
//! Handlers call [`WebhookNotifier::dispatch`] after a successful store
//! mutation. The event is queued onto a bounded channel and delivered by a
//! background worker, so the HTTP response never waits on (or fails
//! because of) the webhook receiver.
//!
//! ## Wire Format
//!
//! ```text
//! POST <WEBHOOK_URL>
//! Content-Type: application/json
//! X-Webhook-Event: entry.created
//! X-Webhook-Secret: <WEBHOOK_SECRET>             (when configured)
//! X-Webhook-Signature: sha256=<hex hmac of body> (when configured)
//!
//! {"event": "entry.created", "payload": {...}}
//! ```

pub mod config;
pub mod notifier;
pub mod signing;
pub mod transport;

pub use config::WebhookConfig;
pub use notifier::{NotifierStats, WebhookNotifier};
pub use signing::sign_payload;
pub use transport::{HttpTransport, WebhookTarget, WebhookTransport};
