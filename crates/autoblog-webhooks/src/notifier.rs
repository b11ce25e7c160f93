//! Queued, never-failing webhook dispatch.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use autoblog_core::{EventKind, MutationEvent, Result};

use crate::config::WebhookConfig;
use crate::transport::{HttpTransport, WebhookTarget, WebhookTransport};

enum Command {
    Deliver(MutationEvent),
    Flush(oneshot::Sender<()>),
}

#[derive(Default)]
struct Stats {
    delivered: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

/// Delivery counters since the notifier was started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifierStats {
    pub delivered: u64,
    pub failed: u64,
    pub dropped: u64,
}

/// Hands mutation events to a background delivery worker.
///
/// Cloning is cheap; all clones share one queue and worker. A notifier built
/// without a URL drops every event without touching the network.
#[derive(Clone)]
pub struct WebhookNotifier {
    tx: Option<mpsc::Sender<Command>>,
    stats: Arc<Stats>,
}

impl WebhookNotifier {
    /// Notifier that never delivers.
    pub fn disabled() -> Self {
        Self {
            tx: None,
            stats: Arc::new(Stats::default()),
        }
    }

    /// Start a notifier using the HTTP transport.
    ///
    /// Must be called from within a Tokio runtime when `config.url` is set.
    pub fn from_config(config: WebhookConfig) -> Result<Self> {
        if !config.is_enabled() {
            return Ok(Self::disabled());
        }
        let transport = HttpTransport::new(config.timeout)?;
        Ok(Self::with_transport(config, transport))
    }

    /// Start a notifier with a custom transport.
    pub fn with_transport<T: WebhookTransport>(config: WebhookConfig, transport: T) -> Self {
        let Some(url) = config.url.clone() else {
            return Self::disabled();
        };
        let target = WebhookTarget {
            url,
            secret: config.secret.clone(),
        };
        let stats = Arc::new(Stats::default());
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));

        tokio::spawn(run_worker(
            rx,
            transport,
            target,
            config.timeout,
            stats.clone(),
        ));

        Self {
            tx: Some(tx),
            stats,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// Queue `payload` under `kind`. Never blocks and never fails.
    pub fn dispatch(&self, kind: EventKind, payload: Value) {
        self.dispatch_event(MutationEvent::new(kind, payload));
    }

    /// Queue a prebuilt event. A full queue drops the event with a warning.
    pub fn dispatch_event(&self, event: MutationEvent) {
        let Some(tx) = &self.tx else {
            debug!(event = %event.event, "No webhook URL configured, skipping dispatch");
            return;
        };
        match tx.try_send(Command::Deliver(event)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(Command::Deliver(event))) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(event = %event.event, "Webhook queue full, dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("Webhook worker stopped, dropping event");
            }
            Err(mpsc::error::TrySendError::Full(Command::Flush(_))) => {}
        }
    }

    /// Wait until every event queued before this call has been attempted.
    pub async fn flush(&self) {
        let Some(tx) = &self.tx else {
            return;
        };
        let (done_tx, done_rx) = oneshot::channel();
        if tx.send(Command::Flush(done_tx)).await.is_ok() {
            let _ = done_rx.await;
        }
    }

    pub fn stats(&self) -> NotifierStats {
        NotifierStats {
            delivered: self.stats.delivered.load(Ordering::Relaxed),
            failed: self.stats.failed.load(Ordering::Relaxed),
            dropped: self.stats.dropped.load(Ordering::Relaxed),
        }
    }
}

async fn run_worker<T: WebhookTransport>(
    mut rx: mpsc::Receiver<Command>,
    transport: T,
    target: WebhookTarget,
    timeout: std::time::Duration,
    stats: Arc<Stats>,
) {
    while let Some(command) = rx.recv().await {
        let event = match command {
            Command::Deliver(event) => event,
            Command::Flush(done) => {
                let _ = done.send(());
                continue;
            }
        };

        let start = Instant::now();
        match tokio::time::timeout(timeout, transport.deliver(&target, &event)).await {
            Ok(Ok(status)) => {
                stats.delivered.fetch_add(1, Ordering::Relaxed);
                debug!(
                    event = %event.event,
                    status,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Webhook delivered"
                );
            }
            Ok(Err(e)) => {
                stats.failed.fetch_add(1, Ordering::Relaxed);
                warn!(event = %event.event, error = %e, "Webhook delivery failed");
            }
            Err(_) => {
                stats.failed.fetch_add(1, Ordering::Relaxed);
                warn!(
                    event = %event.event,
                    timeout_ms = timeout.as_millis() as u64,
                    "Webhook delivery timed out"
                );
            }
        }
    }
    debug!("Webhook worker stopped");
}
