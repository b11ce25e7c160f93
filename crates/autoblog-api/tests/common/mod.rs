//! Shared harness: the real router over in-memory collaborators.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use autoblog_api::{build_router, AppSettings, AppState};
use autoblog_core::{MutationEvent, Result};
use autoblog_inference::mock::MockChatBackend;
use autoblog_store::MemoryContentStore;
use autoblog_webhooks::{WebhookConfig, WebhookNotifier, WebhookTarget, WebhookTransport};

pub const SITE_URL: &str = "https://site.test";

/// Transport that records every delivered event.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    seen: Arc<Mutex<Vec<MutationEvent>>>,
}

impl RecordingTransport {
    pub fn events(&self) -> Vec<MutationEvent> {
        self.seen.lock().unwrap().clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.event).collect()
    }
}

#[async_trait]
impl WebhookTransport for RecordingTransport {
    async fn deliver(&self, _target: &WebhookTarget, event: &MutationEvent) -> Result<u16> {
        self.seen.lock().unwrap().push(event.clone());
        Ok(200)
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryContentStore>,
    pub chat: Arc<MockChatBackend>,
    pub notifier: WebhookNotifier,
    pub transport: RecordingTransport,
}

pub struct TestAppBuilder {
    webhook_url: Option<String>,
    kb_path: PathBuf,
    chat: MockChatBackend,
    max_upload_bytes: Option<usize>,
}

impl TestAppBuilder {
    pub fn without_webhook(mut self) -> Self {
        self.webhook_url = None;
        self
    }

    pub fn with_kb_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.kb_path = path.into();
        self
    }

    pub fn with_chat(mut self, chat: MockChatBackend) -> Self {
        self.chat = chat;
        self
    }

    pub fn with_max_upload_bytes(mut self, limit: usize) -> Self {
        self.max_upload_bytes = Some(limit);
        self
    }

    pub fn build(self) -> TestApp {
        let store = Arc::new(MemoryContentStore::with_containers(["assets"]));
        let chat = Arc::new(self.chat);
        let transport = RecordingTransport::default();
        let config = match self.webhook_url {
            Some(url) => WebhookConfig::new(url),
            None => WebhookConfig::default(),
        };
        let notifier = WebhookNotifier::with_transport(config, transport.clone());

        let mut settings = AppSettings {
            site_url: SITE_URL.to_string(),
            kb_path: self.kb_path,
            ..AppSettings::default()
        };
        if let Some(limit) = self.max_upload_bytes {
            settings.max_upload_bytes = limit;
        }
        let state = AppState::new(store.clone(), chat.clone(), notifier.clone(), settings)
            .expect("app state");

        TestApp {
            router: build_router(state),
            store,
            chat,
            notifier,
            transport,
        }
    }
}

impl TestApp {
    pub fn builder() -> TestAppBuilder {
        TestAppBuilder {
            webhook_url: Some("http://hooks.test/receiver".to_string()),
            kb_path: PathBuf::from("/nonexistent/kb.md"),
            chat: MockChatBackend::new(),
            max_upload_bytes: None,
        }
    }

    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Send a request with an optional JSON body; returns status and parsed body
    /// (`Value::Null` for an empty body).
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.call(request.body(body).expect("request")).await
    }

    pub async fn call(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, None).await
    }

    /// Wait for queued webhook deliveries, then return their event names.
    pub async fn delivered_events(&self) -> Vec<String> {
        self.notifier.flush().await;
        self.transport.names()
    }

    /// Create the `blog` collection (route `blog/{slug}`) and `post` blueprint.
    pub async fn seed_blog(&self) {
        let (status, _) = self
            .post(
                "/api/autoblogger/collections",
                serde_json::json!({"handle": "blog", "title": "Blog", "route": "blog/{slug}"}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = self
            .post(
                "/api/autoblogger/blueprints",
                serde_json::json!({
                    "handle": "post",
                    "title": "Post",
                    "fields": [{"handle": "title", "field": {"type": "text"}}]
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }
}
