//! Scripted chat backend for deterministic testing.
//!
//! Queue replies with [`MockChatBackend::push_response`], set the fallback
//! with [`MockChatBackend::with_fixed_response`] or
//! [`MockChatBackend::with_failure`], and assert on [`MockChatBackend::calls`].

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use autoblog_core::{ChatBackend, Error, Result};

/// One recorded `chat` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub prompt: String,
    pub model: String,
}

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Fail(String),
}

/// Chat backend that replays queued replies, then a default reply.
#[derive(Clone)]
pub struct MockChatBackend {
    model: String,
    queued: Arc<Mutex<VecDeque<Reply>>>,
    default_reply: Reply,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

impl MockChatBackend {
    pub fn new() -> Self {
        Self {
            model: "mock-model".to_string(),
            queued: Arc::new(Mutex::new(VecDeque::new())),
            default_reply: Reply::Text("Mock response".to_string()),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Reply returned once the queue is empty.
    pub fn with_fixed_response(mut self, response: impl Into<String>) -> Self {
        self.default_reply = Reply::Text(response.into());
        self
    }

    /// Make every call fail (after queued replies are used up).
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.default_reply = Reply::Fail(message.into());
        self
    }

    /// Queue a one-shot reply.
    pub fn push_response(&self, response: impl Into<String>) {
        if let Ok(mut queued) = self.queued.lock() {
            queued.push_back(Reply::Text(response.into()));
        }
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.call_log
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.call_log.lock().map(|log| log.len()).unwrap_or(0)
    }
}

impl Default for MockChatBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatBackend for MockChatBackend {
    async fn chat(&self, prompt: &str, model: Option<&str>) -> Result<String> {
        if let Ok(mut log) = self.call_log.lock() {
            log.push(MockCall {
                prompt: prompt.to_string(),
                model: model.unwrap_or(&self.model).to_string(),
            });
        }

        let next = self
            .queued
            .lock()
            .ok()
            .and_then(|mut queued| queued.pop_front())
            .unwrap_or_else(|| self.default_reply.clone());

        match next {
            Reply::Text(text) => Ok(text),
            Reply::Fail(message) => Err(Error::Inference(message)),
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queued_then_default() {
        let backend = MockChatBackend::new().with_fixed_response("default");
        backend.push_response("first");

        assert_eq!(backend.chat("a", None).await.unwrap(), "first");
        assert_eq!(backend.chat("b", Some("other")).await.unwrap(), "default");

        let calls = backend.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].model, "mock-model");
        assert_eq!(calls[1].model, "other");
    }

    #[tokio::test]
    async fn test_failure_mode() {
        let backend = MockChatBackend::new().with_failure("boom");
        let err = backend.chat("x", None).await.unwrap_err();
        assert!(matches!(err, Error::Inference(ref m) if m == "boom"));
    }
}
