//! # autoblog-inference
//!
//! Chat completion backends for autoblogger.
//!
//! This crate provides:
//! - An OpenAI-compatible [`ChatBackend`](autoblog_core::ChatBackend)
//!   (`/chat/completions`), usable with OpenAI, OpenRouter, Ollama and vLLM
//! - A scripted mock backend (feature `mock`) for deterministic tests
//!
//! # Example
//!
//! ```rust,no_run
//! use autoblog_core::ChatBackend;
//! use autoblog_inference::OpenAIChatBackend;
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = OpenAIChatBackend::from_env().unwrap();
//!     let reply = backend.chat("Say hello", None).await.unwrap();
//!     println!("{reply}");
//! }
//! ```

pub mod openai;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use openai::{OpenAIChatBackend, OpenAIConfig};
