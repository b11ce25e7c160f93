//! OpenAI-compatible chat backend.
//!
//! Works with any endpoint that implements `POST {base_url}/chat/completions`:
//!
//! - OpenAI cloud API
//! - OpenRouter
//! - Ollama (in OpenAI compatibility mode)
//! - vLLM / LM Studio
//!
//! # Environment
//!
//! | Variable | Default |
//! |----------|---------|
//! | `OPENAI_BASE_URL` | `https://api.openai.com/v1` |
//! | `OPENAI_API_KEY` | unset (no `Authorization` header) |
//! | `OPENAI_MODEL` | `gpt-4o-mini` |
//! | `OPENAI_TIMEOUT` | `30` seconds |

mod backend;
mod error;
mod types;

pub use backend::*;
pub use error::*;
pub use types::*;
