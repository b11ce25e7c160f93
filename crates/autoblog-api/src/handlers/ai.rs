//! Direct chat endpoint.

use axum::{body::Bytes, extract::State, Json};
use serde::Serialize;
use tracing::debug;

use crate::error::{ApiError, ValidationErrors};
use crate::validation::{parse_object, Validator};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Send `{prompt, model?}` to the chat backend and return its reply.
pub async fn chat(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ChatResponse>, ApiError> {
    let input = parse_object(&body)?;
    let mut v = Validator::new(&input);
    let prompt = v.required_string("prompt");
    let model = v.sometimes_string("model");
    v.finish()?;
    let Some(prompt) = prompt else {
        return Err(ApiError::Validation(ValidationErrors::new()));
    };

    let model_name = model.as_deref().unwrap_or(state.chat.model_name());
    debug!(model = model_name, prompt_len = prompt.len(), "Chat request");

    let response = state
        .chat
        .chat(&prompt, model.as_deref())
        .await
        .map_err(|e| ApiError::failed("Failed to get AI response.", "AI_CHAT_FAILED", e))?;

    Ok(Json(ChatResponse { response }))
}
