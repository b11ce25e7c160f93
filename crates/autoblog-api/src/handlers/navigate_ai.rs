//! AI page generation endpoint.

use axum::{extract::State, Json};
use tracing::error;

use crate::error::ApiError;
use crate::services::{GenerationReport, PageGenerator};
use crate::AppState;

/// Generate site pages from the configured knowledge base.
///
/// Always 200 once the schema is in place, even if every page failed; a
/// failure before that point is a 500 `AI_GENERATION_FAILED`.
pub async fn generate_pages(
    State(state): State<AppState>,
) -> Result<Json<GenerationReport>, ApiError> {
    let generator = PageGenerator::from_state(&state);
    match generator.generate(&state.settings.kb_path).await {
        Ok(report) => Ok(Json(report)),
        Err(e) => {
            error!(error = %e, "Page generation failed");
            Err(ApiError::OperationFailed {
                message: format!("Failed to get AI response or process pages: {}", e),
                code: "AI_GENERATION_FAILED",
                details: Some(e.to_string()),
            })
        }
    }
}
