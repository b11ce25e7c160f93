//! HTTP error envelope.
//!
//! Every failure is rendered as `{"error": ..., "code": ..., "details": ...}`.

use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

/// Field name to list of messages, in the order they were recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), ApiError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self))
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Validation Failed")]
    Validation(ValidationErrors),

    #[error("{message}")]
    NotFound { message: String, code: &'static str },

    #[error("{message}")]
    OperationFailed {
        message: String,
        code: &'static str,
        details: Option<String>,
    },
}

impl ApiError {
    pub fn not_found(message: impl Into<String>, code: &'static str) -> Self {
        ApiError::NotFound {
            message: message.into(),
            code,
        }
    }

    pub fn collection_not_found() -> Self {
        Self::not_found("Collection not found.", "COLLECTION_NOT_FOUND")
    }

    pub fn entry_not_found() -> Self {
        Self::not_found("Entry not found.", "ENTRY_NOT_FOUND")
    }

    pub fn blueprint_not_found() -> Self {
        Self::not_found("Blueprint not found.", "BLUEPRINT_NOT_FOUND")
    }

    pub fn container_not_found() -> Self {
        Self::not_found("Asset container not found.", "ASSET_CONTAINER_NOT_FOUND")
    }

    pub fn asset_not_found() -> Self {
        Self::not_found("Asset not found.", "ASSET_NOT_FOUND")
    }

    /// 500 carrying the underlying error message in `details`.
    pub fn failed(
        message: impl Into<String>,
        code: &'static str,
        cause: impl std::fmt::Display,
    ) -> Self {
        ApiError::OperationFailed {
            message: message.into(),
            code,
            details: Some(cause.to_string()),
        }
    }

    /// 500 without details.
    pub fn failed_bare(message: impl Into<String>, code: &'static str) -> Self {
        ApiError::OperationFailed {
            message: message.into(),
            code,
            details: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::OperationFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_FAILED",
            ApiError::NotFound { code, .. } | ApiError::OperationFailed { code, .. } => *code,
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let message = self.to_string();

        let details = match self {
            ApiError::Validation(errors) => json!(errors),
            ApiError::NotFound { .. } => json!([]),
            ApiError::OperationFailed { details, .. } => match details {
                Some(details) => json!({ "details": details }),
                None => json!([]),
            },
        };

        if status.is_server_error() {
            tracing::warn!(code, error = %message, "Request failed");
        }

        let body: Value = json!({
            "error": message,
            "code": code,
            "details": details,
        });
        (status, Json(body)).into_response()
    }
}
