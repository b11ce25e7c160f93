//! Request body parsing and field validation.
//!
//! Bodies are taken as raw bytes and validated field by field so that
//! malformed input always produces a 422 `VALIDATION_FAILED` envelope with
//! per-field messages instead of a framework rejection.

use reqwest::Url;
use serde_json::{Map, Value};

use crate::error::{ApiError, ValidationErrors};

/// Parse a JSON object body. An empty body is an empty object.
pub fn parse_object(body: &[u8]) -> Result<Map<String, Value>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ValidationErrors::single("body", "The request body must be a JSON object.").into()),
        Err(e) => Err(ValidationErrors::single(
            "body",
            format!("The request body must be valid JSON: {}", e),
        )
        .into()),
    }
}

/// Collects field errors while extracting typed values from a JSON object.
pub struct Validator<'a> {
    input: &'a Map<String, Value>,
    prefix: String,
    errors: ValidationErrors,
}

impl<'a> Validator<'a> {
    pub fn new(input: &'a Map<String, Value>) -> Self {
        Self::with_prefix(input, "")
    }

    /// Error keys are reported as `<prefix>.<field>` (e.g. `entries.2.slug`).
    pub fn with_prefix(input: &'a Map<String, Value>, prefix: impl Into<String>) -> Self {
        Self {
            input,
            prefix: prefix.into(),
            errors: ValidationErrors::new(),
        }
    }

    fn key(&self, field: &str) -> String {
        if self.prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", self.prefix, field)
        }
    }

    fn present(&self, field: &str) -> Option<&'a Value> {
        match self.input.get(field) {
            None | Some(Value::Null) => None,
            Some(value) => Some(value),
        }
    }

    fn required_message(&mut self, field: &str) {
        let key = self.key(field);
        self.errors
            .add(key.clone(), format!("The {} field is required.", key));
    }

    fn type_message(&mut self, field: &str, kind: &str) {
        let key = self.key(field);
        self.errors
            .add(key.clone(), format!("The {} field must be {}.", key, kind));
    }

    /// Non-empty string.
    pub fn required_string(&mut self, field: &str) -> Option<String> {
        match self.present(field) {
            None => {
                self.required_message(field);
                None
            }
            Some(Value::String(s)) if s.trim().is_empty() => {
                self.required_message(field);
                None
            }
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                self.type_message(field, "a string");
                None
            }
        }
    }

    /// String if present; absent or `null` is `None`.
    pub fn optional_string(&mut self, field: &str) -> Option<String> {
        match self.present(field) {
            None => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                self.type_message(field, "a string");
                None
            }
        }
    }

    /// Like [`Validator::optional_string`] but an empty string is an error.
    pub fn sometimes_string(&mut self, field: &str) -> Option<String> {
        if self.input.contains_key(field) {
            self.required_string(field)
        } else {
            None
        }
    }

    pub fn optional_object(&mut self, field: &str) -> Option<Map<String, Value>> {
        match self.present(field) {
            None => None,
            Some(Value::Object(map)) => Some(map.clone()),
            Some(_) => {
                self.type_message(field, "an object");
                None
            }
        }
    }

    pub fn required_array(&mut self, field: &str) -> Option<Vec<Value>> {
        match self.present(field) {
            None => {
                self.required_message(field);
                None
            }
            Some(Value::Array(items)) => Some(items.clone()),
            Some(_) => {
                self.type_message(field, "an array");
                None
            }
        }
    }

    pub fn optional_array(&mut self, field: &str) -> Option<Vec<Value>> {
        match self.present(field) {
            None => None,
            Some(Value::Array(items)) => Some(items.clone()),
            Some(_) => {
                self.type_message(field, "an array");
                None
            }
        }
    }

    /// Absolute `http`/`https` URL.
    pub fn required_url(&mut self, field: &str) -> Option<Url> {
        let raw = self.required_string(field)?;
        match Url::parse(raw.trim()) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Some(url),
            _ => {
                self.type_message(field, "a valid URL");
                None
            }
        }
    }

    /// Record an error that is not tied to extraction (uniqueness, etc.).
    pub fn reject(&mut self, field: &str, message: impl Into<String>) {
        let key = self.key(field);
        self.errors.add(key, message);
    }

    pub fn into_errors(self) -> ValidationErrors {
        self.errors
    }

    pub fn finish(self) -> Result<(), ApiError> {
        self.errors.into_result()
    }
}
