//! HTTP handlers.
//!
//! Each module maps one resource onto the content store and hands a
//! mutation event to the notifier after every successful write.

pub mod ai;
pub mod assets;
pub mod blueprints;
pub mod collections;
pub mod entries;
pub mod navigate_ai;

use std::collections::HashMap;

use axum::Json;
use serde_json::{json, Value};

use autoblog_core::{Sort, SortOrder};

use crate::error::{ApiError, ValidationErrors};

/// Query-string parameters as received.
pub type Params = HashMap<String, String>;

/// Sorting and paging parsed from `sort_by`, `sort_order`, `limit`, `offset`.
#[derive(Debug, Clone, PartialEq)]
pub struct ListParams {
    pub sort: Sort,
    pub offset: usize,
    pub limit: usize,
}

impl ListParams {
    pub fn parse(params: &Params, default_sort: Sort) -> Result<Self, ApiError> {
        let mut errors = ValidationErrors::new();

        let field = non_empty(params, "sort_by")
            .map(str::to_string)
            .unwrap_or(default_sort.field);
        let order = match non_empty(params, "sort_order") {
            None => default_sort.order,
            Some(raw) => raw.to_ascii_lowercase().parse::<SortOrder>().unwrap_or_else(|_| {
                errors.add("sort_order", "The sort_order field must be asc or desc.");
                default_sort.order
            }),
        };

        let mut number = |name: &str, default: usize| match non_empty(params, name) {
            None => default,
            Some(raw) => raw.parse::<usize>().unwrap_or_else(|_| {
                errors.add(
                    name,
                    format!("The {} field must be a non-negative integer.", name),
                );
                default
            }),
        };
        let limit = number("limit", autoblog_core::defaults::PAGE_LIMIT);
        let offset = number("offset", autoblog_core::defaults::PAGE_OFFSET);

        errors.into_result()?;
        Ok(Self {
            sort: Sort::new(field, order),
            offset,
            limit,
        })
    }
}

/// A query parameter, treating empty strings as absent.
pub fn non_empty<'a>(params: &'a Params, name: &str) -> Option<&'a str> {
    params
        .get(name)
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
}

/// A query parameter that must be present.
pub fn required_param<'a>(params: &'a Params, name: &str) -> Result<&'a str, ApiError> {
    non_empty(params, name).ok_or_else(|| {
        ApiError::Validation(ValidationErrors::single(
            name,
            format!("The {} field is required.", name),
        ))
    })
}

/// Liveness probe.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
