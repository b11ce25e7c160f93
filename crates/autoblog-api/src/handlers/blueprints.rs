//! Blueprint HTTP handlers.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use tracing::info;

use autoblog_core::defaults::SCHEMA_SORT_FIELD;
use autoblog_core::{Blueprint, BlueprintUpdate, Error, EventKind, FieldDefinition, NewBlueprint, Sort};

use super::{ListParams, Params};
use crate::error::{ApiError, ValidationErrors};
use crate::validation::{parse_object, Validator};
use crate::views::{message, BlueprintDetail, SchemaSummary};
use crate::AppState;

const DUPLICATE_HANDLE: &str = "A blueprint with this handle already exists.";

async fn require_blueprint(state: &AppState, handle: &str) -> Result<Blueprint, ApiError> {
    state
        .store
        .find_blueprint(handle)
        .await
        .map_err(|e| ApiError::failed("Failed to load blueprint.", "BLUEPRINT_LOOKUP_FAILED", e))?
        .ok_or_else(ApiError::blueprint_not_found)
}

/// Decode `fields` items, reporting malformed ones as `fields.<i>`.
fn parse_fields(v: &mut Validator<'_>, items: Vec<Value>) -> Vec<FieldDefinition> {
    let mut fields = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<FieldDefinition>(item) {
            Ok(field) if !field.handle.trim().is_empty() => fields.push(field),
            _ => v.reject(
                &format!("fields.{}", index),
                format!(
                    "The fields.{} field must be an object with a handle and a field map.",
                    index
                ),
            ),
        }
    }
    fields
}

pub async fn list_blueprints(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<Json<Vec<SchemaSummary>>, ApiError> {
    let list = ListParams::parse(&params, Sort::asc(SCHEMA_SORT_FIELD))?;
    let blueprints = state
        .store
        .list_blueprints(&list.sort)
        .await
        .map_err(|e| ApiError::failed("Failed to list blueprints.", "BLUEPRINT_LIST_FAILED", e))?;
    Ok(Json(
        blueprints
            .iter()
            .skip(list.offset)
            .take(list.limit)
            .map(SchemaSummary::from)
            .collect(),
    ))
}

pub async fn show_blueprint(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let blueprint = require_blueprint(&state, &handle).await?;
    Ok(Json(json!(BlueprintDetail::from(&blueprint))))
}

/// Create a blueprint. Requires a unique `handle`, a `title` and a `fields` array.
pub async fn store_blueprint(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let input = parse_object(&body)?;
    let mut v = Validator::new(&input);
    let handle = v.required_string("handle");
    let title = v.required_string("title");
    let fields = v
        .required_array("fields")
        .map(|items| parse_fields(&mut v, items));

    if let Some(handle) = &handle {
        let exists = state
            .store
            .find_blueprint(handle)
            .await
            .map_err(|e| ApiError::failed("Failed to create blueprint.", "BLUEPRINT_CREATION_FAILED", e))?
            .is_some();
        if exists {
            v.reject("handle", DUPLICATE_HANDLE);
        }
    }
    v.finish()?;
    let (Some(handle), Some(title), Some(fields)) = (handle, title, fields) else {
        return Err(ApiError::Validation(ValidationErrors::new()));
    };

    let blueprint = state
        .store
        .create_blueprint(NewBlueprint {
            handle,
            title,
            fields,
        })
        .await
        .map_err(|e| match e {
            Error::Conflict(_) => {
                ApiError::Validation(ValidationErrors::single("handle", DUPLICATE_HANDLE))
            }
            other => ApiError::failed(
                "Failed to create blueprint.",
                "BLUEPRINT_CREATION_FAILED",
                other,
            ),
        })?;

    state.notifier.dispatch(
        EventKind::BlueprintCreated,
        json!({"handle": blueprint.handle, "title": blueprint.title}),
    );
    info!(blueprint = %blueprint.handle, "Blueprint created");

    Ok((
        StatusCode::CREATED,
        Json(message("Blueprint created successfully.")),
    ))
}

/// Update a blueprint's `title` and/or replace its `fields`.
pub async fn update_blueprint(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let input = parse_object(&body)?;
    let mut v = Validator::new(&input);
    let title = v.sometimes_string("title");
    let fields = v
        .optional_array("fields")
        .map(|items| parse_fields(&mut v, items));
    v.finish()?;

    require_blueprint(&state, &handle).await?;

    let blueprint = state
        .store
        .update_blueprint(&handle, BlueprintUpdate { title, fields })
        .await
        .map_err(|e| match e {
            Error::NotFound(_) => ApiError::blueprint_not_found(),
            other => ApiError::failed(
                "Failed to update blueprint.",
                "BLUEPRINT_UPDATE_FAILED",
                other,
            ),
        })?;

    state.notifier.dispatch(
        EventKind::BlueprintUpdated,
        json!({"handle": blueprint.handle, "title": blueprint.title}),
    );
    info!(blueprint = %blueprint.handle, "Blueprint updated");

    Ok(Json(message("Blueprint updated successfully.")))
}

pub async fn delete_blueprint(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<StatusCode, ApiError> {
    require_blueprint(&state, &handle).await?;

    let blueprint = state
        .store
        .delete_blueprint(&handle)
        .await
        .map_err(|e| match e {
            Error::NotFound(_) => ApiError::blueprint_not_found(),
            other => ApiError::failed(
                "Failed to delete blueprint.",
                "BLUEPRINT_DELETION_FAILED",
                other,
            ),
        })?;

    state
        .notifier
        .dispatch(EventKind::BlueprintDeleted, json!({"handle": blueprint.handle}));
    info!(blueprint = %blueprint.handle, "Blueprint deleted");

    Ok(StatusCode::NO_CONTENT)
}
