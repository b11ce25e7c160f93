//! Collection HTTP handlers.

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
use autoblog_core::{Collection, CollectionUpdate, Error, EventKind, NewCollection, Sort};

use super::{ListParams, Params};
use crate::error::{ApiError, ValidationErrors};
use crate::validation::{parse_object, Validator};
use crate::views::{collection_detail, message, SchemaSummary};
use crate::AppState;

const DUPLICATE_HANDLE: &str = "A collection with this handle already exists.";

async fn require_collection(state: &AppState, handle: &str) -> Result<Collection, ApiError> {
    state
        .store
        .find_collection(handle)
        .await
        .map_err(|e| ApiError::failed("Failed to load collection.", "COLLECTION_LOOKUP_FAILED", e))?
        .ok_or_else(ApiError::collection_not_found)
}

/// List collections, sorted by `title` ascending unless overridden.
pub async fn list_collections(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<Json<Vec<SchemaSummary>>, ApiError> {
    let list = ListParams::parse(&params, Sort::asc(SCHEMA_SORT_FIELD))?;
    let collections = state
        .store
        .list_collections(&list.sort)
        .await
        .map_err(|e| ApiError::failed("Failed to list collections.", "COLLECTION_LIST_FAILED", e))?;
    Ok(Json(
        collections
            .iter()
            .skip(list.offset)
            .take(list.limit)
            .map(SchemaSummary::from)
            .collect(),
    ))
}

pub async fn show_collection(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let collection = require_collection(&state, &handle).await?;
    Ok(Json(collection_detail(&collection)))
}

/// Create a collection. `handle` must be unique.
pub async fn store_collection(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let input = parse_object(&body)?;
    let mut v = Validator::new(&input);
    let handle = v.required_string("handle");
    let title = v.required_string("title");
    let route = v.optional_string("route").filter(|r| !r.trim().is_empty());

    if let Some(handle) = &handle {
        let exists = state
            .store
            .find_collection(handle)
            .await
            .map_err(|e| ApiError::failed("Failed to create collection.", "COLLECTION_CREATION_FAILED", e))?
            .is_some();
        if exists {
            v.reject("handle", DUPLICATE_HANDLE);
        }
    }
    v.finish()?;
    let (Some(handle), Some(title)) = (handle, title) else {
        return Err(ApiError::Validation(ValidationErrors::new()));
    };

    let collection = state
        .store
        .create_collection(NewCollection {
            handle,
            title,
            route,
        })
        .await
        .map_err(|e| match e {
            Error::Conflict(_) => {
                ApiError::Validation(ValidationErrors::single("handle", DUPLICATE_HANDLE))
            }
            other => ApiError::failed(
                "Failed to create collection.",
                "COLLECTION_CREATION_FAILED",
                other,
            ),
        })?;

    state.notifier.dispatch(
        EventKind::CollectionCreated,
        json!({"handle": collection.handle, "title": collection.title}),
    );
    info!(collection = %collection.handle, "Collection created");

    Ok((
        StatusCode::CREATED,
        Json(message("Collection created successfully.")),
    ))
}

/// Update a collection's `title` and/or `route`.
pub async fn update_collection(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let input = parse_object(&body)?;
    let mut v = Validator::new(&input);
    let title = v.sometimes_string("title");
    let route = v.optional_string("route");
    v.finish()?;

    require_collection(&state, &handle).await?;

    let collection = state
        .store
        .update_collection(&handle, CollectionUpdate { title, route })
        .await
        .map_err(|e| match e {
            Error::NotFound(_) => ApiError::collection_not_found(),
            other => ApiError::failed(
                "Failed to update collection.",
                "COLLECTION_UPDATE_FAILED",
                other,
            ),
        })?;

    state.notifier.dispatch(
        EventKind::CollectionUpdated,
        json!({"handle": collection.handle, "title": collection.title}),
    );
    info!(collection = %collection.handle, "Collection updated");

    Ok(Json(message("Collection updated successfully.")))
}

/// Delete a collection and its entries.
pub async fn delete_collection(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<StatusCode, ApiError> {
    require_collection(&state, &handle).await?;

    let collection = state
        .store
        .delete_collection(&handle)
        .await
        .map_err(|e| match e {
            Error::NotFound(_) => ApiError::collection_not_found(),
            other => ApiError::failed(
                "Failed to delete collection.",
                "COLLECTION_DELETION_FAILED",
                other,
            ),
        })?;

    state
        .notifier
        .dispatch(EventKind::CollectionDeleted, json!({"handle": collection.handle}));
    info!(collection = %collection.handle, "Collection deleted");

    Ok(StatusCode::NO_CONTENT)
}
