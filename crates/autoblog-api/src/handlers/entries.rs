//! Entry HTTP handlers.
//!
//! Entries are addressed by `(collection, slug)`; `collection` comes from the
//! query string (or, for updates, the body).

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use autoblog_core::defaults::ENTRY_SORT_FIELD;
use autoblog_core::{
    Collection, ContentStore, Entry, EntryQuery, EntryUpdate, Error, EventKind, NewEntry, Sort,
};
use autoblog_store::parse_bool;

use super::{non_empty, required_param, ListParams, Params};
use crate::error::{ApiError, ValidationErrors};
use crate::validation::{parse_object, Validator};
use crate::views::{entry_url, message_with_url, EntryView};
use crate::AppState;

/// Validated input for creating one entry.
#[derive(Debug, Clone)]
struct EntryInput {
    collection: String,
    blueprint: String,
    title: String,
    slug: String,
    data: Map<String, Value>,
}

impl EntryInput {
    /// Extract every field so all problems are reported together.
    fn extract(v: &mut Validator<'_>) -> Option<Self> {
        let collection = v.required_string("collection");
        let blueprint = v.required_string("blueprint");
        let title = v.required_string("title");
        let slug = v.required_string("slug");
        let data = v.optional_object("data");
        Some(Self {
            collection: collection?,
            blueprint: blueprint?,
            title: title?,
            slug: slug?,
            data: data.unwrap_or_default(),
        })
    }

    /// `title` first, then caller data (which may override it).
    fn into_new_entry(self) -> NewEntry {
        let mut data = Map::new();
        data.insert("title".to_string(), Value::String(self.title));
        data.extend(self.data);
        NewEntry {
            collection: self.collection,
            blueprint: self.blueprint,
            slug: self.slug,
            published: true,
            data,
        }
    }
}

fn entry_event_payload(entry: &Entry, url: Option<&str>) -> Value {
    json!({
        "id": entry.id.to_string(),
        "collection": entry.collection,
        "slug": entry.slug,
        "url": url,
    })
}

async fn require_collection(state: &AppState, handle: &str) -> Result<Collection, ApiError> {
    state
        .store
        .find_collection(handle)
        .await
        .map_err(|e| ApiError::failed("Failed to load collection.", "COLLECTION_LOOKUP_FAILED", e))?
        .ok_or_else(ApiError::collection_not_found)
}

async fn require_entry(
    store: &dyn ContentStore,
    collection: &str,
    slug: &str,
) -> Result<Entry, ApiError> {
    store
        .find_entry(collection, slug)
        .await
        .map_err(|e| ApiError::failed("Failed to load entry.", "ENTRY_LOOKUP_FAILED", e))?
        .ok_or_else(ApiError::entry_not_found)
}

/// List entries.
///
/// # Query Parameters
/// - `collection`, `blueprint`, `published`: filters
/// - `data[<field>]=<value>`: exact match on a data field
/// - `sort_by` (default `updated_at`), `sort_order` (default `desc`)
/// - `limit` (default 100), `offset` (default 0)
pub async fn list_entries(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<Json<Vec<EntryView>>, ApiError> {
    let list = ListParams::parse(&params, Sort::desc(ENTRY_SORT_FIELD))?;

    let collection = match non_empty(&params, "collection") {
        Some(handle) => Some(require_collection(&state, handle).await?.handle),
        None => None,
    };

    let published = match non_empty(&params, "published") {
        None => None,
        Some(raw) => Some(parse_bool(raw).ok_or_else(|| {
            ApiError::Validation(ValidationErrors::single(
                "published",
                "The published field must be true or false.",
            ))
        })?),
    };

    let mut data: Vec<(String, String)> = params
        .iter()
        .filter_map(|(key, value)| {
            let field = key.strip_prefix("data[")?.strip_suffix(']')?;
            (!field.is_empty()).then(|| (field.to_string(), value.clone()))
        })
        .collect();
    data.sort();

    let query = EntryQuery {
        collection,
        blueprint: non_empty(&params, "blueprint").map(str::to_string),
        published,
        data,
        sort: list.sort,
        offset: list.offset,
        limit: list.limit,
    };

    let entries = state
        .store
        .query_entries(&query)
        .await
        .map_err(|e| ApiError::failed("Failed to list entries.", "ENTRY_LIST_FAILED", e))?;

    let mut routes: HashMap<String, Option<Collection>> = HashMap::new();
    let mut views = Vec::with_capacity(entries.len());
    for entry in &entries {
        if !routes.contains_key(&entry.collection) {
            let found = match state.store.find_collection(&entry.collection).await {
                Ok(found) => found,
                Err(e) => {
                    warn!(
                        collection = %entry.collection,
                        error = %e,
                        "Collection lookup failed, listing entry without a URL"
                    );
                    None
                }
            };
            routes.insert(entry.collection.clone(), found);
        }
        let collection = routes.get(&entry.collection).and_then(Option::as_ref);
        let url = entry_url(&state.settings.site_url, collection, &entry.slug);
        views.push(EntryView::new(entry, url));
    }

    debug!(result_count = views.len(), "Listed entries");
    Ok(Json(views))
}

/// Show one entry. Requires `?collection=`.
pub async fn show_entry(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<Params>,
) -> Result<Json<EntryView>, ApiError> {
    let handle = required_param(&params, "collection")?;
    let collection = require_collection(&state, handle).await?;
    let entry = require_entry(state.store.as_ref(), &collection.handle, &slug).await?;
    let url = entry_url(&state.settings.site_url, Some(&collection), &entry.slug);
    Ok(Json(EntryView::new(&entry, url)))
}

/// Create an entry.
///
/// # Returns
/// - 201 `{message, url}`
/// - 404 if the collection does not exist
/// - 422 on missing `collection`, `blueprint`, `title` or `slug`
/// - 500 `ENTRY_CREATION_FAILED` if the store rejects the entry
pub async fn store_entry(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let input = parse_object(&body)?;
    let mut v = Validator::new(&input);
    let entry_input = EntryInput::extract(&mut v);
    v.finish()?;
    let Some(entry_input) = entry_input else {
        return Err(ApiError::Validation(ValidationErrors::new()));
    };

    let collection = require_collection(&state, &entry_input.collection).await?;

    let entry = state
        .store
        .create_entry(entry_input.into_new_entry())
        .await
        .map_err(|e| match e {
            Error::NotFound(_) => ApiError::collection_not_found(),
            other => ApiError::failed("Failed to create entry.", "ENTRY_CREATION_FAILED", other),
        })?;

    let url = entry_url(&state.settings.site_url, Some(&collection), &entry.slug);
    state.notifier.dispatch(
        EventKind::EntryCreated,
        entry_event_payload(&entry, url.as_deref()),
    );
    info!(collection = %entry.collection, slug = %entry.slug, "Entry created");

    Ok((
        StatusCode::CREATED,
        Json(message_with_url("Entry created successfully.", url.as_deref())),
    ))
}

/// Update an entry. `collection` may come from the body or the query string;
/// `data` is merged over the stored fields.
pub async fn update_entry(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<Params>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let input = parse_object(&body)?;
    let mut v = Validator::new(&input);
    let body_collection = v.optional_string("collection").filter(|c| !c.trim().is_empty());
    let title = v.sometimes_string("title");
    let blueprint = v.sometimes_string("blueprint");
    let data = v.optional_object("data");

    let collection_handle = body_collection.or_else(|| non_empty(&params, "collection").map(str::to_string));
    if collection_handle.is_none() {
        v.reject("collection", "The collection field is required.");
    }
    v.finish()?;
    let collection_handle = collection_handle.unwrap_or_default();

    let collection = require_collection(&state, &collection_handle).await?;
    require_entry(state.store.as_ref(), &collection.handle, &slug).await?;

    let entry = state
        .store
        .update_entry(
            &collection.handle,
            &slug,
            EntryUpdate {
                title,
                blueprint,
                data,
            },
        )
        .await
        .map_err(|e| match e {
            Error::NotFound(_) => ApiError::entry_not_found(),
            other => ApiError::failed("Failed to update entry.", "ENTRY_UPDATE_FAILED", other),
        })?;

    let url = entry_url(&state.settings.site_url, Some(&collection), &entry.slug);
    state.notifier.dispatch(
        EventKind::EntryUpdated,
        entry_event_payload(&entry, url.as_deref()),
    );
    info!(collection = %entry.collection, slug = %entry.slug, "Entry updated");

    Ok(Json(message_with_url(
        "Entry updated successfully.",
        url.as_deref(),
    )))
}

/// Delete an entry. Requires `?collection=`; responds 204.
pub async fn delete_entry(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<Params>,
) -> Result<StatusCode, ApiError> {
    let handle = required_param(&params, "collection")?;
    let collection = require_collection(&state, handle).await?;
    require_entry(state.store.as_ref(), &collection.handle, &slug).await?;

    let entry = state
        .store
        .delete_entry(&collection.handle, &slug)
        .await
        .map_err(|e| match e {
            Error::NotFound(_) => ApiError::entry_not_found(),
            other => ApiError::failed("Failed to delete entry.", "ENTRY_DELETION_FAILED", other),
        })?;

    state.notifier.dispatch(
        EventKind::EntryDeleted,
        json!({
            "id": entry.id.to_string(),
            "collection": entry.collection,
            "slug": entry.slug,
        }),
    );
    info!(collection = %entry.collection, slug = %entry.slug, "Entry deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Outcome of one item of a bulk create.
#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BulkItemResult {
    Success {
        slug: String,
        url: Option<String>,
    },
    Failed {
        slug: String,
        error: String,
        code: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
}

/// Create many entries. All items are validated before any is created;
/// afterwards each item succeeds or fails on its own.
pub async fn bulk_store_entries(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Vec<BulkItemResult>>, ApiError> {
    let input = parse_object(&body)?;
    let mut v = Validator::new(&input);
    let items = v.required_array("entries");
    let mut errors = v.into_errors();

    let mut inputs = Vec::new();
    for (index, item) in items.iter().flatten().enumerate() {
        let prefix = format!("entries.{}", index);
        let Some(object) = item.as_object() else {
            errors.add(
                prefix.clone(),
                format!("The {} field must be an object.", prefix),
            );
            continue;
        };
        let mut item_v = Validator::with_prefix(object, prefix);
        let parsed = EntryInput::extract(&mut item_v);
        errors.merge(item_v.into_errors());
        if let Some(parsed) = parsed {
            inputs.push(parsed);
        }
    }
    errors.into_result()?;

    let mut results = Vec::with_capacity(inputs.len());
    for input in inputs {
        results.push(create_bulk_item(&state, input).await);
    }

    let created = results
        .iter()
        .filter(|r| matches!(r, BulkItemResult::Success { .. }))
        .count();
    info!(
        result_count = results.len(),
        created,
        failed = results.len() - created,
        "Bulk entry creation finished"
    );
    Ok(Json(results))
}

async fn create_bulk_item(state: &AppState, input: EntryInput) -> BulkItemResult {
    let slug = input.slug.clone();

    let collection = match state.store.find_collection(&input.collection).await {
        Ok(Some(collection)) => collection,
        Ok(None) | Err(Error::NotFound(_)) => {
            return BulkItemResult::Failed {
                slug,
                error: "Collection not found.".to_string(),
                code: "COLLECTION_NOT_FOUND",
                details: None,
            }
        }
        Err(e) => {
            return BulkItemResult::Failed {
                slug,
                error: "Failed to create entry.".to_string(),
                code: "ENTRY_CREATION_FAILED",
                details: Some(e.to_string()),
            }
        }
    };

    match state.store.create_entry(input.into_new_entry()).await {
        Ok(entry) => {
            let url = entry_url(&state.settings.site_url, Some(&collection), &entry.slug);
            state.notifier.dispatch(
                EventKind::EntryCreated,
                entry_event_payload(&entry, url.as_deref()),
            );
            BulkItemResult::Success {
                slug: entry.slug,
                url,
            }
        }
        Err(Error::NotFound(_)) => BulkItemResult::Failed {
            slug,
            error: "Collection not found.".to_string(),
            code: "COLLECTION_NOT_FOUND",
            details: None,
        },
        Err(e) => BulkItemResult::Failed {
            slug,
            error: "Failed to create entry.".to_string(),
            code: "ENTRY_CREATION_FAILED",
            details: Some(e.to_string()),
        },
    }
}
