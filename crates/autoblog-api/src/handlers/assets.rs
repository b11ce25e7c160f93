//! Asset HTTP handlers.
//!
//! Assets are addressed by `(container, path)`; the path may contain `/`.

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use autoblog_core::defaults::ASSET_SORT_FIELD;
use autoblog_core::{Asset, AssetContainer, AssetQuery, AssetUpdate, Error, EventKind, NewAsset, Sort};

use super::{non_empty, ListParams, Params};
use crate::error::{ApiError, ValidationErrors};
use crate::validation::{parse_object, Validator};
use crate::views::{asset_url, message_with_url, AssetView};
use crate::AppState;

async fn require_container(state: &AppState, handle: &str) -> Result<AssetContainer, ApiError> {
    state
        .store
        .find_container(handle)
        .await
        .map_err(|e| ApiError::failed("Failed to load asset container.", "ASSET_CONTAINER_LOOKUP_FAILED", e))?
        .ok_or_else(ApiError::container_not_found)
}

async fn require_asset(state: &AppState, container: &str, path: &str) -> Result<Asset, ApiError> {
    require_container(state, container).await?;
    state
        .store
        .find_asset(container, path)
        .await
        .map_err(|e| ApiError::failed("Failed to load asset.", "ASSET_LOOKUP_FAILED", e))?
        .ok_or_else(ApiError::asset_not_found)
}

fn asset_event_payload(asset: &Asset, url: &str) -> Value {
    json!({
        "id": asset.id(),
        "container": asset.container,
        "path": asset.path,
        "url": url,
    })
}

/// Storage path for an upload: a fresh unique name keeping the extension.
fn unique_path(original_name: Option<&str>) -> String {
    let stem = Uuid::new_v4().simple().to_string();
    match original_name.and_then(extension_of) {
        Some(ext) => format!("{}.{}", stem, ext),
        None => stem,
    }
}

fn extension_of(name: &str) -> Option<&str> {
    let file = name.rsplit('/').next()?;
    let (base, ext) = file.rsplit_once('.')?;
    (!base.is_empty() && !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .then_some(ext)
}

/// Last non-empty path segment of a URL, if any.
fn url_basename(url: &reqwest::Url) -> Option<String> {
    url.path_segments()?
        .filter(|s| !s.is_empty())
        .last()
        .map(str::to_string)
}

/// List assets.
///
/// # Query Parameters
/// - `container`: restrict to one container (404 when unknown)
/// - `sort_by` (default `updated_at`), `sort_order` (default `desc`)
/// - `limit` (default 100), `offset` (default 0)
pub async fn list_assets(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<Json<Vec<AssetView>>, ApiError> {
    let list = ListParams::parse(&params, Sort::desc(ASSET_SORT_FIELD))?;

    let container = match non_empty(&params, "container") {
        Some(handle) => Some(require_container(&state, handle).await?.handle),
        None => None,
    };

    let query = AssetQuery {
        container,
        sort: list.sort,
        offset: list.offset,
        limit: list.limit,
    };
    let assets = state
        .store
        .query_assets(&query)
        .await
        .map_err(|e| ApiError::failed("Failed to list assets.", "ASSET_LIST_FAILED", e))?;

    let site_url = &state.settings.site_url;
    Ok(Json(
        assets
            .iter()
            .map(|asset| AssetView::new(asset, site_url))
            .collect(),
    ))
}

pub async fn show_asset(
    State(state): State<AppState>,
    Path((container, path)): Path<(String, String)>,
) -> Result<Json<AssetView>, ApiError> {
    let asset = require_asset(&state, &container, &path).await?;
    Ok(Json(AssetView::new(&asset, &state.settings.site_url)))
}

/// Upload a file via multipart form (`container`, `file`).
pub async fn store_asset(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        ApiError::Validation(ValidationErrors::single(
            "file",
            format!("The request must be multipart/form-data: {}", e),
        ))
    })?;

    let mut container: Option<String> = None;
    let mut file: Option<(Option<String>, Option<String>, Bytes)> = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return Err(ApiError::Validation(ValidationErrors::single(
                    "file",
                    format!("The upload could not be read: {}", e),
                )))
            }
        };
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("container") => {
                let value = field.text().await.map_err(|e| {
                    ApiError::Validation(ValidationErrors::single(
                        "container",
                        format!("The container field could not be read: {}", e),
                    ))
                })?;
                container = Some(value.trim().to_string()).filter(|v| !v.is_empty());
            }
            Some("file") => {
                let file_name = field.file_name().map(str::to_string);
                let mime_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(|e| {
                    ApiError::Validation(ValidationErrors::single(
                        "file",
                        format!("The file field could not be read: {}", e),
                    ))
                })?;
                file = Some((file_name, mime_type, bytes));
            }
            _ => {}
        }
    }

    let mut errors = ValidationErrors::new();
    if container.is_none() {
        errors.add("container", "The container field is required.");
    }
    if file.is_none() {
        errors.add("file", "The file field is required.");
    }
    errors.into_result()?;
    let (Some(container), Some((file_name, mime_type, bytes))) = (container, file) else {
        return Err(ApiError::Validation(ValidationErrors::new()));
    };

    require_container(&state, &container).await?;

    let asset = state
        .store
        .create_asset(NewAsset {
            container,
            path: unique_path(file_name.as_deref()),
            contents: bytes.to_vec(),
            mime_type,
        })
        .await
        .map_err(|e| match e {
            Error::NotFound(_) => ApiError::container_not_found(),
            other => ApiError::failed("Failed to upload asset.", "ASSET_UPLOAD_FAILED", other),
        })?;

    let url = asset_url(&state.settings.site_url, &asset);
    state
        .notifier
        .dispatch(EventKind::AssetCreated, asset_event_payload(&asset, &url));
    info!(container = %asset.container, path = %asset.path, size = asset.size, "Asset uploaded");

    Ok((
        StatusCode::CREATED,
        Json(message_with_url("Asset uploaded successfully.", Some(&url))),
    ))
}

/// Download a remote file into a container.
///
/// Body: `{container, url, filename?}`. Without `filename`, the last path
/// segment of `url` is used.
pub async fn store_asset_from_url(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let input = parse_object(&body)?;
    let mut v = Validator::new(&input);
    let container = v.required_string("container");
    let url = v.required_url("url");
    let filename = v
        .optional_string("filename")
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty());
    v.finish()?;
    let (Some(container), Some(url)) = (container, url) else {
        return Err(ApiError::Validation(ValidationErrors::new()));
    };

    require_container(&state, &container).await?;

    let fetch_failed = || ApiError::failed_bare("Failed to fetch asset from URL.", "ASSET_FETCH_FAILED");
    let mut response = state.http.get(url.clone()).send().await.map_err(|e| {
        warn!(url = %url, error = %e, "Remote asset fetch failed");
        fetch_failed()
    })?;
    if !response.status().is_success() {
        warn!(url = %url, status = response.status().as_u16(), "Remote asset fetch returned an error status");
        return Err(fetch_failed());
    }
    let mime_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let limit = state.settings.max_upload_bytes;
    if let Some(length) = response.content_length() {
        if length > limit as u64 {
            warn!(url = %url, length, limit, "Remote asset exceeds the upload limit");
            return Err(fetch_failed());
        }
    }
    let mut contents = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(|e| {
        warn!(url = %url, error = %e, "Remote asset body could not be read");
        fetch_failed()
    })? {
        if contents.len() + chunk.len() > limit {
            warn!(url = %url, limit, "Remote asset exceeds the upload limit");
            return Err(fetch_failed());
        }
        contents.extend_from_slice(&chunk);
    }

    let path = filename
        .or_else(|| url_basename(&url))
        .unwrap_or_else(|| unique_path(None));

    let asset = state
        .store
        .create_asset(NewAsset {
            container,
            path,
            contents,
            mime_type,
        })
        .await
        .map_err(|e| match e {
            Error::NotFound(_) => ApiError::container_not_found(),
            other => ApiError::failed(
                "Failed to upload asset from URL.",
                "ASSET_UPLOAD_FROM_URL_FAILED",
                other,
            ),
        })?;

    let asset_link = asset_url(&state.settings.site_url, &asset);
    let mut payload = asset_event_payload(&asset, &asset_link);
    payload["source_url"] = json!(url.as_str());
    state
        .notifier
        .dispatch(EventKind::AssetCreatedFromUrl, payload);
    info!(container = %asset.container, path = %asset.path, source = %url, "Asset uploaded from URL");

    Ok((
        StatusCode::CREATED,
        Json(message_with_url(
            "Asset uploaded successfully from URL.",
            Some(&asset_link),
        )),
    ))
}

/// Update an asset's `title` and merge `data`.
pub async fn update_asset(
    State(state): State<AppState>,
    Path((container, path)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let input = parse_object(&body)?;
    let mut v = Validator::new(&input);
    let title = v.optional_string("title");
    let data = v.optional_object("data");
    v.finish()?;

    require_asset(&state, &container, &path).await?;

    let asset = state
        .store
        .update_asset(&container, &path, AssetUpdate { title, data })
        .await
        .map_err(|e| match e {
            Error::NotFound(_) => ApiError::asset_not_found(),
            other => ApiError::failed("Failed to update asset.", "ASSET_UPDATE_FAILED", other),
        })?;

    let url = asset_url(&state.settings.site_url, &asset);
    state
        .notifier
        .dispatch(EventKind::AssetUpdated, asset_event_payload(&asset, &url));
    info!(container = %asset.container, path = %asset.path, "Asset updated");

    Ok(Json(message_with_url("Asset updated successfully.", Some(&url))))
}

pub async fn delete_asset(
    State(state): State<AppState>,
    Path((container, path)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    require_asset(&state, &container, &path).await?;

    let asset = state
        .store
        .delete_asset(&container, &path)
        .await
        .map_err(|e| match e {
            Error::NotFound(_) => ApiError::asset_not_found(),
            other => ApiError::failed("Failed to delete asset.", "ASSET_DELETION_FAILED", other),
        })?;

    state.notifier.dispatch(
        EventKind::AssetDeleted,
        json!({"id": asset.id(), "container": asset.container, "path": asset.path}),
    );
    info!(container = %asset.container, path = %asset.path, "Asset deleted");

    Ok(StatusCode::NO_CONTENT)
}
