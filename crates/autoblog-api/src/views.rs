//! JSON representations returned by the handlers.

use serde::Serialize;
use serde_json::{json, Value};

use autoblog_core::{Asset, Blueprint, Collection, DataMap, Entry, FieldDefinition};

/// Absolute URL of an entry, or `None` when its collection has no route.
pub fn entry_url(site_url: &str, collection: Option<&Collection>, slug: &str) -> Option<String> {
    let path = collection?.entry_path(slug)?;
    Some(format!("{}{}", site_url, path))
}

/// Absolute URL of an asset: `<site>/assets/<container>/<path>`.
pub fn asset_url(site_url: &str, asset: &Asset) -> String {
    format!("{}/assets/{}/{}", site_url, asset.container, asset.path)
}

#[derive(Debug, Serialize)]
pub struct EntryView {
    pub id: String,
    pub collection: String,
    pub blueprint: String,
    pub title: Option<String>,
    pub slug: String,
    pub url: Option<String>,
    pub data: DataMap,
}

impl EntryView {
    pub fn new(entry: &Entry, url: Option<String>) -> Self {
        Self {
            id: entry.id.to_string(),
            collection: entry.collection.clone(),
            blueprint: entry.blueprint.clone(),
            title: entry.title().map(str::to_string),
            slug: entry.slug.clone(),
            url,
            data: entry.data.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AssetView {
    pub id: String,
    pub container: String,
    pub path: String,
    pub url: String,
    pub title: String,
    pub data: DataMap,
}

impl AssetView {
    pub fn new(asset: &Asset, site_url: &str) -> Self {
        Self {
            id: asset.id(),
            container: asset.container.clone(),
            path: asset.path.clone(),
            url: asset_url(site_url, asset),
            title: asset.display_title(),
            data: asset.data.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SchemaSummary {
    pub handle: String,
    pub title: String,
}

impl From<&Collection> for SchemaSummary {
    fn from(c: &Collection) -> Self {
        Self {
            handle: c.handle.clone(),
            title: c.title.clone(),
        }
    }
}

impl From<&Blueprint> for SchemaSummary {
    fn from(b: &Blueprint) -> Self {
        Self {
            handle: b.handle.clone(),
            title: b.title.clone(),
        }
    }
}

/// Collection detail: structure and routes default to empty arrays.
pub fn collection_detail(collection: &Collection) -> Value {
    json!({
        "handle": collection.handle,
        "title": collection.title,
        "structure": collection.structure.clone().unwrap_or_else(|| json!([])),
        "routes": collection
            .route
            .as_ref()
            .map(|r| json!([r]))
            .unwrap_or_else(|| json!([])),
    })
}

#[derive(Debug, Serialize)]
pub struct BlueprintDetail<'a> {
    pub handle: &'a str,
    pub title: &'a str,
    pub fields: &'a [FieldDefinition],
}

impl<'a> From<&'a Blueprint> for BlueprintDetail<'a> {
    fn from(b: &'a Blueprint) -> Self {
        Self {
            handle: &b.handle,
            title: &b.title,
            fields: &b.fields,
        }
    }
}

/// `{message}` success body.
pub fn message(text: &str) -> Value {
    json!({ "message": text })
}

/// `{message, url}` success body; `url` is `null` for unrouted entries.
pub fn message_with_url(text: &str, url: Option<&str>) -> Value {
    json!({ "message": text, "url": url })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn collection(route: Option<&str>) -> Collection {
        Collection {
            handle: "pages".into(),
            title: "Pages".into(),
            route: route.map(str::to_string),
            structure: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_entry_url() {
        let pages = collection(Some("{parent}/{slug}"));
        assert_eq!(
            entry_url("https://site.test", Some(&pages), "about").as_deref(),
            Some("https://site.test/about")
        );
        assert_eq!(entry_url("https://site.test", Some(&collection(None)), "about"), None);
        assert_eq!(entry_url("https://site.test", None, "about"), None);
    }

    #[test]
    fn test_collection_detail_defaults() {
        let detail = collection_detail(&collection(None));
        assert_eq!(detail["structure"], json!([]));
        assert_eq!(detail["routes"], json!([]));
    }
}
