//! Content records owned by the content store.
//!
//! These mirror the CMS vocabulary: collections group entries and carry a
//! route pattern, blueprints describe entry fields, and asset containers hold
//! uploaded files.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::Error;

/// Free-form field data attached to entries and assets.
pub type DataMap = Map<String, Value>;

// =============================================================================
// COLLECTIONS
// =============================================================================

/// A named grouping of entries sharing a route pattern.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Collection {
    pub handle: String,
    pub title: String,
    /// Route pattern, e.g. `{parent}/{slug}`. Entries have no URL without one.
    pub route: Option<String>,
    /// Optional tree structure definition, passed through untouched.
    pub structure: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Collection {
    /// Resolve the site-relative path of an entry in this collection.
    pub fn entry_path(&self, slug: &str) -> Option<String> {
        self.route.as_deref().map(|route| render_route(route, slug))
    }
}

/// Render a route pattern for a top-level entry.
///
/// `{slug}` is substituted; `{parent}` and any other placeholder resolve to
/// nothing since entries here are not nested. Empty segments are collapsed.
pub fn render_route(route: &str, slug: &str) -> String {
    let segments: Vec<String> = route
        .split('/')
        .filter_map(|segment| {
            let rendered = if segment == "{slug}" {
                slug.to_string()
            } else if segment.starts_with('{') && segment.ends_with('}') {
                String::new()
            } else {
                segment.replace("{slug}", slug)
            };
            (!rendered.is_empty()).then_some(rendered)
        })
        .collect();
    format!("/{}", segments.join("/"))
}

/// Request for creating a collection.
#[derive(Debug, Clone)]
pub struct NewCollection {
    pub handle: String,
    pub title: String,
    pub route: Option<String>,
}

/// Partial collection update.
#[derive(Debug, Clone, Default)]
pub struct CollectionUpdate {
    pub title: Option<String>,
    pub route: Option<String>,
}

// =============================================================================
// BLUEPRINTS
// =============================================================================

/// One field of a blueprint: a handle plus its field configuration
/// (`type`, `display`, `required`, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldDefinition {
    pub handle: String,
    #[serde(default)]
    pub field: Map<String, Value>,
}

impl FieldDefinition {
    pub fn new(handle: impl Into<String>, field_type: &str, display: &str) -> Self {
        let mut field = Map::new();
        field.insert("type".to_string(), Value::from(field_type));
        field.insert("display".to_string(), Value::from(display));
        Self {
            handle: handle.into(),
            field,
        }
    }

    pub fn required(mut self) -> Self {
        self.field.insert("required".to_string(), Value::Bool(true));
        self
    }

    pub fn field_type(&self) -> Option<&str> {
        self.field.get("type").and_then(Value::as_str)
    }

    pub fn is_required(&self) -> bool {
        self.field
            .get("required")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// A field-schema definition assigned to entries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Blueprint {
    pub handle: String,
    pub title: String,
    pub fields: Vec<FieldDefinition>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request for creating a blueprint.
#[derive(Debug, Clone)]
pub struct NewBlueprint {
    pub handle: String,
    pub title: String,
    pub fields: Vec<FieldDefinition>,
}

/// Partial blueprint update.
#[derive(Debug, Clone, Default)]
pub struct BlueprintUpdate {
    pub title: Option<String>,
    pub fields: Option<Vec<FieldDefinition>>,
}

// =============================================================================
// ENTRIES
// =============================================================================

/// A single content record belonging to a collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entry {
    pub id: Uuid,
    pub collection: String,
    pub blueprint: String,
    pub slug: String,
    pub published: bool,
    /// Field values, including `title`.
    pub data: DataMap,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entry {
    pub fn title(&self) -> Option<&str> {
        self.data.get("title").and_then(Value::as_str)
    }
}

/// Request for creating an entry.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub collection: String,
    pub blueprint: String,
    pub slug: String,
    pub published: bool,
    pub data: DataMap,
}

/// Partial entry update. `data` is merged over the existing field values.
#[derive(Debug, Clone, Default)]
pub struct EntryUpdate {
    pub title: Option<String>,
    pub blueprint: Option<String>,
    pub data: Option<DataMap>,
}

// =============================================================================
// ASSETS
// =============================================================================

/// A named storage location for assets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetContainer {
    pub handle: String,
    pub title: String,
    pub disk: String,
}

/// A stored file plus its editable metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Asset {
    pub container: String,
    pub path: String,
    pub title: Option<String>,
    pub data: DataMap,
    pub size: u64,
    pub mime_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Asset {
    /// Asset identifier in `container::path` form.
    pub fn id(&self) -> String {
        format!("{}::{}", self.container, self.path)
    }

    /// Display title, falling back to the file name.
    pub fn display_title(&self) -> String {
        self.title.clone().unwrap_or_else(|| {
            self.path
                .rsplit('/')
                .next()
                .unwrap_or(&self.path)
                .to_string()
        })
    }
}

/// Request for storing a new asset.
#[derive(Debug, Clone)]
pub struct NewAsset {
    pub container: String,
    pub path: String,
    pub contents: Vec<u8>,
    pub mime_type: Option<String>,
}

/// Partial asset metadata update. `data` is merged.
#[derive(Debug, Clone, Default)]
pub struct AssetUpdate {
    pub title: Option<String>,
    pub data: Option<DataMap>,
}

// =============================================================================
// QUERIES
// =============================================================================

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(Error::InvalidInput(format!(
                "sort order must be 'asc' or 'desc', got '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => f.write_str("asc"),
            SortOrder::Desc => f.write_str("desc"),
        }
    }
}

/// Field plus direction to order results by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub order: SortOrder,
}

impl Sort {
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortOrder::Asc)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortOrder::Desc)
    }
}

/// Entry listing request.
#[derive(Debug, Clone)]
pub struct EntryQuery {
    pub collection: Option<String>,
    pub blueprint: Option<String>,
    pub published: Option<bool>,
    /// Exact-match filters on data fields (`data[author]=Jane`).
    pub data: Vec<(String, String)>,
    pub sort: Sort,
    pub offset: usize,
    pub limit: usize,
}

impl Default for EntryQuery {
    fn default() -> Self {
        Self {
            collection: None,
            blueprint: None,
            published: None,
            data: Vec::new(),
            sort: Sort::desc(crate::defaults::ENTRY_SORT_FIELD),
            offset: crate::defaults::PAGE_OFFSET,
            limit: crate::defaults::PAGE_LIMIT,
        }
    }
}

/// Asset listing request.
#[derive(Debug, Clone)]
pub struct AssetQuery {
    pub container: Option<String>,
    pub sort: Sort,
    pub offset: usize,
    pub limit: usize,
}

impl Default for AssetQuery {
    fn default() -> Self {
        Self {
            container: None,
            sort: Sort::desc(crate::defaults::ASSET_SORT_FIELD),
            offset: crate::defaults::PAGE_OFFSET,
            limit: crate::defaults::PAGE_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_route_drops_parent_placeholder() {
        assert_eq!(render_route("{parent}/{slug}", "about"), "/about");
    }

    #[test]
    fn test_render_route_keeps_literal_segments() {
        assert_eq!(render_route("blog/{slug}", "hello-world"), "/blog/hello-world");
        assert_eq!(render_route("/news/{slug}/", "launch"), "/news/launch");
    }

    #[test]
    fn test_collection_without_route_has_no_entry_path() {
        let now = Utc::now();
        let collection = Collection {
            handle: "drafts".into(),
            title: "Drafts".into(),
            route: None,
            structure: None,
            created_at: now,
            updated_at: now,
        };
        assert!(collection.entry_path("x").is_none());
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("ASC".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("sideways".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_field_definition_builder() {
        let field = FieldDefinition::new("title", "text", "Title").required();
        assert_eq!(field.field_type(), Some("text"));
        assert!(field.is_required());

        let content = FieldDefinition::new("content", "markdown", "Content");
        assert!(!content.is_required());
    }

    #[test]
    fn test_field_definition_deserializes_without_config() {
        let field: FieldDefinition = serde_json::from_str(r#"{"handle":"body"}"#).unwrap();
        assert_eq!(field.handle, "body");
        assert!(field.field.is_empty());
    }

    #[test]
    fn test_asset_id_and_title_fallback() {
        let now = Utc::now();
        let asset = Asset {
            container: "assets".into(),
            path: "images/logo.png".into(),
            title: None,
            data: DataMap::new(),
            size: 3,
            mime_type: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(asset.id(), "assets::images/logo.png");
        assert_eq!(asset.display_title(), "logo.png");
    }
}
