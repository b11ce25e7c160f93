//! Mutation events handed to the webhook notifier.
//!
//! Every successful create/update/delete against the content store produces
//! exactly one [`MutationEvent`]. Event names are dot-namespaced
//! (`entry.created`, `asset.deleted`, ...).
//!
//! ## Wire Format
//!
//! ```json
//! {"event": "entry.created", "payload": {"id": "...", "collection": "pages", "slug": "about"}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Every mutation the service reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    EntryCreated,
    EntryUpdated,
    EntryDeleted,
    CollectionCreated,
    CollectionUpdated,
    CollectionDeleted,
    BlueprintCreated,
    BlueprintUpdated,
    BlueprintDeleted,
    AssetCreated,
    AssetCreatedFromUrl,
    AssetUpdated,
    AssetDeleted,
}

impl EventKind {
    /// Dot-namespaced event name as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::EntryCreated => "entry.created",
            EventKind::EntryUpdated => "entry.updated",
            EventKind::EntryDeleted => "entry.deleted",
            EventKind::CollectionCreated => "collection.created",
            EventKind::CollectionUpdated => "collection.updated",
            EventKind::CollectionDeleted => "collection.deleted",
            EventKind::BlueprintCreated => "blueprint.created",
            EventKind::BlueprintUpdated => "blueprint.updated",
            EventKind::BlueprintDeleted => "blueprint.deleted",
            EventKind::AssetCreated => "asset.created",
            EventKind::AssetCreatedFromUrl => "asset.created_from_url",
            EventKind::AssetUpdated => "asset.updated",
            EventKind::AssetDeleted => "asset.deleted",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable notification about a committed content mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationEvent {
    pub event: String,
    pub payload: Map<String, Value>,
}

impl MutationEvent {
    /// Build an event from a JSON payload.
    ///
    /// Object payloads are used as-is; any other value is wrapped as
    /// `{"value": ...}` so the payload is always a mapping.
    pub fn new(kind: EventKind, payload: Value) -> Self {
        let payload = match payload {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        Self {
            event: kind.as_str().to_string(),
            payload,
        }
    }
}
