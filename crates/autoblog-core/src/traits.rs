//! Core traits for autoblogger collaborators.
//!
//! The HTTP layer and the page generator only ever talk to these traits, so
//! the content store and the language model can be swapped or faked.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// CONTENT STORE
// =============================================================================

/// The content repository: collections, blueprints, entries and assets.
///
/// `find_*` methods return `Ok(None)` for missing records; mutating methods
/// report a missing target as [`crate::Error::NotFound`] and a duplicate
/// identity as [`crate::Error::Conflict`].
#[async_trait]
pub trait ContentStore: Send + Sync {
    // --- collections ---

    async fn find_collection(&self, handle: &str) -> Result<Option<Collection>>;

    async fn list_collections(&self, sort: &Sort) -> Result<Vec<Collection>>;

    async fn create_collection(&self, req: NewCollection) -> Result<Collection>;

    async fn update_collection(&self, handle: &str, update: CollectionUpdate)
        -> Result<Collection>;

    async fn delete_collection(&self, handle: &str) -> Result<Collection>;

    // --- blueprints ---

    async fn find_blueprint(&self, handle: &str) -> Result<Option<Blueprint>>;

    async fn list_blueprints(&self, sort: &Sort) -> Result<Vec<Blueprint>>;

    async fn create_blueprint(&self, req: NewBlueprint) -> Result<Blueprint>;

    async fn update_blueprint(&self, handle: &str, update: BlueprintUpdate) -> Result<Blueprint>;

    async fn delete_blueprint(&self, handle: &str) -> Result<Blueprint>;

    // --- entries ---

    async fn query_entries(&self, query: &EntryQuery) -> Result<Vec<Entry>>;

    async fn find_entry(&self, collection: &str, slug: &str) -> Result<Option<Entry>>;

    async fn create_entry(&self, req: NewEntry) -> Result<Entry>;

    async fn update_entry(&self, collection: &str, slug: &str, update: EntryUpdate)
        -> Result<Entry>;

    async fn delete_entry(&self, collection: &str, slug: &str) -> Result<Entry>;

    // --- assets ---

    async fn find_container(&self, handle: &str) -> Result<Option<AssetContainer>>;

    async fn query_assets(&self, query: &AssetQuery) -> Result<Vec<Asset>>;

    async fn find_asset(&self, container: &str, path: &str) -> Result<Option<Asset>>;

    async fn create_asset(&self, req: NewAsset) -> Result<Asset>;

    async fn update_asset(&self, container: &str, path: &str, update: AssetUpdate)
        -> Result<Asset>;

    async fn delete_asset(&self, container: &str, path: &str) -> Result<Asset>;

    // --- cache ---

    /// Drop any read-through caches so records created by schema-mutating
    /// operations are visible to subsequent reads.
    async fn invalidate_read_cache(&self) -> Result<()>;
}

// =============================================================================
// CHAT
// =============================================================================

/// A language-model chat API.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send a single user prompt and return the assistant's text.
    ///
    /// `model` overrides [`ChatBackend::model_name`] for this call.
    async fn chat(&self, prompt: &str, model: Option<&str>) -> Result<String>;

    /// Default model used when the caller does not pick one.
    fn model_name(&self) -> &str;
}
