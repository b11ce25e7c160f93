//! In-memory [`ContentStore`] implementation.
//!
//! All records live behind a single `RwLock`, so writes are serialised and a
//! duplicate slug/handle/path is reported as [`Error::Conflict`] instead of
//! racing. Entry listings are memoised in a bounded LRU read cache. Writers
//! clear it before releasing the write lock, and readers fill it before
//! releasing the read lock, so a page computed from an older snapshot can
//! never outlive the write that replaced it.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use lru::LruCache;
use tokio::sync::RwLock;
use tracing::{debug, trace};
use uuid::Uuid;

use autoblog_core::defaults::ENTRY_CACHE_CAPACITY;
use autoblog_core::{
    Asset, AssetContainer, AssetQuery, AssetUpdate, Blueprint, BlueprintUpdate, Collection,
    CollectionUpdate, ContentStore, Entry, EntryQuery, EntryUpdate, Error, NewAsset, NewBlueprint,
    NewCollection, NewEntry, Result, Sort,
};

use crate::query::{
    asset_sort_key, entry_sort_key, paginate, sort_by_key, value_matches, SortKey,
};

#[derive(Default)]
struct StoreState {
    collections: BTreeMap<String, Collection>,
    blueprints: BTreeMap<String, Blueprint>,
    /// Keyed by `(collection, slug)`.
    entries: BTreeMap<(String, String), Entry>,
    containers: BTreeMap<String, AssetContainer>,
    /// Keyed by `(container, path)`.
    assets: BTreeMap<(String, String), StoredAsset>,
}

struct StoredAsset {
    asset: Asset,
    contents: Vec<u8>,
}

/// Counters describing store activity since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreMetrics {
    pub collections_created: u64,
    pub blueprints_created: u64,
    pub entries_created: u64,
    pub assets_created: u64,
    pub cache_invalidations: u64,
}

#[derive(Default)]
struct Counters {
    collections_created: AtomicU64,
    blueprints_created: AtomicU64,
    entries_created: AtomicU64,
    assets_created: AtomicU64,
    cache_invalidations: AtomicU64,
}

/// Content store kept entirely in process memory.
pub struct MemoryContentStore {
    state: RwLock<StoreState>,
    entry_cache: Mutex<LruCache<String, Vec<Entry>>>,
    counters: Counters,
}

impl Default for MemoryContentStore {
    fn default() -> Self {
        Self::with_cache_capacity(ENTRY_CACHE_CAPACITY)
    }
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store whose entry cache holds at most `capacity` listings.
    pub fn with_cache_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            state: RwLock::new(StoreState::default()),
            entry_cache: Mutex::new(LruCache::new(capacity)),
            counters: Counters::default(),
        }
    }

    /// Create a store with the given asset containers registered.
    pub fn with_containers<I, S>(handles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = StoreState::default();
        for handle in handles {
            let handle = handle.into();
            state.containers.insert(
                handle.clone(),
                AssetContainer {
                    title: autoblog_core::title_from_handle(&handle),
                    disk: handle.clone(),
                    handle,
                },
            );
        }
        Self {
            state: RwLock::new(state),
            ..Self::default()
        }
    }

    /// Snapshot of the activity counters.
    pub fn metrics(&self) -> StoreMetrics {
        StoreMetrics {
            collections_created: self.counters.collections_created.load(Ordering::Relaxed),
            blueprints_created: self.counters.blueprints_created.load(Ordering::Relaxed),
            entries_created: self.counters.entries_created.load(Ordering::Relaxed),
            assets_created: self.counters.assets_created.load(Ordering::Relaxed),
            cache_invalidations: self.counters.cache_invalidations.load(Ordering::Relaxed),
        }
    }

    /// Number of entry listings currently cached.
    pub fn cached_listings(&self) -> usize {
        self.entry_cache.lock().map(|cache| cache.len()).unwrap_or(0)
    }

    /// Raw bytes of a stored asset.
    pub async fn asset_contents(&self, container: &str, path: &str) -> Option<Vec<u8>> {
        let state = self.state.read().await;
        state
            .assets
            .get(&(container.to_string(), path.to_string()))
            .map(|stored| stored.contents.clone())
    }

    fn clear_entry_cache(&self) {
        if let Ok(mut cache) = self.entry_cache.lock() {
            cache.clear();
        }
    }

    fn cached_entries(&self, key: &str) -> Option<Vec<Entry>> {
        self.entry_cache
            .lock()
            .ok()
            .and_then(|mut cache| cache.get(key).cloned())
    }

    fn remember_entries(&self, key: String, entries: &[Entry]) {
        if let Ok(mut cache) = self.entry_cache.lock() {
            cache.put(key, entries.to_vec());
        }
    }
}

fn sorted_records<T: Clone, F>(items: impl Iterator<Item = T>, sort: &Sort, key: F) -> Vec<T>
where
    F: Fn(&T, &str) -> SortKey,
{
    let mut items: Vec<T> = items.collect();
    sort_by_key(&mut items, sort, key);
    items
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    // --- collections ---

    async fn find_collection(&self, handle: &str) -> Result<Option<Collection>> {
        Ok(self.state.read().await.collections.get(handle).cloned())
    }

    async fn list_collections(&self, sort: &Sort) -> Result<Vec<Collection>> {
        let state = self.state.read().await;
        Ok(sorted_records(
            state.collections.values().cloned(),
            sort,
            |c: &Collection, field| match field {
                "handle" => SortKey::Text(c.handle.clone()),
                "created_at" => SortKey::Time(c.created_at),
                "updated_at" => SortKey::Time(c.updated_at),
                _ => SortKey::Text(c.title.to_lowercase()),
            },
        ))
    }

    async fn create_collection(&self, req: NewCollection) -> Result<Collection> {
        let mut state = self.state.write().await;
        if state.collections.contains_key(&req.handle) {
            return Err(Error::Conflict(format!(
                "collection '{}' already exists",
                req.handle
            )));
        }
        let now = Utc::now();
        let collection = Collection {
            handle: req.handle.clone(),
            title: req.title,
            route: req.route,
            structure: None,
            created_at: now,
            updated_at: now,
        };
        state.collections.insert(req.handle, collection.clone());
        self.counters
            .collections_created
            .fetch_add(1, Ordering::Relaxed);
        debug!(collection = %collection.handle, "Collection created");
        Ok(collection)
    }

    async fn update_collection(
        &self,
        handle: &str,
        update: CollectionUpdate,
    ) -> Result<Collection> {
        let mut state = self.state.write().await;
        let collection = state
            .collections
            .get_mut(handle)
            .ok_or_else(|| Error::NotFound(format!("collection '{}'", handle)))?;
        if let Some(title) = update.title {
            collection.title = title;
        }
        if let Some(route) = update.route {
            collection.route = Some(route);
        }
        collection.updated_at = Utc::now();
        let updated = collection.clone();
        self.clear_entry_cache();
        Ok(updated)
    }

    async fn delete_collection(&self, handle: &str) -> Result<Collection> {
        let mut state = self.state.write().await;
        let collection = state
            .collections
            .remove(handle)
            .ok_or_else(|| Error::NotFound(format!("collection '{}'", handle)))?;
        let before = state.entries.len();
        state.entries.retain(|(c, _), _| c != handle);
        debug!(
            collection = %handle,
            removed_entries = before - state.entries.len(),
            "Collection deleted"
        );
        self.clear_entry_cache();
        Ok(collection)
    }

    // --- blueprints ---

    async fn find_blueprint(&self, handle: &str) -> Result<Option<Blueprint>> {
        Ok(self.state.read().await.blueprints.get(handle).cloned())
    }

    async fn list_blueprints(&self, sort: &Sort) -> Result<Vec<Blueprint>> {
        let state = self.state.read().await;
        Ok(sorted_records(
            state.blueprints.values().cloned(),
            sort,
            |b: &Blueprint, field| match field {
                "handle" => SortKey::Text(b.handle.clone()),
                "created_at" => SortKey::Time(b.created_at),
                "updated_at" => SortKey::Time(b.updated_at),
                _ => SortKey::Text(b.title.to_lowercase()),
            },
        ))
    }

    async fn create_blueprint(&self, req: NewBlueprint) -> Result<Blueprint> {
        let mut state = self.state.write().await;
        if state.blueprints.contains_key(&req.handle) {
            return Err(Error::Conflict(format!(
                "blueprint '{}' already exists",
                req.handle
            )));
        }
        let now = Utc::now();
        let blueprint = Blueprint {
            handle: req.handle.clone(),
            title: req.title,
            fields: req.fields,
            created_at: now,
            updated_at: now,
        };
        state.blueprints.insert(req.handle, blueprint.clone());
        self.counters
            .blueprints_created
            .fetch_add(1, Ordering::Relaxed);
        debug!(blueprint = %blueprint.handle, "Blueprint created");
        Ok(blueprint)
    }

    async fn update_blueprint(&self, handle: &str, update: BlueprintUpdate) -> Result<Blueprint> {
        let mut state = self.state.write().await;
        let blueprint = state
            .blueprints
            .get_mut(handle)
            .ok_or_else(|| Error::NotFound(format!("blueprint '{}'", handle)))?;
        if let Some(title) = update.title {
            blueprint.title = title;
        }
        if let Some(fields) = update.fields {
            blueprint.fields = fields;
        }
        blueprint.updated_at = Utc::now();
        Ok(blueprint.clone())
    }

    async fn delete_blueprint(&self, handle: &str) -> Result<Blueprint> {
        let mut state = self.state.write().await;
        state
            .blueprints
            .remove(handle)
            .ok_or_else(|| Error::NotFound(format!("blueprint '{}'", handle)))
    }

    // --- entries ---

    async fn query_entries(&self, query: &EntryQuery) -> Result<Vec<Entry>> {
        let key = format!("{:?}", query);
        if let Some(hit) = self.cached_entries(&key) {
            trace!(result_count = hit.len(), "Entry query served from cache");
            return Ok(hit);
        }

        let state = self.state.read().await;
        let mut matched: Vec<Entry> = state
            .entries
            .values()
            .filter(|e| query.collection.as_deref().map_or(true, |c| e.collection == c))
            .filter(|e| query.blueprint.as_deref().map_or(true, |b| e.blueprint == b))
            .filter(|e| query.published.map_or(true, |p| e.published == p))
            .filter(|e| {
                query
                    .data
                    .iter()
                    .all(|(field, expected)| value_matches(e.data.get(field), expected))
            })
            .cloned()
            .collect();

        sort_by_key(&mut matched, &query.sort, entry_sort_key);
        let page = paginate(matched, query.offset, query.limit);
        // Still under the read lock: no writer can clear between snapshot and insert.
        self.remember_entries(key, &page);
        drop(state);
        Ok(page)
    }

    async fn find_entry(&self, collection: &str, slug: &str) -> Result<Option<Entry>> {
        let state = self.state.read().await;
        Ok(state
            .entries
            .get(&(collection.to_string(), slug.to_string()))
            .cloned())
    }

    async fn create_entry(&self, req: NewEntry) -> Result<Entry> {
        let mut state = self.state.write().await;
        if !state.collections.contains_key(&req.collection) {
            return Err(Error::NotFound(format!("collection '{}'", req.collection)));
        }
        let key = (req.collection.clone(), req.slug.clone());
        if state.entries.contains_key(&key) {
            return Err(Error::Conflict(format!(
                "entry '{}' already exists in collection '{}'",
                req.slug, req.collection
            )));
        }
        let now = Utc::now();
        let entry = Entry {
            id: Uuid::new_v4(),
            collection: req.collection,
            blueprint: req.blueprint,
            slug: req.slug,
            published: req.published,
            data: req.data,
            created_at: now,
            updated_at: now,
        };
        state.entries.insert(key, entry.clone());
        self.clear_entry_cache();
        drop(state);
        self.counters.entries_created.fetch_add(1, Ordering::Relaxed);
        Ok(entry)
    }

    async fn update_entry(
        &self,
        collection: &str,
        slug: &str,
        update: EntryUpdate,
    ) -> Result<Entry> {
        let mut state = self.state.write().await;
        let entry = state
            .entries
            .get_mut(&(collection.to_string(), slug.to_string()))
            .ok_or_else(|| Error::NotFound(format!("entry '{}' in '{}'", slug, collection)))?;
        if let Some(title) = update.title {
            entry.data.insert("title".to_string(), title.into());
        }
        if let Some(blueprint) = update.blueprint {
            entry.blueprint = blueprint;
        }
        if let Some(data) = update.data {
            entry.data.extend(data);
        }
        entry.updated_at = Utc::now();
        let updated = entry.clone();
        self.clear_entry_cache();
        Ok(updated)
    }

    async fn delete_entry(&self, collection: &str, slug: &str) -> Result<Entry> {
        let mut state = self.state.write().await;
        let removed = state
            .entries
            .remove(&(collection.to_string(), slug.to_string()))
            .ok_or_else(|| Error::NotFound(format!("entry '{}' in '{}'", slug, collection)))?;
        self.clear_entry_cache();
        Ok(removed)
    }

    // --- assets ---

    async fn find_container(&self, handle: &str) -> Result<Option<AssetContainer>> {
        Ok(self.state.read().await.containers.get(handle).cloned())
    }

    async fn query_assets(&self, query: &AssetQuery) -> Result<Vec<Asset>> {
        let state = self.state.read().await;
        let mut matched: Vec<Asset> = state
            .assets
            .values()
            .map(|stored| &stored.asset)
            .filter(|a| query.container.as_deref().map_or(true, |c| a.container == c))
            .cloned()
            .collect();
        drop(state);
        sort_by_key(&mut matched, &query.sort, asset_sort_key);
        Ok(paginate(matched, query.offset, query.limit))
    }

    async fn find_asset(&self, container: &str, path: &str) -> Result<Option<Asset>> {
        let state = self.state.read().await;
        Ok(state
            .assets
            .get(&(container.to_string(), path.to_string()))
            .map(|stored| stored.asset.clone()))
    }

    async fn create_asset(&self, req: NewAsset) -> Result<Asset> {
        let mut state = self.state.write().await;
        if !state.containers.contains_key(&req.container) {
            return Err(Error::NotFound(format!(
                "asset container '{}'",
                req.container
            )));
        }
        let key = (req.container.clone(), req.path.clone());
        if state.assets.contains_key(&key) {
            return Err(Error::Conflict(format!(
                "asset '{}' already exists in container '{}'",
                req.path, req.container
            )));
        }
        let now = Utc::now();
        let asset = Asset {
            container: req.container,
            path: req.path,
            title: None,
            data: Default::default(),
            size: req.contents.len() as u64,
            mime_type: req.mime_type,
            created_at: now,
            updated_at: now,
        };
        state.assets.insert(
            key,
            StoredAsset {
                asset: asset.clone(),
                contents: req.contents,
            },
        );
        self.counters.assets_created.fetch_add(1, Ordering::Relaxed);
        Ok(asset)
    }

    async fn update_asset(&self, container: &str, path: &str, update: AssetUpdate) -> Result<Asset> {
        let mut state = self.state.write().await;
        let stored = state
            .assets
            .get_mut(&(container.to_string(), path.to_string()))
            .ok_or_else(|| Error::NotFound(format!("asset '{}' in '{}'", path, container)))?;
        if let Some(title) = update.title {
            stored.asset.title = Some(title);
        }
        if let Some(data) = update.data {
            stored.asset.data.extend(data);
        }
        stored.asset.updated_at = Utc::now();
        Ok(stored.asset.clone())
    }

    async fn delete_asset(&self, container: &str, path: &str) -> Result<Asset> {
        let mut state = self.state.write().await;
        state
            .assets
            .remove(&(container.to_string(), path.to_string()))
            .map(|stored| stored.asset)
            .ok_or_else(|| Error::NotFound(format!("asset '{}' in '{}'", path, container)))
    }

    // --- cache ---

    async fn invalidate_read_cache(&self) -> Result<()> {
        let _guard = self.state.write().await;
        self.clear_entry_cache();
        self.counters
            .cache_invalidations
            .fetch_add(1, Ordering::Relaxed);
        debug!("Read cache invalidated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn store_with_pages() -> MemoryContentStore {
        let store = MemoryContentStore::new();
        store
            .create_collection(NewCollection {
                handle: "pages".into(),
                title: "Pages".into(),
                route: Some("{parent}/{slug}".into()),
            })
            .await
            .unwrap();
        store
    }

    fn new_entry(slug: &str, data: serde_json::Value) -> NewEntry {
        NewEntry {
            collection: "pages".into(),
            blueprint: "page".into(),
            slug: slug.into(),
            published: true,
            data: data.as_object().cloned().unwrap_or_default(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_conflict() {
        let store = store_with_pages().await;
        store
            .create_entry(new_entry("about", json!({"title": "About"})))
            .await
            .unwrap();
        let err = store
            .create_entry(new_entry("about", json!({"title": "About again"})))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert_eq!(store.metrics().entries_created, 1);
    }

    #[tokio::test]
    async fn test_create_entry_requires_collection() {
        let store = MemoryContentStore::new();
        let err = store
            .create_entry(new_entry("about", json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_cache_is_cleared_by_writes() {
        let store = store_with_pages().await;
        let query = EntryQuery {
            collection: Some("pages".into()),
            ..Default::default()
        };
        assert!(store.query_entries(&query).await.unwrap().is_empty());

        store
            .create_entry(new_entry("home", json!({"title": "Home"})))
            .await
            .unwrap();
        assert_eq!(store.query_entries(&query).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_entry_merges_data() {
        let store = store_with_pages().await;
        store
            .create_entry(new_entry("faq", json!({"title": "FAQ", "author": "Ann"})))
            .await
            .unwrap();
        let updated = store
            .update_entry(
                "pages",
                "faq",
                EntryUpdate {
                    title: Some("FAQs".into()),
                    blueprint: None,
                    data: json!({"tone": "friendly"}).as_object().cloned(),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title(), Some("FAQs"));
        assert_eq!(updated.data["author"], json!("Ann"));
        assert_eq!(updated.data["tone"], json!("friendly"));
    }

    #[tokio::test]
    async fn test_delete_collection_removes_its_entries() {
        let store = store_with_pages().await;
        store
            .create_entry(new_entry("home", json!({"title": "Home"})))
            .await
            .unwrap();
        store.delete_collection("pages").await.unwrap();
        assert!(store.find_entry("pages", "home").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_entry_cache_is_bounded() {
        let store = MemoryContentStore::with_cache_capacity(8);
        for offset in 0..100 {
            let query = EntryQuery {
                offset,
                ..Default::default()
            };
            store.query_entries(&query).await.unwrap();
        }
        assert_eq!(store.cached_listings(), 8);
    }

    #[tokio::test]
    async fn test_default_cache_capacity() {
        let store = MemoryContentStore::new();
        for offset in 0..(ENTRY_CACHE_CAPACITY + 50) {
            let query = EntryQuery {
                offset,
                ..Default::default()
            };
            store.query_entries(&query).await.unwrap();
        }
        assert_eq!(store.cached_listings(), ENTRY_CACHE_CAPACITY);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_write_is_visible_to_later_reads() {
        let store = std::sync::Arc::new(store_with_pages().await);
        for i in 0..2_000 {
            store
                .create_entry(new_entry(&format!("seed-{i}"), json!({"title": "Seed"})))
                .await
                .unwrap();
        }
        let query = EntryQuery {
            collection: Some("pages".into()),
            limit: 10_000,
            ..Default::default()
        };

        for round in 0..30 {
            let reader = {
                let store = store.clone();
                let query = query.clone();
                tokio::spawn(async move { store.query_entries(&query).await.unwrap() })
            };
            let writer = {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .create_entry(new_entry(&format!("new-{round}"), json!({"title": "New"})))
                        .await
                        .unwrap()
                })
            };
            reader.await.unwrap();
            writer.await.unwrap();

            let listed = store.query_entries(&query).await.unwrap();
            let slug = format!("new-{round}");
            assert!(
                listed.iter().any(|e| e.slug == slug),
                "round {round}: committed entry missing from listing"
            );
        }
    }

    #[tokio::test]
    async fn test_invalidate_counts() {
        let store = MemoryContentStore::new();
        store.invalidate_read_cache().await.unwrap();
        store.invalidate_read_cache().await.unwrap();
        assert_eq!(store.metrics().cache_invalidations, 2);
    }
}
