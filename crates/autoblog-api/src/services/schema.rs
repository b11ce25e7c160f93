//! Idempotent creation of the collection and blueprint generated pages use.
//!
//! Both helpers return [`EnsureOutcome::AlreadyExisted`] when the record is
//! present (including when a concurrent creator wins the race), and only
//! invalidate the read cache and notify after an actual creation.

use serde_json::json;
use tracing::{debug, info};

use autoblog_core::defaults::COLLECTION_ROUTE;
use autoblog_core::{
    title_from_handle, ContentStore, Error, EventKind, FieldDefinition, NewBlueprint,
    NewCollection, Result,
};
use autoblog_webhooks::WebhookNotifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    AlreadyExisted,
    Created,
}

/// Make sure collection `handle` exists, creating it with the default route.
pub async fn ensure_collection_exists(
    store: &dyn ContentStore,
    notifier: &WebhookNotifier,
    handle: &str,
) -> Result<EnsureOutcome> {
    if store.find_collection(handle).await?.is_some() {
        debug!(collection = handle, "Collection already exists");
        return Ok(EnsureOutcome::AlreadyExisted);
    }

    let created = store
        .create_collection(NewCollection {
            handle: handle.to_string(),
            title: title_from_handle(handle),
            route: Some(COLLECTION_ROUTE.to_string()),
        })
        .await;
    let collection = match created {
        Ok(collection) => collection,
        Err(Error::Conflict(_)) => {
            debug!(collection = handle, "Collection created concurrently");
            return Ok(EnsureOutcome::AlreadyExisted);
        }
        Err(e) => return Err(e),
    };

    store.invalidate_read_cache().await?;
    notifier.dispatch(
        EventKind::CollectionCreated,
        json!({"handle": collection.handle, "title": collection.title}),
    );
    info!(collection = %collection.handle, "Collection created for generated pages");
    Ok(EnsureOutcome::Created)
}

/// Fields of the page blueprint: required text `title`, markdown `content`.
pub fn page_fields() -> Vec<FieldDefinition> {
    vec![
        FieldDefinition::new("title", "text", "Title").required(),
        FieldDefinition::new("content", "markdown", "Content"),
    ]
}

/// Make sure blueprint `handle` exists, creating it with [`page_fields`].
pub async fn ensure_blueprint_exists(
    store: &dyn ContentStore,
    notifier: &WebhookNotifier,
    handle: &str,
) -> Result<EnsureOutcome> {
    if store.find_blueprint(handle).await?.is_some() {
        debug!(blueprint = handle, "Blueprint already exists");
        return Ok(EnsureOutcome::AlreadyExisted);
    }

    let created = store
        .create_blueprint(NewBlueprint {
            handle: handle.to_string(),
            title: title_from_handle(handle),
            fields: page_fields(),
        })
        .await;
    let blueprint = match created {
        Ok(blueprint) => blueprint,
        Err(Error::Conflict(_)) => {
            debug!(blueprint = handle, "Blueprint created concurrently");
            return Ok(EnsureOutcome::AlreadyExisted);
        }
        Err(e) => return Err(e),
    };

    store.invalidate_read_cache().await?;
    notifier.dispatch(
        EventKind::BlueprintCreated,
        json!({"handle": blueprint.handle, "title": blueprint.title}),
    );
    info!(blueprint = %blueprint.handle, "Blueprint created for generated pages");
    Ok(EnsureOutcome::Created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoblog_store::MemoryContentStore;

    #[tokio::test]
    async fn test_ensure_collection_is_idempotent() {
        let store = MemoryContentStore::new();
        let notifier = WebhookNotifier::disabled();

        let first = ensure_collection_exists(&store, &notifier, "pages").await.unwrap();
        let second = ensure_collection_exists(&store, &notifier, "pages").await.unwrap();

        assert_eq!(first, EnsureOutcome::Created);
        assert_eq!(second, EnsureOutcome::AlreadyExisted);
        let metrics = store.metrics();
        assert_eq!(metrics.collections_created, 1);
        assert_eq!(metrics.cache_invalidations, 1);

        let collection = store.find_collection("pages").await.unwrap().unwrap();
        assert_eq!(collection.title, "Pages");
        assert_eq!(collection.route.as_deref(), Some(COLLECTION_ROUTE));
    }

    #[tokio::test]
    async fn test_ensure_blueprint_creates_page_fields() {
        let store = MemoryContentStore::new();
        let notifier = WebhookNotifier::disabled();

        assert_eq!(
            ensure_blueprint_exists(&store, &notifier, "page").await.unwrap(),
            EnsureOutcome::Created
        );
        assert_eq!(
            ensure_blueprint_exists(&store, &notifier, "page").await.unwrap(),
            EnsureOutcome::AlreadyExisted
        );

        let blueprint = store.find_blueprint("page").await.unwrap().unwrap();
        assert_eq!(blueprint.title, "Page");
        let handles: Vec<&str> = blueprint.fields.iter().map(|f| f.handle.as_str()).collect();
        assert_eq!(handles, vec!["title", "content"]);
        assert!(blueprint.fields[0].is_required());
        assert_eq!(blueprint.fields[1].field_type(), Some("markdown"));
        assert_eq!(store.metrics().blueprints_created, 1);
    }
}
