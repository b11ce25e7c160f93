//! Listing, filtering and asset behaviour of the in-memory store.

use autoblog_core::{
    AssetQuery, AssetUpdate, ContentStore, EntryQuery, Error, NewAsset, NewBlueprint,
    NewCollection, NewEntry, Sort, SortOrder,
};
use autoblog_store::MemoryContentStore;
use serde_json::{json, Value};

async fn seeded_store() -> MemoryContentStore {
    let store = MemoryContentStore::with_containers(["assets", "images"]);
    for (handle, title) in [("pages", "Pages"), ("blog", "Blog")] {
        store
            .create_collection(NewCollection {
                handle: handle.into(),
                title: title.into(),
                route: Some("/{slug}".into()),
            })
            .await
            .unwrap();
    }

    let entries = [
        ("pages", "home", "Home", "Ann", true),
        ("pages", "about", "About Us", "Bob", true),
        ("pages", "draft", "Draft", "Ann", false),
        ("blog", "hello", "Hello", "Ann", true),
    ];
    for (collection, slug, title, author, published) in entries {
        store
            .create_entry(NewEntry {
                collection: collection.into(),
                blueprint: if collection == "blog" { "post" } else { "page" }.into(),
                slug: slug.into(),
                published,
                data: object(json!({"title": title, "author": author})),
            })
            .await
            .unwrap();
    }
    store
}

fn object(value: Value) -> serde_json::Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

fn slugs(entries: &[autoblog_core::Entry]) -> Vec<&str> {
    entries.iter().map(|e| e.slug.as_str()).collect()
}

#[tokio::test]
async fn test_filters_combine() {
    let store = seeded_store().await;
    let query = EntryQuery {
        collection: Some("pages".into()),
        published: Some(true),
        data: vec![("author".into(), "Ann".into())],
        sort: Sort::asc("slug"),
        ..Default::default()
    };
    let found = store.query_entries(&query).await.unwrap();
    assert_eq!(slugs(&found), vec!["home"]);
}

#[tokio::test]
async fn test_sort_by_data_field_and_paginate() {
    let store = seeded_store().await;
    let query = EntryQuery {
        sort: Sort::new("title", SortOrder::Asc),
        offset: 1,
        limit: 2,
        ..Default::default()
    };
    let found = store.query_entries(&query).await.unwrap();
    assert_eq!(slugs(&found), vec!["draft", "hello"]);
}

#[tokio::test]
async fn test_blueprint_filter() {
    let store = seeded_store().await;
    let query = EntryQuery {
        blueprint: Some("post".into()),
        ..Default::default()
    };
    let found = store.query_entries(&query).await.unwrap();
    assert_eq!(slugs(&found), vec!["hello"]);
}

#[tokio::test]
async fn test_collections_sorted_by_title() {
    let store = seeded_store().await;
    let listed = store.list_collections(&Sort::asc("title")).await.unwrap();
    let handles: Vec<_> = listed.iter().map(|c| c.handle.as_str()).collect();
    assert_eq!(handles, vec!["blog", "pages"]);
}

#[tokio::test]
async fn test_duplicate_blueprint_is_conflict() {
    let store = MemoryContentStore::new();
    let new = || NewBlueprint {
        handle: "page".into(),
        title: "Page".into(),
        fields: vec![],
    };
    store.create_blueprint(new()).await.unwrap();
    assert!(matches!(
        store.create_blueprint(new()).await,
        Err(Error::Conflict(_))
    ));
    assert_eq!(store.metrics().blueprints_created, 1);
}

#[tokio::test]
async fn test_asset_lifecycle() {
    let store = seeded_store().await;
    let asset = store
        .create_asset(NewAsset {
            container: "images".into(),
            path: "logo.png".into(),
            contents: vec![1, 2, 3],
            mime_type: Some("image/png".into()),
        })
        .await
        .unwrap();
    assert_eq!(asset.id(), "images::logo.png");
    assert_eq!(asset.size, 3);
    assert_eq!(
        store.asset_contents("images", "logo.png").await,
        Some(vec![1, 2, 3])
    );

    let updated = store
        .update_asset(
            "images",
            "logo.png",
            AssetUpdate {
                title: Some("Logo".into()),
                data: Some(object(json!({"alt": "Company logo"}))),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.display_title(), "Logo");
    assert_eq!(updated.data["alt"], json!("Company logo"));

    let listed = store
        .query_assets(&AssetQuery {
            container: Some("images".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);

    store.delete_asset("images", "logo.png").await.unwrap();
    assert!(store.find_asset("images", "logo.png").await.unwrap().is_none());
}

#[tokio::test]
async fn test_asset_requires_known_container() {
    let store = MemoryContentStore::new();
    let err = store
        .create_asset(NewAsset {
            container: "nope".into(),
            path: "a.txt".into(),
            contents: vec![],
            mime_type: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}
