//! Collection and blueprint endpoints.

mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

use autoblog_core::ContentStore;

#[tokio::test]
async fn test_collection_lifecycle() {
    let app = TestApp::new();

    let (status, body) = app
        .post(
            "/api/autoblogger/collections",
            json!({"handle": "news", "title": "News", "route": "news/{slug}"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Collection created successfully.");

    let (status, body) = app.get("/api/autoblogger/collections/news").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"handle": "news", "title": "News", "structure": [], "routes": ["news/{slug}"]})
    );

    let (status, body) = app
        .put(
            "/api/autoblogger/collections/news",
            json!({"title": "Newsroom"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Collection updated successfully.");
    let (_, body) = app.get("/api/autoblogger/collections/news").await;
    assert_eq!(body["title"], "Newsroom");
    assert_eq!(body["routes"], json!(["news/{slug}"]));

    let (status, _) = app.delete("/api/autoblogger/collections/news").await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = app.get("/api/autoblogger/collections/news").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "COLLECTION_NOT_FOUND");
}

#[tokio::test]
async fn test_collection_without_route_has_no_routes() {
    let app = TestApp::new();
    app.post(
        "/api/autoblogger/collections",
        json!({"handle": "drafts", "title": "Drafts"}),
    )
    .await;

    let (_, body) = app.get("/api/autoblogger/collections/drafts").await;
    assert_eq!(body["routes"], json!([]));
}

#[tokio::test]
async fn test_collection_handle_must_be_unique() {
    let app = TestApp::new();
    app.seed_blog().await;

    let (status, body) = app
        .post(
            "/api/autoblogger/collections",
            json!({"handle": "blog", "title": "Another Blog"}),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["details"]["handle"][0],
        "A collection with this handle already exists."
    );
    assert_eq!(app.store.metrics().collections_created, 1);
}

#[tokio::test]
async fn test_collection_validation() {
    let app = TestApp::new();

    let (status, body) = app.post("/api/autoblogger/collections", json!({})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["details"]["handle"].is_array());
    assert!(body["details"]["title"].is_array());

    let (status, body) = app
        .put("/api/autoblogger/collections/ghost", json!({"title": "X"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "COLLECTION_NOT_FOUND");
}

#[tokio::test]
async fn test_malformed_json_body_is_a_validation_error() {
    let app = TestApp::new();
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/autoblogger/collections")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .expect("request");

    let (status, body) = app.call(request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_FAILED");
    assert!(body["details"]["body"].is_array());
}

#[tokio::test]
async fn test_list_collections_sorted_by_title() {
    let app = TestApp::new();
    for (handle, title) in [("z", "alpha"), ("a", "Charlie"), ("m", "bravo")] {
        app.post(
            "/api/autoblogger/collections",
            json!({"handle": handle, "title": title}),
        )
        .await;
    }

    let (_, body) = app.get("/api/autoblogger/collections").await;
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["alpha", "bravo", "Charlie"]);

    let (_, body) = app
        .get("/api/autoblogger/collections?sort_by=handle&sort_order=desc")
        .await;
    assert_eq!(body[0], json!({"handle": "z", "title": "alpha"}));
}

#[tokio::test]
async fn test_deleting_collection_removes_its_entries() {
    let app = TestApp::new();
    app.seed_blog().await;
    app.post(
        "/api/autoblogger/entries",
        json!({"collection": "blog", "blueprint": "post", "title": "T", "slug": "t"}),
    )
    .await;

    app.delete("/api/autoblogger/collections/blog").await;

    assert!(app.store.find_entry("blog", "t").await.unwrap().is_none());
}

#[tokio::test]
async fn test_blueprint_lifecycle() {
    let app = TestApp::new();

    let (status, body) = app
        .post(
            "/api/autoblogger/blueprints",
            json!({
                "handle": "article",
                "title": "Article",
                "fields": [
                    {"handle": "title", "field": {"type": "text", "required": true}},
                    {"handle": "body", "field": {"type": "markdown"}}
                ]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Blueprint created successfully.");

    let (status, body) = app.get("/api/autoblogger/blueprints/article").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["handle"], "article");
    assert_eq!(body["fields"][1]["handle"], "body");
    assert_eq!(body["fields"][1]["field"]["type"], "markdown");

    let (status, _) = app
        .put(
            "/api/autoblogger/blueprints/article",
            json!({"fields": [{"handle": "summary", "field": {"type": "textarea"}}]}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.get("/api/autoblogger/blueprints/article").await;
    assert_eq!(body["title"], "Article");
    assert_eq!(body["fields"].as_array().unwrap().len(), 1);

    let (_, body) = app.get("/api/autoblogger/blueprints").await;
    assert_eq!(body, json!([{"handle": "article", "title": "Article"}]));

    let (status, _) = app.delete("/api/autoblogger/blueprints/article").await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = app.get("/api/autoblogger/blueprints/article").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "BLUEPRINT_NOT_FOUND");
}

#[tokio::test]
async fn test_blueprint_validation() {
    let app = TestApp::new();
    app.seed_blog().await;

    let (status, body) = app
        .post(
            "/api/autoblogger/blueprints",
            json!({"handle": "post", "title": "Post", "fields": [{"field": {}}, "text"]}),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["details"]["handle"][0],
        "A blueprint with this handle already exists."
    );
    assert!(body["details"]["fields.0"].is_array());
    assert!(body["details"]["fields.1"].is_array());

    let (status, body) = app
        .post(
            "/api/autoblogger/blueprints",
            json!({"handle": "x", "title": "X"}),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"]["fields"][0], "The fields field is required.");
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
