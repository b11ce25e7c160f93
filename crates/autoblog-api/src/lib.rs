//! # autoblog-api
//!
//! HTTP surface of autoblogger: CRUD over entries, collections, blueprints
//! and assets under `/api/autoblogger`, AI page generation, and webhook
//! notification of every successful mutation.
//!
//! The router is built from an [`AppState`] holding the injected content
//! store, chat backend and notifier, so tests drive it with in-memory
//! collaborators through `tower::ServiceExt::oneshot`.

pub mod config;
pub mod env_file;
pub mod error;
pub mod handlers;
pub mod services;
pub mod validation;
pub mod views;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use autoblog_core::{ChatBackend, ContentStore};
use autoblog_webhooks::WebhookNotifier;

pub use config::{AppSettings, ServerConfig};
pub use error::{ApiError, ValidationErrors};

// =============================================================================
// STATE
// =============================================================================

/// Shared collaborators for every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ContentStore>,
    pub chat: Arc<dyn ChatBackend>,
    pub notifier: WebhookNotifier,
    /// Client used to fetch remote assets.
    pub http: reqwest::Client,
    pub settings: Arc<AppSettings>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ContentStore>,
        chat: Arc<dyn ChatBackend>,
        notifier: WebhookNotifier,
        settings: AppSettings,
    ) -> autoblog_core::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.asset_fetch_timeout)
            .build()
            .map_err(|e| {
                autoblog_core::Error::Config(format!("Failed to create asset fetch client: {}", e))
            })?;
        Ok(Self {
            store,
            chat,
            notifier,
            http,
            settings: Arc::new(settings),
        })
    }
}

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Parse a comma-separated `ALLOWED_ORIGINS` value, skipping invalid entries.
pub fn parse_allowed_origins(raw: &str) -> Vec<HeaderValue> {
    raw.split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect()
}

// =============================================================================
// ROUTER
// =============================================================================

/// Routes mounted under `/api/autoblogger`.
fn api_routes() -> Router<AppState> {
    use handlers::{ai, assets, blueprints, collections, entries, navigate_ai};

    Router::new()
        // Entries
        .route(
            "/entries",
            get(entries::list_entries).post(entries::store_entry),
        )
        .route("/entries/bulk", post(entries::bulk_store_entries))
        .route(
            "/entries/:slug",
            get(entries::show_entry)
                .put(entries::update_entry)
                .delete(entries::delete_entry),
        )
        // Collections
        .route(
            "/collections",
            get(collections::list_collections).post(collections::store_collection),
        )
        .route(
            "/collections/:handle",
            get(collections::show_collection)
                .put(collections::update_collection)
                .delete(collections::delete_collection),
        )
        // Blueprints
        .route(
            "/blueprints",
            get(blueprints::list_blueprints).post(blueprints::store_blueprint),
        )
        .route(
            "/blueprints/:handle",
            get(blueprints::show_blueprint)
                .put(blueprints::update_blueprint)
                .delete(blueprints::delete_blueprint),
        )
        // Assets
        .route(
            "/assets",
            get(assets::list_assets).post(assets::store_asset),
        )
        .route("/assets/from-url", post(assets::store_asset_from_url))
        .route(
            "/assets/:container/*path",
            get(assets::show_asset)
                .put(assets::update_asset)
                .delete(assets::delete_asset),
        )
        // AI
        .route(
            "/navigate-ai/generate-pages",
            post(navigate_ai::generate_pages),
        )
        .route("/ai/chat", post(ai::chat))
}

/// Build the full application router with middleware.
pub fn build_router(state: AppState) -> Router {
    let allowed_origins = parse_allowed_origins(&state.settings.allowed_origins);
    let max_upload = state.settings.max_upload_bytes;

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/autoblogger", api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(allowed_origins))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
                .max_age(std::time::Duration::from_secs(3600)),
        )
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(RequestBodyLimitLayer::new(max_upload))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_allowed_origins() {
        let origins = parse_allowed_origins("https://a.test, http://localhost:3000,,");
        assert_eq!(origins.len(), 2);
        assert_eq!(origins[0], "https://a.test");
    }

    #[tokio::test]
    async fn test_app_state_keeps_settings() {
        let settings = AppSettings {
            site_url: "https://brand.test".to_string(),
            asset_fetch_timeout: std::time::Duration::from_secs(3),
            ..AppSettings::default()
        };
        let state = AppState::new(
            Arc::new(autoblog_store::MemoryContentStore::new()),
            Arc::new(autoblog_inference::mock::MockChatBackend::new()),
            WebhookNotifier::disabled(),
            settings,
        )
        .unwrap();
        assert_eq!(state.settings.site_url, "https://brand.test");
        assert_eq!(state.settings.asset_fetch_timeout.as_secs(), 3);
    }

    #[test]
    fn test_parse_allowed_origins_skips_invalid() {
        let origins = parse_allowed_origins("https://ok.test,bad\norigin");
        assert_eq!(origins.len(), 1);
    }
}
