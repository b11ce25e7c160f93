//! AI page generation pipeline.
//!
//! `load KB -> chat -> parse JSON array -> ensure schema -> create entries -> report`.
//!
//! Every stage before entry creation is fatal: a failure there aborts the
//! run with a [`GenerationError`] and nothing is written. Once the schema is
//! in place, each page is created independently and recorded as `created`
//! or `failed` in the [`GenerationReport`].

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use autoblog_core::defaults::{
    DEFAULT_PAGE_CONTENT, GENERATED_BLUEPRINT, GENERATED_COLLECTION, PAGE_CATEGORIES,
    UNTITLED_PAGE,
};
use autoblog_core::{slugify, ChatBackend, ContentStore, EventKind, NewEntry};
use autoblog_webhooks::WebhookNotifier;

use super::schema::{ensure_blueprint_exists, ensure_collection_exists};
use crate::views::entry_url;
use crate::AppState;

/// Fatal failures of a generation run.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Failed to read knowledge base {path}: {source}")]
    KnowledgeBase {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("AI request failed: {0}")]
    Chat(#[source] autoblog_core::Error),

    #[error("Failed to decode AI response JSON: {0}")]
    MalformedResponse(String),

    #[error("Failed to prepare page schema: {0}")]
    Schema(#[source] autoblog_core::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    Created,
    Failed,
}

/// Outcome of one generated page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageCreationResult {
    pub page: String,
    pub status: PageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationReport {
    pub message: String,
    pub results: Vec<PageCreationResult>,
}

impl GenerationReport {
    pub fn created_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == PageStatus::Created)
            .count()
    }
}

/// The prompt sent to the model for a knowledge base.
pub fn build_prompt(kb: &str) -> String {
    format!(
        "Based on the following brand knowledge base:\n\n{}\n\n\
         Generate a list of essential website pages for a modern website, focusing on \
         excellent user experience (UX). Include standard pages like {}. For each page, \
         suggest its primary purpose and key content elements. Provide the response in \
         JSON format, where each page is an object with 'title', 'slug', 'purpose', and \
         'content_elements' keys.",
        kb,
        PAGE_CATEGORIES.join(", ")
    )
}

/// One page suggestion with defaults applied.
#[derive(Debug, Clone, PartialEq)]
struct GeneratedPage {
    title: String,
    slug: String,
    content: String,
}

impl GeneratedPage {
    /// Apply defaults; fails only when no usable slug can be derived.
    fn from_value(value: &Value) -> Result<Self, (String, String)> {
        let Some(item) = value.as_object() else {
            return Err((
                UNTITLED_PAGE.to_string(),
                "Page suggestion is not a JSON object.".to_string(),
            ));
        };

        let title = string_field(item, "title").unwrap_or_else(|| UNTITLED_PAGE.to_string());
        let slug = string_field(item, "slug").unwrap_or_else(|| slugify(&title));
        if slug.is_empty() {
            return Err((title, "Page slug could not be derived.".to_string()));
        }
        let content = match item.get("content_elements") {
            None | Some(Value::Null) => DEFAULT_PAGE_CONTENT.to_string(),
            Some(elements) => render_content(elements),
        };

        Ok(Self {
            title,
            slug,
            content,
        })
    }
}

fn string_field(item: &Map<String, Value>, key: &str) -> Option<String> {
    item.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Render `content_elements` as markdown.
///
/// Strings pass through, arrays of strings become bullet lists and anything
/// else is pretty-printed JSON.
pub fn render_content(elements: &Value) -> String {
    match elements {
        Value::String(s) => s.clone(),
        Value::Array(items) if items.iter().all(Value::is_string) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|s| format!("- {}", s))
            .collect::<Vec<_>>()
            .join("\n"),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

/// Runs the generation pipeline against the injected collaborators.
#[derive(Clone)]
pub struct PageGenerator {
    store: Arc<dyn ContentStore>,
    chat: Arc<dyn ChatBackend>,
    notifier: WebhookNotifier,
    site_url: String,
}

impl PageGenerator {
    pub fn new(
        store: Arc<dyn ContentStore>,
        chat: Arc<dyn ChatBackend>,
        notifier: WebhookNotifier,
        site_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            chat,
            notifier,
            site_url: site_url.into(),
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            state.store.clone(),
            state.chat.clone(),
            state.notifier.clone(),
            state.settings.site_url.clone(),
        )
    }

    /// Run the full pipeline for the knowledge base at `kb_path`.
    pub async fn generate(&self, kb_path: &Path) -> Result<GenerationReport, GenerationError> {
        let start = Instant::now();

        let kb = tokio::fs::read_to_string(kb_path).await.map_err(|source| {
            GenerationError::KnowledgeBase {
                path: kb_path.display().to_string(),
                source,
            }
        })?;

        let prompt = build_prompt(&kb);
        debug!(prompt_len = prompt.len(), "Requesting page suggestions");
        let response = self
            .chat
            .chat(&prompt, None)
            .await
            .map_err(GenerationError::Chat)?;
        debug!(response_len = response.len(), "Received page suggestions");

        let pages = parse_pages(&response)?;

        ensure_collection_exists(self.store.as_ref(), &self.notifier, GENERATED_COLLECTION)
            .await
            .map_err(GenerationError::Schema)?;
        ensure_blueprint_exists(self.store.as_ref(), &self.notifier, GENERATED_BLUEPRINT)
            .await
            .map_err(GenerationError::Schema)?;

        let mut results = Vec::with_capacity(pages.len());
        for value in &pages {
            results.push(self.create_page(value).await);
        }

        let report = GenerationReport {
            message: "Page generation complete.".to_string(),
            results,
        };
        info!(
            result_count = report.results.len(),
            created = report.created_count(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Page generation finished"
        );
        Ok(report)
    }

    async fn create_page(&self, value: &Value) -> PageCreationResult {
        let page = match GeneratedPage::from_value(value) {
            Ok(page) => page,
            Err((title, error)) => {
                warn!(page = %title, error = %error, "Skipping page suggestion");
                return PageCreationResult {
                    page: title,
                    status: PageStatus::Failed,
                    error: Some(error),
                };
            }
        };

        let mut data = Map::new();
        data.insert("title".to_string(), Value::String(page.title.clone()));
        data.insert("content".to_string(), Value::String(page.content));
        let created = self
            .store
            .create_entry(NewEntry {
                collection: GENERATED_COLLECTION.to_string(),
                blueprint: GENERATED_BLUEPRINT.to_string(),
                slug: page.slug,
                published: true,
                data,
            })
            .await;

        match created {
            Ok(entry) => {
                let collection = self
                    .store
                    .find_collection(&entry.collection)
                    .await
                    .ok()
                    .flatten();
                let url = entry_url(&self.site_url, collection.as_ref(), &entry.slug);
                self.notifier.dispatch(
                    EventKind::EntryCreated,
                    json!({
                        "id": entry.id.to_string(),
                        "collection": entry.collection,
                        "slug": entry.slug,
                        "url": url,
                    }),
                );
                debug!(slug = %entry.slug, "Generated page created");
                PageCreationResult {
                    page: page.title,
                    status: PageStatus::Created,
                    error: None,
                }
            }
            Err(e) => {
                warn!(page = %page.title, error = %e, "Generated page could not be created");
                PageCreationResult {
                    page: page.title,
                    status: PageStatus::Failed,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

/// The model's reply must be a JSON array.
fn parse_pages(response: &str) -> Result<Vec<Value>, GenerationError> {
    match serde_json::from_str::<Value>(response) {
        Ok(Value::Array(pages)) => Ok(pages),
        Ok(_) => Err(GenerationError::MalformedResponse(
            "expected a JSON array of pages".to_string(),
        )),
        Err(e) => Err(GenerationError::MalformedResponse(e.to_string())),
    }
}
