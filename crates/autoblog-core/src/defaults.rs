//! Centralized default constants for autoblogger.
//!
//! All crates reference these constants instead of defining their own magic
//! numbers. Organized by domain area.

// =============================================================================
// PAGINATION & SORTING
// =============================================================================

/// Default page size for entry and asset listings.
pub const PAGE_LIMIT: usize = 100;

/// Default page offset.
pub const PAGE_OFFSET: usize = 0;

/// Default sort field for entries (newest edits first).
pub const ENTRY_SORT_FIELD: &str = "updated_at";

/// Default sort field for assets.
pub const ASSET_SORT_FIELD: &str = "updated_at";

/// Default sort field for collections and blueprints.
pub const SCHEMA_SORT_FIELD: &str = "title";

/// Distinct entry listings kept in the store's read cache.
pub const ENTRY_CACHE_CAPACITY: usize = 256;

// =============================================================================
// WEBHOOKS
// =============================================================================

/// Upper bound on a single webhook delivery.
pub const WEBHOOK_TIMEOUT_SECS: u64 = 5;

/// Pending deliveries held before new events are dropped.
pub const WEBHOOK_QUEUE_CAPACITY: usize = 1024;

// =============================================================================
// CHAT / PAGE GENERATION
// =============================================================================

/// Default chat model.
pub const CHAT_MODEL: &str = "gpt-4o-mini";

/// Upper bound on one chat completion call.
pub const CHAT_TIMEOUT_SECS: u64 = 30;

/// Collection that generated pages are written to.
pub const GENERATED_COLLECTION: &str = "pages";

/// Blueprint assigned to generated pages.
pub const GENERATED_BLUEPRINT: &str = "page";

/// Route pattern for collections created on demand.
pub const COLLECTION_ROUTE: &str = "{parent}/{slug}";

/// Title used when the model omits one.
pub const UNTITLED_PAGE: &str = "Untitled Page";

/// Body used when the model omits `content_elements`.
pub const DEFAULT_PAGE_CONTENT: &str = "Default content.";

/// Page categories every generated site should cover.
pub const PAGE_CATEGORIES: &[&str] = &[
    "Home", "About Us", "Contact Us", "Careers", "FAQs", "Blogs", "Services",
];

// =============================================================================
// ASSETS
// =============================================================================

/// Container seeded when none are configured.
pub const ASSET_CONTAINER: &str = "assets";

/// Upper bound on fetching a remote asset.
pub const ASSET_FETCH_TIMEOUT_SECS: u64 = 30;

/// Maximum accepted request body (uploads).
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
