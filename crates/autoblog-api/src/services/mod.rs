//! Service layer for multi-step operations.

pub mod page_generator;
pub mod schema;

pub use page_generator::{GenerationError, GenerationReport, PageCreationResult, PageGenerator};
pub use schema::{ensure_blueprint_exists, ensure_collection_exists, EnsureOutcome};
