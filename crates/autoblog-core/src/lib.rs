//! # autoblog-core
//!
//! Core types, traits, and abstractions for autoblogger.
//!
//! This crate provides the content records, the [`ContentStore`] and
//! [`ChatBackend`] collaborator traits, mutation events and shared defaults
//! that the other autoblogger crates depend on.

pub mod defaults;
pub mod error;
pub mod events;
pub mod models;
pub mod text;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use events::{EventKind, MutationEvent};
pub use models::*;
pub use text::{slugify, title_from_handle};
pub use traits::*;
