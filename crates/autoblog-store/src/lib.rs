//! # autoblog-store
//!
//! In-memory implementation of [`autoblog_core::ContentStore`].
//!
//! Used by the API server out of the box and by every test that needs a
//! real store rather than a fake.

pub mod memory;
mod query;

pub use memory::{MemoryContentStore, StoreMetrics};
pub use query::parse_bool;
