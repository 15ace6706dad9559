//! keyref-core – shortcut catalog, query engine and bundled dataset.
//!
//! This crate has no I/O. The HTTP server wraps [`Catalog`] for its
//! in-memory backend and reuses [`query`] for every read that filters or
//! sorts.

mod catalog;
mod error;
mod seed;
mod types;

pub mod query;

pub use catalog::{category_counts, Catalog};
pub use error::CatalogError;
pub use query::{run_query, QueryFilter, ToolGroup};
pub use seed::seed_shortcuts;
pub use types::{
    double_option, normalize_category, Category, FavoriteInsert, FavoriteRecord, NewShortcut, Os,
    ShortcutPatch, ShortcutRecord, UsageRecord,
};
