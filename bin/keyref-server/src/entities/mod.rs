//! Storage abstraction layer.
//!
//! [`ShortcutStore`] is the interface every handler talks to. Two
//! implementations exist: [`memory::MemoryStore`] (the default, lost on
//! restart) and [`sqlite::SqliteStore`]. [`crate::state::AppState`] holds the
//! chosen one as `Arc<dyn ShortcutStore>`.
//!
//! Misses are reported as `Option`/`bool`. `StoreError` is reserved for
//! failures of the backend itself.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use keyref_core::{
    CatalogError, FavoriteInsert, FavoriteRecord, NewShortcut, QueryFilter, ShortcutPatch,
    ShortcutRecord, UsageRecord,
};
use thiserror::Error;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// A JSON-text column could not be encoded or decoded.
    #[error("column encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

#[async_trait]
pub trait ShortcutStore: Send + Sync + 'static {
    /// Every record, in ascending id order.
    async fn list(&self) -> Result<Vec<ShortcutRecord>, StoreError>;

    async fn get(&self, id: i64) -> Result<Option<ShortcutRecord>, StoreError>;

    async fn list_by_category(&self, category: &str) -> Result<Vec<ShortcutRecord>, StoreError>;

    /// Exact, case-sensitive tool match.
    async fn list_by_tool(&self, tool: &str) -> Result<Vec<ShortcutRecord>, StoreError>;

    /// Search-stage matches in ascending id order.
    async fn search(&self, text: &str) -> Result<Vec<ShortcutRecord>, StoreError> {
        Ok(keyref_core::query::search(&self.list().await?, text))
    }

    /// The `limit` most popular records, ties broken by ascending id.
    async fn popular(&self, limit: usize) -> Result<Vec<ShortcutRecord>, StoreError> {
        Ok(keyref_core::query::top_popular(&self.list().await?, limit))
    }

    /// Run the full query pipeline over the current catalog.
    async fn query(&self, filter: &QueryFilter) -> Result<Vec<ShortcutRecord>, StoreError> {
        Ok(keyref_core::run_query(&self.list().await?, filter))
    }

    async fn create(&self, data: NewShortcut) -> Result<ShortcutRecord, StoreError>;

    async fn update(
        &self,
        id: i64,
        patch: ShortcutPatch,
    ) -> Result<Option<ShortcutRecord>, StoreError>;

    /// `false` when the id is unknown.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;

    /// Bump the usage counter and popularity of `id` as one step. `None` when
    /// the id is unknown, in which case nothing changes.
    async fn increment_usage(&self, id: i64) -> Result<Option<UsageRecord>, StoreError>;

    async fn get_usage(&self, id: i64) -> Result<Option<UsageRecord>, StoreError>;

    async fn list_favorites(&self, user_id: &str) -> Result<Vec<FavoriteRecord>, StoreError>;

    async fn add_favorite(
        &self,
        shortcut_id: i64,
        user_id: &str,
    ) -> Result<FavoriteInsert, StoreError>;

    /// `false` when the pair was not favorited.
    async fn remove_favorite(&self, shortcut_id: i64, user_id: &str) -> Result<bool, StoreError>;

    /// Number of stored shortcuts.
    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.list().await?.len())
    }
}
