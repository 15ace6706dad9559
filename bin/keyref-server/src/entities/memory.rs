//! In-memory [`ShortcutStore`] over a [`Catalog`].
//!
//! A `tokio::sync::RwLock` serialises writers: each mutating call holds the
//! write guard for the whole operation, so readers never see a usage counter
//! bumped without the matching popularity bump.

use std::sync::Arc;

use async_trait::async_trait;
use keyref_core::{
    query, Catalog, FavoriteInsert, FavoriteRecord, NewShortcut, QueryFilter, ShortcutPatch,
    ShortcutRecord, UsageRecord,
};
use tokio::sync::RwLock;

use super::{ShortcutStore, StoreError};

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Catalog>>,
}

impl MemoryStore {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            inner: Arc::new(RwLock::new(catalog)),
        }
    }

    /// A store holding the bundled dataset.
    pub fn seeded() -> Result<Self, StoreError> {
        Ok(Self::new(Catalog::seeded()?))
    }
}

#[async_trait]
impl ShortcutStore for MemoryStore {
    async fn list(&self) -> Result<Vec<ShortcutRecord>, StoreError> {
        Ok(self.inner.read().await.list())
    }

    async fn get(&self, id: i64) -> Result<Option<ShortcutRecord>, StoreError> {
        Ok(self.inner.read().await.get(id).cloned())
    }

    async fn list_by_category(&self, category: &str) -> Result<Vec<ShortcutRecord>, StoreError> {
        Ok(self.inner.read().await.list_by_category(category))
    }

    async fn list_by_tool(&self, tool: &str) -> Result<Vec<ShortcutRecord>, StoreError> {
        Ok(self.inner.read().await.list_by_tool(tool))
    }

    async fn search(&self, text: &str) -> Result<Vec<ShortcutRecord>, StoreError> {
        Ok(query::search(self.inner.read().await.records(), text))
    }

    async fn popular(&self, limit: usize) -> Result<Vec<ShortcutRecord>, StoreError> {
        Ok(query::top_popular(self.inner.read().await.records(), limit))
    }

    async fn query(&self, filter: &QueryFilter) -> Result<Vec<ShortcutRecord>, StoreError> {
        Ok(query::run_query(self.inner.read().await.records(), filter))
    }

    async fn create(&self, data: NewShortcut) -> Result<ShortcutRecord, StoreError> {
        Ok(self.inner.write().await.create(data))
    }

    async fn update(
        &self,
        id: i64,
        patch: ShortcutPatch,
    ) -> Result<Option<ShortcutRecord>, StoreError> {
        Ok(self.inner.write().await.update(id, patch))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.delete(id))
    }

    async fn increment_usage(&self, id: i64) -> Result<Option<UsageRecord>, StoreError> {
        Ok(self.inner.write().await.increment_usage(id))
    }

    async fn get_usage(&self, id: i64) -> Result<Option<UsageRecord>, StoreError> {
        Ok(self.inner.read().await.usage(id).cloned())
    }

    async fn list_favorites(&self, user_id: &str) -> Result<Vec<FavoriteRecord>, StoreError> {
        Ok(self.inner.read().await.favorites(user_id))
    }

    async fn add_favorite(
        &self,
        shortcut_id: i64,
        user_id: &str,
    ) -> Result<FavoriteInsert, StoreError> {
        Ok(self.inner.write().await.add_favorite(shortcut_id, user_id))
    }

    async fn remove_favorite(&self, shortcut_id: i64, user_id: &str) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.remove_favorite(shortcut_id, user_id))
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.inner.read().await.len())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn concurrent_usage_events_are_not_lost() {
        let store = MemoryStore::default();
        let record = store
            .create(NewShortcut::new("Windows", "os", "복사", "copy").with_popularity(10))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.increment_usage(record.id).await.unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let usage = store.get_usage(record.id).await.unwrap().unwrap();
        let stored = store.get(record.id).await.unwrap().unwrap();
        assert_eq!(usage.usage_count, 50);
        assert_eq!(stored.popularity, 60);
    }

    #[tokio::test]
    async fn seeded_store_answers_queries() {
        let store = MemoryStore::seeded().unwrap();
        assert!(store.count().await.unwrap() > 30);

        let found = store.search("ctrl+c").await.unwrap();
        assert!(found.iter().any(|r| r.title == "복사"));

        let popular = store.popular(3).await.unwrap();
        assert_eq!(popular.len(), 3);
        assert!(popular[0].popularity >= popular[1].popularity);

        let ide = store
            .query(&QueryFilter::new().category("ide"))
            .await
            .unwrap();
        assert!(!ide.is_empty());
        assert!(ide.iter().all(|r| r.category == "ide"));
    }
}
