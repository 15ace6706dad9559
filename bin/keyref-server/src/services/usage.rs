//! Usage/popularity tracking.

use std::sync::Arc;

use tracing::debug;

use crate::entities::{ShortcutStore, StoreError};

/// Couples usage events to the store's popularity counter.
#[derive(Clone)]
pub struct UsageTracker {
    store: Arc<dyn ShortcutStore>,
}

impl std::fmt::Debug for UsageTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("UsageTracker")
    }
}

impl UsageTracker {
    pub fn new(store: Arc<dyn ShortcutStore>) -> Self {
        Self { store }
    }

    /// Record one use of `shortcut_id`.
    ///
    /// Unknown ids are ignored: the caller sees success and nothing is
    /// stored. Backend failures still propagate.
    pub async fn record_usage(&self, shortcut_id: i64) -> Result<(), StoreError> {
        match self.store.increment_usage(shortcut_id).await? {
            Some(usage) => {
                debug!(shortcut_id, usage_count = usage.usage_count, "usage recorded");
            }
            None => {
                debug!(shortcut_id, "usage for unknown shortcut ignored");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::entities::MemoryStore;
    use keyref_core::NewShortcut;
    use tracing_test::traced_test;

    #[tokio::test]
    #[traced_test]
    async fn unknown_ids_are_swallowed() {
        let store: Arc<dyn ShortcutStore> = Arc::new(MemoryStore::default());
        let tracker = UsageTracker::new(store.clone());

        tracker.record_usage(12345).await.expect("no error for unknown id");
        assert!(store.get_usage(12345).await.unwrap().is_none());
        assert!(logs_contain("usage for unknown shortcut ignored"));
    }

    #[tokio::test]
    async fn known_ids_bump_popularity() {
        let store: Arc<dyn ShortcutStore> = Arc::new(MemoryStore::default());
        let record = store
            .create(NewShortcut::new("Slack", "communication", "검색", "search"))
            .await
            .unwrap();
        let tracker = UsageTracker::new(store.clone());

        tracker.record_usage(record.id).await.unwrap();
        tracker.record_usage(record.id).await.unwrap();

        assert_eq!(store.get(record.id).await.unwrap().unwrap().popularity, 2);
        assert_eq!(store.get_usage(record.id).await.unwrap().unwrap().usage_count, 2);
    }
}
