//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use crate::config::Config;
use crate::entities::ShortcutStore;
use crate::services::UsageTracker;

/// State shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// The shortcut catalog, favorites and usage counters.
    pub store: Arc<dyn ShortcutStore>,
    /// Couples usage events to popularity.
    pub usage: UsageTracker,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn ShortcutStore>) -> Self {
        Self {
            config: Arc::new(config),
            usage: UsageTracker::new(Arc::clone(&store)),
            store,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
