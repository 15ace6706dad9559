//! In-memory catalog of shortcuts, favorites and usage counters.
//!
//! [`Catalog`] is plain owned data with synchronous methods. Callers that
//! share it across tasks wrap it in a lock and hold the write guard for the
//! whole of each mutating call, which keeps two-part updates such as
//! [`Catalog::increment_usage`] indivisible.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use strum::IntoEnumIterator;
use tracing::debug;

use crate::error::CatalogError;
use crate::seed::seed_shortcuts;
use crate::types::{
    Category, FavoriteInsert, FavoriteRecord, NewShortcut, ShortcutPatch, ShortcutRecord,
    UsageRecord,
};

#[derive(Debug, Clone)]
pub struct Catalog {
    shortcuts: BTreeMap<i64, ShortcutRecord>,
    favorites: Vec<FavoriteRecord>,
    /// Keyed by shortcut id.
    usage: BTreeMap<i64, UsageRecord>,
    next_shortcut_id: i64,
    next_favorite_id: i64,
    next_usage_id: i64,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    /// An empty catalog. Ids start at 1.
    pub fn new() -> Self {
        Self {
            shortcuts: BTreeMap::new(),
            favorites: Vec::new(),
            usage: BTreeMap::new(),
            next_shortcut_id: 1,
            next_favorite_id: 1,
            next_usage_id: 1,
        }
    }

    /// A catalog holding the bundled dataset.
    pub fn seeded() -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        let seed = seed_shortcuts()?;
        debug!(count = seed.len(), "seeding catalog");
        for shortcut in seed {
            catalog.create(shortcut);
        }
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.shortcuts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shortcuts.is_empty()
    }

    /// All records in ascending id order.
    pub fn records(&self) -> impl Iterator<Item = &ShortcutRecord> {
        self.shortcuts.values()
    }

    pub fn list(&self) -> Vec<ShortcutRecord> {
        self.records().cloned().collect()
    }

    pub fn get(&self, id: i64) -> Option<&ShortcutRecord> {
        self.shortcuts.get(&id)
    }

    pub fn list_by_category(&self, category: &str) -> Vec<ShortcutRecord> {
        self.records()
            .filter(|r| r.category == category)
            .cloned()
            .collect()
    }

    /// Exact, case-sensitive match on the tool name.
    pub fn list_by_tool(&self, tool: &str) -> Vec<ShortcutRecord> {
        self.records().filter(|r| r.tool == tool).cloned().collect()
    }

    /// Store a new record under a fresh id. Ids are never reused, even after
    /// deletion.
    pub fn create(&mut self, data: NewShortcut) -> ShortcutRecord {
        let id = self.next_shortcut_id;
        self.next_shortcut_id += 1;
        let record = data.into_record(id);
        self.shortcuts.insert(id, record.clone());
        record
    }

    pub fn update(&mut self, id: i64, patch: ShortcutPatch) -> Option<ShortcutRecord> {
        let record = self.shortcuts.get_mut(&id)?;
        patch.apply_to(record);
        Some(record.clone())
    }

    /// Remove a record together with its usage counter and favorites.
    /// Returns `false` when the id is unknown.
    pub fn delete(&mut self, id: i64) -> bool {
        if self.shortcuts.remove(&id).is_none() {
            return false;
        }
        self.usage.remove(&id);
        self.favorites.retain(|f| f.shortcut_id != id);
        true
    }

    /// Bump the usage counter and the record's popularity together.
    ///
    /// Unknown ids leave the catalog untouched and return `None`.
    pub fn increment_usage(&mut self, shortcut_id: i64) -> Option<UsageRecord> {
        let record = self.shortcuts.get_mut(&shortcut_id)?;
        record.popularity = record.popularity.saturating_add(1);

        let now = Utc::now();
        let usage = self.usage.entry(shortcut_id).or_insert_with(|| {
            let id = self.next_usage_id;
            self.next_usage_id += 1;
            UsageRecord {
                id,
                shortcut_id,
                usage_count: 0,
                last_used: now,
            }
        });
        usage.usage_count = usage.usage_count.saturating_add(1);
        usage.last_used = now;
        Some(usage.clone())
    }

    pub fn usage(&self, shortcut_id: i64) -> Option<&UsageRecord> {
        self.usage.get(&shortcut_id)
    }

    /// Favorites of `user_id`, oldest first.
    pub fn favorites(&self, user_id: &str) -> Vec<FavoriteRecord> {
        self.favorites
            .iter()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn favorite_ids(&self, user_id: &str) -> BTreeSet<i64> {
        self.favorites
            .iter()
            .filter(|f| f.user_id == user_id)
            .map(|f| f.shortcut_id)
            .collect()
    }

    /// Favorite a shortcut for a user. A (shortcut, user) pair is stored at
    /// most once.
    pub fn add_favorite(&mut self, shortcut_id: i64, user_id: &str) -> FavoriteInsert {
        if !self.shortcuts.contains_key(&shortcut_id) {
            return FavoriteInsert::UnknownShortcut;
        }
        if let Some(existing) = self
            .favorites
            .iter()
            .find(|f| f.shortcut_id == shortcut_id && f.user_id == user_id)
        {
            return FavoriteInsert::AlreadyPresent(existing.clone());
        }

        let favorite = FavoriteRecord {
            id: self.next_favorite_id,
            shortcut_id,
            user_id: user_id.to_owned(),
            created_at: Utc::now(),
        };
        self.next_favorite_id += 1;
        self.favorites.push(favorite.clone());
        FavoriteInsert::Created(favorite)
    }

    pub fn remove_favorite(&mut self, shortcut_id: i64, user_id: &str) -> bool {
        let before = self.favorites.len();
        self.favorites
            .retain(|f| !(f.shortcut_id == shortcut_id && f.user_id == user_id));
        self.favorites.len() != before
    }

    /// Record counts for every known category plus any extra category found
    /// in the catalog, known categories first.
    pub fn category_counts(&self) -> Vec<(String, usize)> {
        category_counts(self.records())
    }
}

/// Count records per category. Known categories are always listed, in their
/// declared order, followed by unknown ones in name order.
pub fn category_counts<'a, I>(records: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a ShortcutRecord>,
{
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for record in records {
        *counts.entry(record.category.clone()).or_default() += 1;
    }

    let mut out: Vec<(String, usize)> = Category::iter()
        .map(|c| {
            let name = c.as_str();
            (name.to_owned(), counts.remove(name).unwrap_or(0))
        })
        .collect();
    out.extend(counts);
    out
}
