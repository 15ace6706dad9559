//! SQLite implementation of [`ShortcutStore`].
//!
//! Uses [`sqlx`] with the `sqlite` feature. Migrations are embedded at compile
//! time from `./migrations` and run by [`SqliteStore::connect`].
//!
//! # Column encoding
//!
//! The core types are the canonical representation. At this boundary
//! `aliases` and `tags` become JSON text, `verified` an INTEGER 0/1, and
//! timestamps RFC 3339 text.
//!
//! # Queries
//!
//! The runtime-checked `sqlx::query` form is used so that no `DATABASE_URL`
//! is needed at compile time.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use keyref_core::{
    seed_shortcuts, FavoriteInsert, FavoriteRecord, NewShortcut, ShortcutPatch, ShortcutRecord,
    UsageRecord,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{FromRow, Sqlite, Transaction};
use tracing::{info, warn};

use super::{ShortcutStore, StoreError};

const SHORTCUT_COLUMNS: &str = "id, tool, category, title, description, \
     windows_shortcut, macos_shortcut, linux_shortcut, popularity, verified, aliases, tags";

/// SQLite-backed shortcut store.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the SQLite database at `url` and run pending migrations.
    ///
    /// `url` should be a sqlx-compatible SQLite URL, e.g. `"sqlite://keyref.db"`
    /// or `"sqlite::memory:"` for tests.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every connection to an in-memory database sees its own empty
        // database, so those get exactly one long-lived connection.
        let pool = if is_memory_url(url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        // Path is resolved relative to CARGO_MANIFEST_DIR at compile time.
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    /// Insert the bundled dataset when the `shortcuts` table is empty.
    /// Returns the number of inserted records.
    pub async fn seed_if_empty(&self) -> Result<usize, StoreError> {
        if self.count().await? > 0 {
            return Ok(0);
        }
        let seed = seed_shortcuts()?;
        let mut tx = self.pool.begin().await?;
        for shortcut in &seed {
            insert_shortcut(&mut tx, shortcut).await?;
        }
        tx.commit().await?;
        info!(count = seed.len(), "seeded sqlite catalog");
        Ok(seed.len())
    }

    async fn fetch_shortcuts(
        &self,
        filter: &str,
        bind: Option<&str>,
    ) -> Result<Vec<ShortcutRecord>, StoreError> {
        let sql = format!("SELECT {SHORTCUT_COLUMNS} FROM shortcuts {filter} ORDER BY id");
        let mut query = sqlx::query_as::<_, ShortcutRow>(&sql);
        if let Some(value) = bind {
            query = query.bind(value);
        }
        query
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(ShortcutRow::into_record)
            .collect()
    }
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

#[derive(Debug, FromRow)]
struct ShortcutRow {
    id: i64,
    tool: String,
    category: String,
    title: String,
    description: String,
    windows_shortcut: Option<String>,
    macos_shortcut: Option<String>,
    linux_shortcut: Option<String>,
    popularity: u32,
    verified: bool,
    aliases: String,
    tags: String,
}

impl ShortcutRow {
    fn into_record(self) -> Result<ShortcutRecord, StoreError> {
        Ok(ShortcutRecord {
            id: self.id,
            tool: self.tool,
            category: self.category,
            title: self.title,
            description: self.description,
            windows_shortcut: self.windows_shortcut,
            macos_shortcut: self.macos_shortcut,
            linux_shortcut: self.linux_shortcut,
            popularity: self.popularity,
            verified: self.verified,
            aliases: decode_list(&self.aliases)?,
            tags: decode_list(&self.tags)?,
        })
    }
}

/// Empty text decodes as an empty list.
fn decode_list(raw: &str) -> Result<Vec<String>, StoreError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(raw)?)
}

fn parse_rfc3339_or_now(raw: &str, field: &'static str) -> DateTime<Utc> {
    raw.parse().unwrap_or_else(|e: chrono::ParseError| {
        warn!(raw = %raw, error = %e, field, "failed to parse timestamp; using now");
        Utc::now()
    })
}

async fn insert_shortcut(
    tx: &mut Transaction<'_, Sqlite>,
    data: &NewShortcut,
) -> Result<i64, StoreError> {
    let result = sqlx::query(
        "INSERT INTO shortcuts \
         (tool, category, title, description, windows_shortcut, macos_shortcut, linux_shortcut, \
          popularity, verified, aliases, tags) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
    )
    .bind(&data.tool)
    .bind(&data.category)
    .bind(&data.title)
    .bind(&data.description)
    .bind(&data.windows_shortcut)
    .bind(&data.macos_shortcut)
    .bind(&data.linux_shortcut)
    .bind(data.popularity)
    .bind(data.verified)
    .bind(serde_json::to_string(&data.aliases)?)
    .bind(serde_json::to_string(&data.tags)?)
    .execute(&mut **tx)
    .await?;
    Ok(result.last_insert_rowid())
}

async fn fetch_usage(
    tx: &mut Transaction<'_, Sqlite>,
    shortcut_id: i64,
) -> Result<Option<UsageRecord>, StoreError> {
    let row: Option<(i64, i64, u32, String)> = sqlx::query_as(
        "SELECT id, shortcut_id, usage_count, last_used FROM shortcut_usage WHERE shortcut_id = ?1",
    )
    .bind(shortcut_id)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(row.map(usage_from_row))
}

fn usage_from_row((id, shortcut_id, usage_count, last_used): (i64, i64, u32, String)) -> UsageRecord {
    UsageRecord {
        id,
        shortcut_id,
        usage_count,
        last_used: parse_rfc3339_or_now(&last_used, "last_used"),
    }
}

fn favorite_from_row((id, shortcut_id, user_id, created_at): (i64, i64, String, String)) -> FavoriteRecord {
    FavoriteRecord {
        id,
        shortcut_id,
        user_id,
        created_at: parse_rfc3339_or_now(&created_at, "created_at"),
    }
}

#[async_trait]
impl ShortcutStore for SqliteStore {
    async fn list(&self) -> Result<Vec<ShortcutRecord>, StoreError> {
        self.fetch_shortcuts("", None).await
    }

    async fn get(&self, id: i64) -> Result<Option<ShortcutRecord>, StoreError> {
        let sql = format!("SELECT {SHORTCUT_COLUMNS} FROM shortcuts WHERE id = ?1");
        sqlx::query_as::<_, ShortcutRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(ShortcutRow::into_record)
            .transpose()
    }

    async fn list_by_category(&self, category: &str) -> Result<Vec<ShortcutRecord>, StoreError> {
        self.fetch_shortcuts("WHERE category = ?1", Some(category)).await
    }

    async fn list_by_tool(&self, tool: &str) -> Result<Vec<ShortcutRecord>, StoreError> {
        self.fetch_shortcuts("WHERE tool = ?1", Some(tool)).await
    }

    async fn create(&self, data: NewShortcut) -> Result<ShortcutRecord, StoreError> {
        let mut tx = self.pool.begin().await?;
        let id = insert_shortcut(&mut tx, &data).await?;
        tx.commit().await?;
        Ok(data.into_record(id))
    }

    async fn update(
        &self,
        id: i64,
        patch: ShortcutPatch,
    ) -> Result<Option<ShortcutRecord>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let sql = format!("SELECT {SHORTCUT_COLUMNS} FROM shortcuts WHERE id = ?1");
        let Some(row) = sqlx::query_as::<_, ShortcutRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let mut record = row.into_record()?;
        patch.apply_to(&mut record);

        sqlx::query(
            "UPDATE shortcuts SET tool = ?1, category = ?2, title = ?3, description = ?4, \
             windows_shortcut = ?5, macos_shortcut = ?6, linux_shortcut = ?7, verified = ?8, \
             aliases = ?9, tags = ?10 WHERE id = ?11",
        )
        .bind(&record.tool)
        .bind(&record.category)
        .bind(&record.title)
        .bind(&record.description)
        .bind(&record.windows_shortcut)
        .bind(&record.macos_shortcut)
        .bind(&record.linux_shortcut)
        .bind(record.verified)
        .bind(serde_json::to_string(&record.aliases)?)
        .bind(serde_json::to_string(&record.tags)?)
        .bind(id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(Some(record))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        // Favorites and usage rows go with it (ON DELETE CASCADE).
        let result = sqlx::query("DELETE FROM shortcuts WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn increment_usage(&self, id: i64) -> Result<Option<UsageRecord>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let bumped = sqlx::query("UPDATE shortcuts SET popularity = popularity + 1 WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if bumped.rows_affected() == 0 {
            // Dropping the transaction rolls it back.
            return Ok(None);
        }

        sqlx::query(
            "INSERT INTO shortcut_usage (shortcut_id, usage_count, last_used) VALUES (?1, 1, ?2) \
             ON CONFLICT(shortcut_id) DO UPDATE SET usage_count = usage_count + 1, \
             last_used = excluded.last_used",
        )
        .bind(id)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await?;

        let usage = fetch_usage(&mut tx, id).await?;
        tx.commit().await?;
        Ok(usage)
    }

    async fn get_usage(&self, id: i64) -> Result<Option<UsageRecord>, StoreError> {
        let row: Option<(i64, i64, u32, String)> = sqlx::query_as(
            "SELECT id, shortcut_id, usage_count, last_used FROM shortcut_usage \
             WHERE shortcut_id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(usage_from_row))
    }

    async fn list_favorites(&self, user_id: &str) -> Result<Vec<FavoriteRecord>, StoreError> {
        let rows: Vec<(i64, i64, String, String)> = sqlx::query_as(
            "SELECT id, shortcut_id, user_id, created_at FROM favorite_shortcuts \
             WHERE user_id = ?1 ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(favorite_from_row).collect())
    }

    async fn add_favorite(
        &self,
        shortcut_id: i64,
        user_id: &str,
    ) -> Result<FavoriteInsert, StoreError> {
        let mut tx = self.pool.begin().await?;
        let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM shortcuts WHERE id = ?1")
            .bind(shortcut_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Ok(FavoriteInsert::UnknownShortcut);
        }

        let created_at = Utc::now();
        let inserted = sqlx::query(
            "INSERT INTO favorite_shortcuts (shortcut_id, user_id, created_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT(shortcut_id, user_id) DO NOTHING",
        )
        .bind(shortcut_id)
        .bind(user_id)
        .bind(created_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        let outcome = if inserted.rows_affected() == 1 {
            FavoriteInsert::Created(FavoriteRecord {
                id: inserted.last_insert_rowid(),
                shortcut_id,
                user_id: user_id.to_owned(),
                created_at,
            })
        } else {
            let row: (i64, i64, String, String) = sqlx::query_as(
                "SELECT id, shortcut_id, user_id, created_at FROM favorite_shortcuts \
                 WHERE shortcut_id = ?1 AND user_id = ?2",
            )
            .bind(shortcut_id)
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;
            FavoriteInsert::AlreadyPresent(favorite_from_row(row))
        };
        tx.commit().await?;
        Ok(outcome)
    }

    async fn remove_favorite(&self, shortcut_id: i64, user_id: &str) -> Result<bool, StoreError> {
        let result =
            sqlx::query("DELETE FROM favorite_shortcuts WHERE shortcut_id = ?1 AND user_id = ?2")
                .bind(shortcut_id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM shortcuts")
            .fetch_one(&self.pool)
            .await?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use keyref_core::QueryFilter;

    async fn store() -> SqliteStore {
        SqliteStore::connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite")
    }

    fn copy_shortcut() -> NewShortcut {
        NewShortcut::new("Windows", "os", "복사", "copy")
            .with_keys(Some("Ctrl+C"), Some("Cmd+C"), None)
            .with_popularity(100)
            .with_aliases(["copy", "복사하기"])
            .with_tags(["clipboard"])
    }

    #[tokio::test]
    async fn create_get_round_trips_list_columns() {
        let store = store().await;
        let created = store.create(copy_shortcut()).await.unwrap();
        assert_eq!(created.id, 1);

        let fetched = store.get(created.id).await.unwrap().expect("stored");
        assert_eq!(fetched, created);
        assert_eq!(fetched.aliases, vec!["copy", "복사하기"]);
        assert_eq!(fetched.linux_shortcut, None);
    }

    #[tokio::test]
    async fn update_merges_and_misses() {
        let store = store().await;
        let created = store.create(copy_shortcut()).await.unwrap();
        let patch = ShortcutPatch {
            tags: Some(vec!["basic".into()]),
            linux_shortcut: Some(Some("Ctrl+C".into())),
            ..Default::default()
        };
        let updated = store.update(created.id, patch.clone()).await.unwrap().unwrap();
        assert_eq!(updated.tags, vec!["basic"]);
        assert_eq!(updated.linux_shortcut.as_deref(), Some("Ctrl+C"));
        assert_eq!(store.get(created.id).await.unwrap(), Some(updated));
        assert!(store.update(404, patch).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_is_idempotent_and_never_reuses_ids() {
        let store = store().await;
        let created = store.create(copy_shortcut()).await.unwrap();
        store.increment_usage(created.id).await.unwrap();
        store.add_favorite(created.id, "default-user").await.unwrap();

        assert!(store.delete(created.id).await.unwrap());
        assert!(!store.delete(created.id).await.unwrap());
        assert!(store.get(created.id).await.unwrap().is_none());
        assert!(store.get_usage(created.id).await.unwrap().is_none());
        assert!(store.list_favorites("default-user").await.unwrap().is_empty());

        let next = store.create(copy_shortcut()).await.unwrap();
        assert!(next.id > created.id);
    }

    #[tokio::test]
    async fn increment_usage_bumps_both_counters() {
        let store = store().await;
        let created = store.create(copy_shortcut()).await.unwrap();

        let first = store.increment_usage(created.id).await.unwrap().unwrap();
        let second = store.increment_usage(created.id).await.unwrap().unwrap();
        assert_eq!(first.usage_count, 1);
        assert_eq!(second.usage_count, 2);
        assert_eq!(second.id, first.id);
        assert_eq!(store.get(created.id).await.unwrap().unwrap().popularity, 102);

        assert!(store.increment_usage(999).await.unwrap().is_none());
        assert!(store.get_usage(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn favorites_are_unique_per_pair() {
        let store = store().await;
        let created = store.create(copy_shortcut()).await.unwrap();

        let FavoriteInsert::Created(first) =
            store.add_favorite(created.id, "default-user").await.unwrap()
        else {
            panic!("expected a new favorite");
        };
        let again = store.add_favorite(created.id, "default-user").await.unwrap();
        assert!(matches!(again, FavoriteInsert::AlreadyPresent(ref f) if f.id == first.id));
        assert_eq!(
            store.add_favorite(77, "default-user").await.unwrap(),
            FavoriteInsert::UnknownShortcut
        );

        assert_eq!(store.list_favorites("default-user").await.unwrap().len(), 1);
        assert!(store.remove_favorite(created.id, "default-user").await.unwrap());
        assert!(!store.remove_favorite(created.id, "default-user").await.unwrap());
    }

    #[tokio::test]
    async fn seeding_happens_once() {
        let store = store().await;
        let inserted = store.seed_if_empty().await.unwrap();
        assert!(inserted > 30);
        assert_eq!(store.seed_if_empty().await.unwrap(), 0);
        assert_eq!(store.count().await.unwrap(), inserted);

        let by_tool = store.list_by_tool("Visual Studio Code").await.unwrap();
        assert!(!by_tool.is_empty());
        assert!(store.list_by_tool("visual studio code").await.unwrap().is_empty());

        let hits = store.query(&QueryFilter::new().search("복사")).await.unwrap();
        assert!(hits.iter().any(|r| r.windows_shortcut.as_deref() == Some("Ctrl+C")));
    }
}
