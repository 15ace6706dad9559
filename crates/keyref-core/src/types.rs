use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Operating systems a shortcut can be documented for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
    EnumString, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Os {
    Windows,
    Macos,
    Linux,
}

/// The known catalog categories.
///
/// Records store their category as a plain string so the set stays open to
/// extension; this enum only names the categories the UI knows about.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
    EnumString, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Category {
    Os,
    Ide,
    Office,
    Design,
    Browser,
    Media,
    Communication,
    Productivity,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Trim and lower-case a category name.
pub fn normalize_category(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// A single documented keyboard shortcut.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortcutRecord {
    pub id: i64,
    pub tool: String,
    pub category: String,
    pub title: String,
    pub description: String,
    pub windows_shortcut: Option<String>,
    pub macos_shortcut: Option<String>,
    pub linux_shortcut: Option<String>,
    pub popularity: u32,
    pub verified: bool,
    pub aliases: Vec<String>,
    pub tags: Vec<String>,
}

impl ShortcutRecord {
    /// The key combination for `os`, if one is documented and non-empty.
    pub fn shortcut_for(&self, os: Os) -> Option<&str> {
        let keys = match os {
            Os::Windows => self.windows_shortcut.as_deref(),
            Os::Macos => self.macos_shortcut.as_deref(),
            Os::Linux => self.linux_shortcut.as_deref(),
        };
        keys.filter(|k| !k.is_empty())
    }

    pub fn has_shortcut_for(&self, os: Os) -> bool {
        self.shortcut_for(os).is_some()
    }

    /// All documented key combinations, in Windows, macOS, Linux order.
    pub fn key_combinations(&self) -> impl Iterator<Item = &str> {
        [
            self.windows_shortcut.as_deref(),
            self.macos_shortcut.as_deref(),
            self.linux_shortcut.as_deref(),
        ]
        .into_iter()
        .flatten()
    }
}

/// Data for a record that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewShortcut {
    pub tool: String,
    pub category: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub windows_shortcut: Option<String>,
    #[serde(default)]
    pub macos_shortcut: Option<String>,
    #[serde(default)]
    pub linux_shortcut: Option<String>,
    #[serde(default)]
    pub popularity: u32,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewShortcut {
    pub fn new(
        tool: impl Into<String>,
        category: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            tool: tool.into(),
            category: category.into(),
            title: title.into(),
            description: description.into(),
            windows_shortcut: None,
            macos_shortcut: None,
            linux_shortcut: None,
            popularity: 0,
            verified: false,
            aliases: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn with_keys(
        mut self,
        windows: Option<&str>,
        macos: Option<&str>,
        linux: Option<&str>,
    ) -> Self {
        self.windows_shortcut = windows.map(str::to_owned);
        self.macos_shortcut = macos.map(str::to_owned);
        self.linux_shortcut = linux.map(str::to_owned);
        self
    }

    pub fn with_popularity(mut self, popularity: u32) -> Self {
        self.popularity = popularity;
        self
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn into_record(self, id: i64) -> ShortcutRecord {
        ShortcutRecord {
            id,
            tool: self.tool,
            category: self.category,
            title: self.title,
            description: self.description,
            windows_shortcut: self.windows_shortcut,
            macos_shortcut: self.macos_shortcut,
            linux_shortcut: self.linux_shortcut,
            popularity: self.popularity,
            verified: self.verified,
            aliases: self.aliases,
            tags: self.tags,
        }
    }
}

/// A partial update. `None` leaves a field untouched.
///
/// The platform shortcut fields are doubly optional: `Some(None)` clears the
/// stored key combination, `None` keeps it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortcutPatch {
    pub tool: Option<String>,
    pub category: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub windows_shortcut: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub macos_shortcut: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub linux_shortcut: Option<Option<String>>,
    pub verified: Option<bool>,
    pub aliases: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}

impl ShortcutPatch {
    /// Merge the provided fields onto `record`. The id and popularity are
    /// never touched.
    pub fn apply_to(self, record: &mut ShortcutRecord) {
        if let Some(tool) = self.tool {
            record.tool = tool;
        }
        if let Some(category) = self.category {
            record.category = category;
        }
        if let Some(title) = self.title {
            record.title = title;
        }
        if let Some(description) = self.description {
            record.description = description;
        }
        if let Some(keys) = self.windows_shortcut {
            record.windows_shortcut = keys;
        }
        if let Some(keys) = self.macos_shortcut {
            record.macos_shortcut = keys;
        }
        if let Some(keys) = self.linux_shortcut {
            record.linux_shortcut = keys;
        }
        if let Some(verified) = self.verified {
            record.verified = verified;
        }
        if let Some(aliases) = self.aliases {
            record.aliases = aliases;
        }
        if let Some(tags) = self.tags {
            record.tags = tags;
        }
    }
}

/// Deserialize a present field as `Some(value)`, so that `null` becomes
/// `Some(None)` while an absent field (with `#[serde(default)]`) stays `None`.
pub fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

/// A user's bookmark of a shortcut.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRecord {
    pub id: i64,
    pub shortcut_id: i64,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

/// Outcome of adding a favorite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FavoriteInsert {
    Created(FavoriteRecord),
    /// The (shortcut, user) pair was already favorited; carries the stored record.
    AlreadyPresent(FavoriteRecord),
    UnknownShortcut,
}

/// Per-shortcut usage counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    pub id: i64,
    pub shortcut_id: i64,
    pub usage_count: u32,
    pub last_used: DateTime<Utc>,
}
