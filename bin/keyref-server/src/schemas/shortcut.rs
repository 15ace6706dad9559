use std::collections::BTreeSet;

use keyref_core::{
    normalize_category, NewShortcut, Os, ShortcutPatch, ShortcutRecord, ToolGroup, UsageRecord,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

/// Default user of the reference web client.
pub const DEFAULT_USER_ID: &str = "default-user";

/// Upper bound on a platform key-combination string. Must match the
/// `length(max)` rules on [`CreateShortcutRequest`].
const MAX_KEY_LEN: usize = 100;

/// Wire form of [`ShortcutRecord`]. keyref-core stays free of OpenAPI
/// derives, so the schema lives here and the field layout must match the
/// record's serde form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShortcutResponse {
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

impl From<ShortcutRecord> for ShortcutResponse {
    fn from(r: ShortcutRecord) -> Self {
        Self {
            id: r.id,
            tool: r.tool,
            category: r.category,
            title: r.title,
            description: r.description,
            windows_shortcut: r.windows_shortcut,
            macos_shortcut: r.macos_shortcut,
            linux_shortcut: r.linux_shortcut,
            popularity: r.popularity,
            verified: r.verified,
            aliases: r.aliases,
            tags: r.tags,
        }
    }
}

pub fn to_responses(records: Vec<ShortcutRecord>) -> Vec<ShortcutResponse> {
    records.into_iter().map(ShortcutResponse::from).collect()
}

/// Body of `POST /api/shortcuts`. Ids and popularity are assigned by the
/// server.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateShortcutRequest {
    #[validate(length(min = 1, max = 100))]
    pub tool: String,
    #[validate(length(min = 1, max = 50), custom(function = "not_blank"))]
    pub category: String,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 1000))]
    pub description: String,
    #[validate(length(max = 100))]
    pub windows_shortcut: Option<String>,
    #[validate(length(max = 100))]
    pub macos_shortcut: Option<String>,
    #[validate(length(max = 100))]
    pub linux_shortcut: Option<String>,
    pub verified: Option<bool>,
    pub aliases: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}

impl From<CreateShortcutRequest> for NewShortcut {
    fn from(req: CreateShortcutRequest) -> Self {
        NewShortcut {
            tool: req.tool,
            category: normalize_category(&req.category),
            title: req.title,
            description: req.description,
            windows_shortcut: req.windows_shortcut,
            macos_shortcut: req.macos_shortcut,
            linux_shortcut: req.linux_shortcut,
            popularity: 0,
            verified: req.verified.unwrap_or(false),
            aliases: req.aliases.unwrap_or_default(),
            tags: req.tags.unwrap_or_default(),
        }
    }
}

/// Body of `PUT /api/shortcuts/{id}`. Absent fields are left unchanged; an
/// explicit `null` clears a platform shortcut.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_key_lengths"))]
pub struct UpdateShortcutRequest {
    #[validate(length(min = 1, max = 100))]
    pub tool: Option<String>,
    #[validate(length(min = 1, max = 50), custom(function = "not_blank"))]
    pub category: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "keyref_core::double_option")]
    #[schema(value_type = Option<String>)]
    pub windows_shortcut: Option<Option<String>>,
    #[serde(default, deserialize_with = "keyref_core::double_option")]
    #[schema(value_type = Option<String>)]
    pub macos_shortcut: Option<Option<String>>,
    #[serde(default, deserialize_with = "keyref_core::double_option")]
    #[schema(value_type = Option<String>)]
    pub linux_shortcut: Option<Option<String>>,
    pub verified: Option<bool>,
    pub aliases: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}

impl From<UpdateShortcutRequest> for ShortcutPatch {
    fn from(req: UpdateShortcutRequest) -> Self {
        ShortcutPatch {
            tool: req.tool,
            category: req.category.as_deref().map(normalize_category),
            title: req.title,
            description: req.description,
            windows_shortcut: req.windows_shortcut,
            macos_shortcut: req.macos_shortcut,
            linux_shortcut: req.linux_shortcut,
            verified: req.verified,
            aliases: req.aliases,
            tags: req.tags,
        }
    }
}

/// Categories are trimmed before storage, so whitespace alone is empty.
fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

fn validate_key_lengths(req: &UpdateShortcutRequest) -> Result<(), ValidationError> {
    let too_long = [&req.windows_shortcut, &req.macos_shortcut, &req.linux_shortcut]
        .into_iter()
        .filter_map(|k| k.as_ref().and_then(Option::as_deref))
        .any(|v| v.chars().count() > MAX_KEY_LEN);
    if too_long {
        return Err(ValidationError::new("key_length"));
    }
    Ok(())
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Text to look for in titles, descriptions, tools, keys, aliases and tags.
    pub q: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PopularQuery {
    /// Number of records to return; missing, invalid or zero means 10.
    pub limit: Option<String>,
}

/// Parameters of the full filter pipeline.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct FilterQuery {
    pub q: Option<String>,
    /// A category name, or `all`.
    pub category: Option<String>,
    /// Comma-separated OS names (`windows`, `macos`, `linux`).
    pub os: Option<String>,
    pub favorites_only: Option<bool>,
    /// Whose favorites `favoritesOnly` refers to (default `default-user`).
    pub user_id: Option<String>,
    /// Group the result by tool.
    pub grouped: Option<bool>,
}

impl FilterQuery {
    /// Parse the `os` list. Blank entries are skipped; an unknown name is
    /// returned as the error.
    pub fn os_set(&self) -> Result<BTreeSet<Os>, String> {
        let Some(raw) = self.os.as_deref() else {
            return Ok(BTreeSet::new());
        };
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<Os>().map_err(|_| s.to_owned()))
            .collect()
    }

    pub fn user_id(&self) -> &str {
        self.user_id
            .as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or(DEFAULT_USER_ID)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ToolGroupResponse {
    pub tool: String,
    pub shortcuts: Vec<ShortcutResponse>,
}

impl From<ToolGroup> for ToolGroupResponse {
    fn from(g: ToolGroup) -> Self {
        Self {
            tool: g.tool,
            shortcuts: to_responses(g.shortcuts),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UsageResponse {
    pub id: i64,
    pub shortcut_id: i64,
    pub usage_count: u32,
    pub last_used: String,
}

impl From<UsageRecord> for UsageResponse {
    fn from(u: UsageRecord) -> Self {
        Self {
            id: u.id,
            shortcut_id: u.shortcut_id,
            usage_count: u.usage_count,
            last_used: u.last_used.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn create_request_applies_defaults_and_normalizes() {
        let req: CreateShortcutRequest = serde_json::from_str(
            r#"{"tool":"Figma","category":" Design ","title":"프레임","description":"",
                "macosShortcut":"F","popularity":999}"#,
        )
        .unwrap();
        assert!(req.validate().is_ok());
        let new: NewShortcut = req.into();
        assert_eq!(new.category, "design");
        assert_eq!(new.popularity, 0);
        assert!(!new.verified);
        assert!(new.aliases.is_empty());
        assert_eq!(new.windows_shortcut, None);
    }

    #[test]
    fn create_request_rejects_empty_title() {
        let req: CreateShortcutRequest = serde_json::from_str(
            r#"{"tool":"Figma","category":"design","title":"","description":"d"}"#,
        )
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn create_request_requires_fields() {
        let parsed = serde_json::from_str::<CreateShortcutRequest>(r#"{"tool":"Figma"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn update_request_null_clears_key() {
        let req: UpdateShortcutRequest =
            serde_json::from_str(r#"{"linuxShortcut": null, "category": "IDE"}"#).unwrap();
        let patch: ShortcutPatch = req.into();
        assert_eq!(patch.linux_shortcut, Some(None));
        assert_eq!(patch.windows_shortcut, None);
        assert_eq!(patch.category.as_deref(), Some("ide"));
    }

    #[test]
    fn blank_category_is_rejected() {
        let create: CreateShortcutRequest = serde_json::from_str(
            r#"{"tool":"Figma","category":"   ","title":"t","description":""}"#,
        )
        .unwrap();
        let errors = create.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("category"));

        let update: UpdateShortcutRequest =
            serde_json::from_str(r#"{"category": " \t "}"#).unwrap();
        assert!(update.validate().is_err());
    }

    #[test]
    fn update_request_caps_key_length_like_create() {
        let long = "K".repeat(MAX_KEY_LEN + 1);
        let update: UpdateShortcutRequest =
            serde_json::from_value(serde_json::json!({ "windowsShortcut": long })).unwrap();
        assert!(update.validate().is_err());

        let create: CreateShortcutRequest = serde_json::from_value(serde_json::json!({
            "tool": "Figma", "category": "design", "title": "t", "description": "",
            "windowsShortcut": long,
        }))
        .unwrap();
        assert!(create.validate().is_err());

        let ok: UpdateShortcutRequest = serde_json::from_value(serde_json::json!({
            "windowsShortcut": "K".repeat(MAX_KEY_LEN),
            "macosShortcut": null,
        }))
        .unwrap();
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn response_matches_record_serialization() {
        let record = NewShortcut::new("Windows", "os", "복사", "copy")
            .with_keys(Some("Ctrl+C"), Some("Cmd+C"), None)
            .with_aliases(["copy"])
            .into_record(7);
        let from_record = serde_json::to_value(&record).unwrap();
        let from_response = serde_json::to_value(ShortcutResponse::from(record)).unwrap();
        assert_eq!(from_record, from_response);
    }

    #[test]
    fn os_list_parsing() {
        let q = FilterQuery {
            os: Some("windows, MacOS,,".into()),
            ..Default::default()
        };
        assert_eq!(q.os_set().unwrap(), BTreeSet::from([Os::Windows, Os::Macos]));

        let bad = FilterQuery {
            os: Some("windows,amiga".into()),
            ..Default::default()
        };
        assert_eq!(bad.os_set().unwrap_err(), "amiga");
        assert_eq!(bad.user_id(), DEFAULT_USER_ID);
    }
}
