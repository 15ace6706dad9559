use keyref_core::FavoriteRecord;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFavoriteRequest {
    #[validate(range(min = 1))]
    pub shortcut_id: i64,
    #[validate(length(min = 1, max = 128))]
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteResponse {
    pub id: i64,
    pub shortcut_id: i64,
    pub user_id: String,
    pub created_at: String,
}

impl From<FavoriteRecord> for FavoriteResponse {
    fn from(f: FavoriteRecord) -> Self {
        Self {
            id: f.id,
            shortcut_id: f.shortcut_id,
            user_id: f.user_id,
            created_at: f.created_at.to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rejects_blank_user_and_bad_id() {
        let req: CreateFavoriteRequest =
            serde_json::from_str(r#"{"shortcutId": 0, "userId": ""}"#).unwrap();
        let errors = req.validate().unwrap_err();
        assert_eq!(errors.field_errors().len(), 2);
    }
}
