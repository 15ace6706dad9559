//! Request and response bodies of the HTTP API.

pub mod favorite;
pub mod shortcut;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// `{"success": true}` acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
