use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::schemas::shortcut::CategoryCount;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(list_categories), components(schemas(CategoryCount)))]
pub struct CategoriesApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/categories", get(list_categories))
}

/// Record counts per category, known categories first.
#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "shortcuts",
    responses(
        (status = 200, description = "Counts per category", body = [CategoryCount]),
        (status = 500, description = "Store error"),
    )
)]
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CategoryCount>>, ServerError> {
    let records = state.store.list().await?;
    let counts = keyref_core::category_counts(&records)
        .into_iter()
        .map(|(category, count)| CategoryCount { category, count })
        .collect();
    Ok(Json(counts))
}
