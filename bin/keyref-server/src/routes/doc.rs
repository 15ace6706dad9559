use axum::Json;
use utoipa::OpenApi;

use crate::routes::{categories, favorites, health, shortcuts};

#[derive(OpenApi)]
#[openapi(info(
    title = "keyref-server",
    description = "Keyboard shortcut reference API",
    version = "0.1.0",
))]
pub struct ApiDoc;

pub fn get_docs() -> utoipa::openapi::OpenApi {
    let mut root = ApiDoc::openapi();
    root.merge(health::HealthApi::openapi());
    root.merge(shortcuts::ShortcutsApi::openapi());
    root.merge(favorites::FavoritesApi::openapi());
    root.merge(categories::CategoriesApi::openapi());
    root
}

/// Serves the merged document at `/api-docs/openapi.json`.
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(get_docs())
}
