//! Per-user favorites under `/api/favorites`.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use keyref_core::FavoriteInsert;
use tracing::info;
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::extract::{ValidatedJson, parse_id};
use crate::schemas::SuccessResponse;
use crate::schemas::favorite::{CreateFavoriteRequest, FavoriteResponse};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(list_favorites, add_favorite, remove_favorite),
    components(schemas(CreateFavoriteRequest, FavoriteResponse))
)]
pub struct FavoritesApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/favorites", post(add_favorite))
        // The router needs one name for the shared second segment.
        .route("/favorites/{key}", get(list_favorites))
        .route("/favorites/{key}/{user_id}", delete(remove_favorite))
}

#[utoipa::path(
    get,
    path = "/api/favorites/{user_id}",
    tag = "favorites",
    params(("user_id" = String, Path, description = "Owner of the favorites")),
    responses(
        (status = 200, description = "Favorites of the user, oldest first", body = [FavoriteResponse]),
        (status = 500, description = "Store error"),
    )
)]
pub async fn list_favorites(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<FavoriteResponse>>, ServerError> {
    let favorites = state.store.list_favorites(&user_id).await?;
    Ok(Json(favorites.into_iter().map(FavoriteResponse::from).collect()))
}

/// Favorite a shortcut. Repeating the call for the same pair returns the
/// stored record with 200 instead of creating a duplicate.
#[utoipa::path(
    post,
    path = "/api/favorites",
    tag = "favorites",
    request_body = CreateFavoriteRequest,
    responses(
        (status = 201, description = "Favorite created", body = FavoriteResponse),
        (status = 200, description = "Already a favorite", body = FavoriteResponse),
        (status = 400, description = "Invalid favorite data"),
        (status = 404, description = "Shortcut not found"),
    )
)]
pub async fn add_favorite(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateFavoriteRequest>,
) -> Result<(StatusCode, Json<FavoriteResponse>), ServerError> {
    match state.store.add_favorite(req.shortcut_id, &req.user_id).await? {
        FavoriteInsert::Created(record) => {
            info!(shortcut_id = record.shortcut_id, user_id = %record.user_id, "favorite added");
            Ok((StatusCode::CREATED, Json(record.into())))
        }
        FavoriteInsert::AlreadyPresent(record) => Ok((StatusCode::OK, Json(record.into()))),
        FavoriteInsert::UnknownShortcut => Err(ServerError::NotFound(format!(
            "shortcut {} not found",
            req.shortcut_id
        ))),
    }
}

#[utoipa::path(
    delete,
    path = "/api/favorites/{shortcut_id}/{user_id}",
    tag = "favorites",
    params(
        ("shortcut_id" = i64, Path, description = "Favorited shortcut"),
        ("user_id" = String, Path, description = "Owner of the favorite"),
    ),
    responses(
        (status = 200, description = "Favorite removed", body = SuccessResponse),
        (status = 400, description = "Non-numeric shortcut id"),
        (status = 404, description = "Favorite not found"),
    )
)]
pub async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    Path((shortcut_id, user_id)): Path<(String, String)>,
) -> Result<Json<SuccessResponse>, ServerError> {
    let shortcut_id = parse_id(&shortcut_id)?;
    if !state.store.remove_favorite(shortcut_id, &user_id).await? {
        return Err(ServerError::NotFound("favorite not found".to_owned()));
    }
    Ok(Json(SuccessResponse::ok()))
}
