//! Shortcut catalog endpoints under `/api/shortcuts`.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use keyref_core::query::{ALL_CATEGORIES, DEFAULT_POPULAR_LIMIT, group_by_tool};
use keyref_core::QueryFilter;
use serde::Serialize;
use tracing::info;
use utoipa::{OpenApi, ToSchema};

use crate::error::ServerError;
use crate::extract::{ApiQuery, ShortcutId, ValidatedJson};
use crate::schemas::shortcut::{
    CreateShortcutRequest, FilterQuery, PopularQuery, SearchQuery, ShortcutResponse,
    ToolGroupResponse, UpdateShortcutRequest, UsageResponse, to_responses,
};
use crate::schemas::SuccessResponse;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        list_shortcuts,
        list_by_category,
        list_by_tool,
        search_shortcuts,
        popular_shortcuts,
        filter_shortcuts,
        get_shortcut,
        create_shortcut,
        update_shortcut,
        delete_shortcut,
        record_usage,
        get_usage,
    ),
    components(schemas(
        ShortcutResponse,
        CreateShortcutRequest,
        UpdateShortcutRequest,
        ToolGroupResponse,
        FilterResponse,
        UsageResponse,
        SuccessResponse,
    ))
)]
pub struct ShortcutsApi;

/// Register shortcut routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/shortcuts", get(list_shortcuts).post(create_shortcut))
        .route("/shortcuts/category/{category}", get(list_by_category))
        .route("/shortcuts/tool/{tool}", get(list_by_tool))
        .route("/shortcuts/search", get(search_shortcuts))
        .route("/shortcuts/popular", get(popular_shortcuts))
        .route("/shortcuts/filter", get(filter_shortcuts))
        .route(
            "/shortcuts/{id}",
            get(get_shortcut).put(update_shortcut).delete(delete_shortcut),
        )
        .route("/shortcuts/{id}/usage", post(record_usage).get(get_usage))
}

fn not_found(id: i64) -> ServerError {
    ServerError::NotFound(format!("shortcut {id} not found"))
}

#[utoipa::path(
    get,
    path = "/api/shortcuts",
    tag = "shortcuts",
    responses(
        (status = 200, description = "Full catalog", body = [ShortcutResponse]),
        (status = 500, description = "Store error"),
    )
)]
pub async fn list_shortcuts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ShortcutResponse>>, ServerError> {
    Ok(Json(to_responses(state.store.list().await?)))
}

#[utoipa::path(
    get,
    path = "/api/shortcuts/category/{category}",
    tag = "shortcuts",
    params(("category" = String, Path, description = "Exact category name")),
    responses(
        (status = 200, description = "Records in the category", body = [ShortcutResponse]),
        (status = 500, description = "Store error"),
    )
)]
pub async fn list_by_category(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> Result<Json<Vec<ShortcutResponse>>, ServerError> {
    Ok(Json(to_responses(state.store.list_by_category(&category).await?)))
}

#[utoipa::path(
    get,
    path = "/api/shortcuts/tool/{tool}",
    tag = "shortcuts",
    params(("tool" = String, Path, description = "URL-encoded tool name, matched exactly")),
    responses(
        (status = 200, description = "Records of the tool", body = [ShortcutResponse]),
        (status = 500, description = "Store error"),
    )
)]
pub async fn list_by_tool(
    State(state): State<Arc<AppState>>,
    Path(tool): Path<String>,
) -> Result<Json<Vec<ShortcutResponse>>, ServerError> {
    Ok(Json(to_responses(state.store.list_by_tool(&tool).await?)))
}

#[utoipa::path(
    get,
    path = "/api/shortcuts/search",
    tag = "shortcuts",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matches in catalog order", body = [ShortcutResponse]),
        (status = 400, description = "Missing search query"),
        (status = 500, description = "Store error"),
    )
)]
pub async fn search_shortcuts(
    State(state): State<Arc<AppState>>,
    ApiQuery(q): ApiQuery<SearchQuery>,
) -> Result<Json<Vec<ShortcutResponse>>, ServerError> {
    let text = q
        .q
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ServerError::BadRequest("search query is required".to_owned()))?;
    Ok(Json(to_responses(state.store.search(&text).await?)))
}

#[utoipa::path(
    get,
    path = "/api/shortcuts/popular",
    tag = "shortcuts",
    params(PopularQuery),
    responses(
        (status = 200, description = "Most popular records", body = [ShortcutResponse]),
        (status = 500, description = "Store error"),
    )
)]
pub async fn popular_shortcuts(
    State(state): State<Arc<AppState>>,
    ApiQuery(q): ApiQuery<PopularQuery>,
) -> Result<Json<Vec<ShortcutResponse>>, ServerError> {
    let limit = q
        .limit
        .as_deref()
        .and_then(|l| l.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_POPULAR_LIMIT);
    Ok(Json(to_responses(state.store.popular(limit).await?)))
}

/// Either a flat, popularity-sorted list or the same list grouped by tool.
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum FilterResponse {
    Flat(Vec<ShortcutResponse>),
    Grouped(Vec<ToolGroupResponse>),
}

#[utoipa::path(
    get,
    path = "/api/shortcuts/filter",
    tag = "shortcuts",
    params(FilterQuery),
    responses(
        (status = 200, description = "Filtered, popularity-sorted records", body = FilterResponse),
        (status = 400, description = "Unknown OS name or malformed parameter"),
        (status = 500, description = "Store error"),
    )
)]
pub async fn filter_shortcuts(
    State(state): State<Arc<AppState>>,
    ApiQuery(q): ApiQuery<FilterQuery>,
) -> Result<Json<FilterResponse>, ServerError> {
    let os = q
        .os_set()
        .map_err(|name| ServerError::BadRequest(format!("unknown operating system '{name}'")))?;

    let mut filter = QueryFilter::new()
        .search(q.q.clone().unwrap_or_default())
        .category(q.category.as_deref().unwrap_or(ALL_CATEGORIES))
        .os(os);
    if q.favorites_only.unwrap_or(false) {
        let favorites = state.store.list_favorites(q.user_id()).await?;
        filter = filter.favorites_only(favorites.into_iter().map(|f| f.shortcut_id));
    }

    let records = state.store.query(&filter).await?;
    let body = if q.grouped.unwrap_or(false) {
        FilterResponse::Grouped(
            group_by_tool(records)
                .into_iter()
                .map(ToolGroupResponse::from)
                .collect(),
        )
    } else {
        FilterResponse::Flat(to_responses(records))
    };
    Ok(Json(body))
}

#[utoipa::path(
    get,
    path = "/api/shortcuts/{id}",
    tag = "shortcuts",
    params(("id" = i64, Path, description = "Shortcut id")),
    responses(
        (status = 200, description = "The record", body = ShortcutResponse),
        (status = 400, description = "Non-numeric id"),
        (status = 404, description = "Shortcut not found"),
    )
)]
pub async fn get_shortcut(
    State(state): State<Arc<AppState>>,
    ShortcutId(id): ShortcutId,
) -> Result<Json<ShortcutResponse>, ServerError> {
    let record = state.store.get(id).await?.ok_or_else(|| not_found(id))?;
    Ok(Json(record.into()))
}

#[utoipa::path(
    post,
    path = "/api/shortcuts",
    tag = "shortcuts",
    request_body = CreateShortcutRequest,
    responses(
        (status = 201, description = "Shortcut created", body = ShortcutResponse),
        (status = 400, description = "Invalid shortcut data"),
        (status = 500, description = "Store error"),
    )
)]
pub async fn create_shortcut(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateShortcutRequest>,
) -> Result<(StatusCode, Json<ShortcutResponse>), ServerError> {
    let record = state.store.create(req.into()).await?;
    info!(id = record.id, tool = %record.tool, "shortcut created");
    Ok((StatusCode::CREATED, Json(record.into())))
}

#[utoipa::path(
    put,
    path = "/api/shortcuts/{id}",
    tag = "shortcuts",
    params(("id" = i64, Path, description = "Shortcut id")),
    request_body = UpdateShortcutRequest,
    responses(
        (status = 200, description = "Shortcut updated", body = ShortcutResponse),
        (status = 400, description = "Invalid shortcut data"),
        (status = 404, description = "Shortcut not found"),
    )
)]
pub async fn update_shortcut(
    State(state): State<Arc<AppState>>,
    ShortcutId(id): ShortcutId,
    ValidatedJson(req): ValidatedJson<UpdateShortcutRequest>,
) -> Result<Json<ShortcutResponse>, ServerError> {
    let record = state
        .store
        .update(id, req.into())
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(record.into()))
}

#[utoipa::path(
    delete,
    path = "/api/shortcuts/{id}",
    tag = "shortcuts",
    params(("id" = i64, Path, description = "Shortcut id")),
    responses(
        (status = 200, description = "Shortcut deleted", body = SuccessResponse),
        (status = 404, description = "Shortcut not found"),
    )
)]
pub async fn delete_shortcut(
    State(state): State<Arc<AppState>>,
    ShortcutId(id): ShortcutId,
) -> Result<Json<SuccessResponse>, ServerError> {
    if !state.store.delete(id).await? {
        return Err(not_found(id));
    }
    info!(id, "shortcut deleted");
    Ok(Json(SuccessResponse::ok()))
}

#[utoipa::path(
    post,
    path = "/api/shortcuts/{id}/usage",
    tag = "shortcuts",
    params(("id" = i64, Path, description = "Shortcut id")),
    responses(
        (status = 200, description = "Usage recorded (unknown ids are ignored)", body = SuccessResponse),
        (status = 500, description = "Store error"),
    )
)]
pub async fn record_usage(
    State(state): State<Arc<AppState>>,
    ShortcutId(id): ShortcutId,
) -> Result<Json<SuccessResponse>, ServerError> {
    state.usage.record_usage(id).await?;
    Ok(Json(SuccessResponse::ok()))
}

#[utoipa::path(
    get,
    path = "/api/shortcuts/{id}/usage",
    tag = "shortcuts",
    params(("id" = i64, Path, description = "Shortcut id")),
    responses(
        (status = 200, description = "Usage counter", body = UsageResponse),
        (status = 404, description = "No usage recorded"),
    )
)]
pub async fn get_usage(
    State(state): State<Arc<AppState>>,
    ShortcutId(id): ShortcutId,
) -> Result<Json<UsageResponse>, ServerError> {
    let usage = state
        .store
        .get_usage(id)
        .await?
        .ok_or_else(|| ServerError::NotFound(format!("no usage recorded for shortcut {id}")))?;
    Ok(Json(usage.into()))
}
