//! Tag and category API endpoints
//!
//! Read-only taxonomy surface; tags and categories are curated through
//! the import tooling.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{CategoryResponse, PaginatedResponse, TagResponse};
use crate::db::repositories::TagFilter;
use crate::models::ListParams;

/// Query parameters for tag listings
#[derive(Debug, Deserialize)]
pub struct ListTagsQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Case-insensitive name contains
    pub name: Option<String>,
    pub category: Option<i64>,
    /// Minimum number of modules using the tag
    pub min_usage: Option<i64>,
}

fn default_page() -> u32 { 1 }
fn default_page_size() -> u32 { 50 }

/// Query parameters for the popular-tags endpoint
#[derive(Debug, Deserialize)]
pub struct PopularQuery {
    #[serde(default = "default_popular_limit")]
    pub limit: i64,
}

fn default_popular_limit() -> i64 { 20 }

/// Build the tags router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tags))
        .route("/popular", get(popular_tags))
        .route("/by-category", get(tags_by_category))
        .route("/{id}", get(get_tag))
}

/// Build the categories router
pub fn categories_router() -> Router<AppState> {
    Router::new().route("/", get(list_categories))
}

/// GET /api/v1/tags - filtered tag listing with usage counts
async fn list_tags(
    State(state): State<AppState>,
    Query(query): Query<ListTagsQuery>,
) -> Result<Json<PaginatedResponse<TagResponse>>, ApiError> {
    let params = ListParams::new(query.page, query.page_size);
    let filter = TagFilter {
        name: query.name,
        category_id: query.category,
        active_only: true,
        min_usage: query.min_usage,
    };

    let page = state.tag_service.list(&filter, &params).await?;
    Ok(Json(PaginatedResponse::from_paged(page, TagResponse::from)))
}

/// GET /api/v1/tags/{id}
async fn get_tag(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<TagResponse>, ApiError> {
    let tag = state.tag_service.get(id).await?;
    Ok(Json(TagResponse::from(tag)))
}

/// GET /api/v1/tags/popular - most used tags, cached
async fn popular_tags(
    State(state): State<AppState>,
    Query(query): Query<PopularQuery>,
) -> Result<Json<Vec<TagResponse>>, ApiError> {
    let tags = state.tag_service.popular(query.limit.clamp(1, 100)).await?;
    Ok(Json(tags.into_iter().map(TagResponse::from).collect()))
}

/// GET /api/v1/tags/by-category - active tags grouped by category
async fn tags_by_category(
    State(state): State<AppState>,
) -> Result<Json<Vec<serde_json::Value>>, ApiError> {
    let groups = state.tag_service.by_category().await?;

    Ok(Json(
        groups
            .into_iter()
            .map(|g| {
                serde_json::json!({
                    "id": g.category.id,
                    "name": g.category.name,
                    "description": g.category.description,
                    "tags": g.tags.into_iter().map(TagResponse::from).collect::<Vec<_>>(),
                })
            })
            .collect(),
    ))
}

/// GET /api/v1/categories - active categories ordered by weight
async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let categories = state.tag_service.categories().await?;
    Ok(Json(
        categories.into_iter().map(CategoryResponse::from).collect(),
    ))
}
