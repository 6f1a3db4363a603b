//! Publication API endpoints (read-only)

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{PaginatedResponse, PublicationResponse};
use crate::db::repositories::PublicationFilter;
use crate::models::ListParams;

/// Query parameters for publication listings
#[derive(Debug, Deserialize)]
pub struct ListPublicationsQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    pub title: Option<String>,
    pub authors: Option<String>,
    pub journal_conference: Option<String>,
    pub module: Option<i64>,
    pub module_name: Option<String>,
    pub published_after: Option<NaiveDate>,
    pub published_before: Option<NaiveDate>,
    pub published_year: Option<i32>,
}

fn default_page() -> u32 { 1 }
fn default_page_size() -> u32 { 20 }

/// Build the publications router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_publications))
        .route("/{id}", get(get_publication))
}

/// GET /api/v1/publications - filtered listing, newest first
async fn list_publications(
    State(state): State<AppState>,
    Query(query): Query<ListPublicationsQuery>,
) -> Result<Json<PaginatedResponse<PublicationResponse>>, ApiError> {
    let params = ListParams::new(query.page, query.page_size);
    let filter = PublicationFilter {
        title: query.title,
        authors: query.authors,
        journal_conference: query.journal_conference,
        module_id: query.module,
        module_name: query.module_name,
        published_after: query.published_after,
        published_before: query.published_before,
        published_year: query.published_year,
    };

    let page = state.publication_service.list(&filter, &params).await?;
    Ok(Json(PaginatedResponse::from_paged(
        page,
        PublicationResponse::from,
    )))
}

/// GET /api/v1/publications/{id}
async fn get_publication(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PublicationResponse>, ApiError> {
    let publication = state.publication_service.get(id).await?;
    Ok(Json(PublicationResponse::from(publication)))
}
