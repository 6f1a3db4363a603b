//! User API endpoints (public read surface)
//!
//! Registration and profile management live under `/auth`; these routes
//! expose public profiles, a user's published modules and their stats.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::str::FromStr;

use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{ModuleResponse, PaginatedResponse, UserResponse};
use crate::db::repositories::{ModuleFilter, UserFilter};
use crate::models::{ListParams, ModuleStatus, UserRole};

/// Query parameters for user listings
#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    pub username: Option<String>,
    pub organization: Option<String>,
    pub role: Option<String>,
    pub country: Option<String>,
    pub has_modules: Option<bool>,
}

fn default_page() -> u32 {
    1
}
fn default_page_size() -> u32 {
    20
}

/// Build the users router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/{id}", get(get_user))
        .route("/{id}/modules", get(user_modules))
        .route("/{id}/stats", get(user_stats))
}

/// GET /api/v1/users - public user listing (blocked users hidden)
async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<PaginatedResponse<UserResponse>>, ApiError> {
    let params = ListParams::new(query.page, query.page_size);

    let role = match &query.role {
        Some(role) => Some(
            UserRole::from_str(role)
                .map_err(|_| ApiError::validation_error(format!("Unknown role: {}", role)))?,
        ),
        None => None,
    };

    let filter = UserFilter {
        username: query.username,
        organization: query.organization,
        role,
        country: query.country,
        has_modules: query.has_modules,
    };

    let page = state.user_service.list(&filter, &params).await?;
    Ok(Json(PaginatedResponse::from_paged(page, |u| {
        UserResponse::from(&u)
    })))
}

/// GET /api/v1/users/{id} - public profile
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.user_service.get_public(id).await?;
    Ok(Json(UserResponse::from(&user)))
}

/// GET /api/v1/users/{id}/modules - the user's published modules
async fn user_modules(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<ModuleResponse>>, ApiError> {
    // Existence check keeps blocked users' content hidden as well
    state.user_service.get_public(id).await?;

    let filter = ModuleFilter {
        status: Some(ModuleStatus::Active),
        created_by: Some(id),
        ..Default::default()
    };
    // Published modules only, regardless of who is asking
    let page = state
        .module_service
        .list(None, filter, &ListParams::new(1, 100))
        .await?;

    Ok(Json(
        page.items.into_iter().map(ModuleResponse::from).collect(),
    ))
}

/// GET /api/v1/users/{id}/stats - public aggregate numbers
async fn user_stats(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let stats = state.user_service.account_stats(id).await?;
    Ok(Json(serde_json::json!({
        "total_modules": stats.total_modules,
        "total_likes_received": stats.total_likes_received,
        "total_publications": stats.total_publications,
        "member_since": stats.member_since.to_rfc3339(),
    })))
}
