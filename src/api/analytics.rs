//! Analytics API endpoints
//!
//! Read-only aggregation views. Everything is public except the
//! user-activity report, which is admin-gated in the router.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState};
use crate::db::repositories::analytics::{
    CountryBreakdown, ModuleStats, OverviewStats, TagStats, UserStats,
};

/// Optional scope for the module-trends endpoint
#[derive(Debug, Deserialize)]
pub struct ModuleStatsQuery {
    pub country: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

/// Build the public analytics router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/overview", get(overview))
        .route("/modules", get(modules))
        .route("/tags", get(tags))
        .route("/countries", get(countries))
}

/// GET /api/v1/analytics/overview - system-wide counters, cached 15 min
async fn overview(State(state): State<AppState>) -> Result<Json<OverviewStats>, ApiError> {
    Ok(Json(state.analytics_service.overview().await?))
}

/// GET /api/v1/analytics/modules - module trends with optional scope
async fn modules(
    State(state): State<AppState>,
    Query(query): Query<ModuleStatsQuery>,
) -> Result<Json<ModuleStats>, ApiError> {
    let stats = state
        .analytics_service
        .module_stats(query.country.as_deref(), query.date_from, query.date_to)
        .await?;
    Ok(Json(stats))
}

/// GET /api/v1/analytics/tags - tag usage, cached 30 min
async fn tags(State(state): State<AppState>) -> Result<Json<TagStats>, ApiError> {
    Ok(Json(state.analytics_service.tag_stats().await?))
}

/// GET /api/v1/analytics/countries - per-country breakdown, cached 15 min
async fn countries(
    State(state): State<AppState>,
) -> Result<Json<Vec<CountryBreakdown>>, ApiError> {
    Ok(Json(state.analytics_service.country_breakdown().await?))
}

/// GET /api/v1/analytics/users - user activity (admin only, wired behind
/// the admin guard in the router)
pub async fn users(State(state): State<AppState>) -> Result<Json<UserStats>, ApiError> {
    Ok(Json(state.analytics_service.user_stats().await?))
}
