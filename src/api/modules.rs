//! Module API endpoints
//!
//! CRUD plus the action sub-endpoints: like/unlike, moderation
//! (submit/approve/reject/block/unblock), similar modules, stats and
//! export.

use axum::{
    body::Bytes,
    extract::{Extension, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use crate::api::middleware::{client_ip, ApiError, AppState, AuthenticatedUser, MaybeUser};
use crate::api::responses::{ModuleDetailResponse, ModuleResponse, PaginatedResponse};
use crate::db::repositories::{ModuleFilter, ModuleOrdering};
use crate::models::{CreateModuleInput, ListParams, ModuleStatus, UpdateModuleInput};
use crate::services::export;

/// Query parameters for module listings and export
#[derive(Debug, Default, Deserialize)]
pub struct ListModulesQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    pub name: Option<String>,
    pub search: Option<String>,
    /// Explicit status filter; only honored for admins
    pub status: Option<String>,
    pub country: Option<String>,
    /// Comma-separated country names
    pub countries: Option<String>,
    /// Comma-separated company names
    pub companies: Option<String>,
    /// Comma-separated tag IDs, any-of semantics
    pub tags: Option<String>,
    /// Comma-separated tag IDs, all-of semantics
    pub tags_all: Option<String>,
    /// Comma-separated legacy availability values
    pub ability: Option<String>,
    /// Comma-separated legacy usage-status values
    pub usage_status: Option<String>,
    pub has_publications: Option<bool>,
    pub min_likes: Option<i64>,
    pub created_by: Option<i64>,
    /// DRF-style ordering parameter, e.g. `-created_at`
    pub ordering: Option<String>,
}

fn default_page() -> u32 {
    1
}
fn default_page_size() -> u32 {
    20
}

/// Body for moderation actions carrying an optional comment
#[derive(Debug, Default, Deserialize)]
pub struct ModerationBody {
    #[serde(default)]
    pub comment: String,
}

/// Parse a moderation body, accepting an entirely absent payload.
fn parse_moderation_body(body: &Bytes) -> Result<ModerationBody, ApiError> {
    if body.is_empty() {
        return Ok(ModerationBody::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::validation_error(format!("Invalid request body: {}", e)))
}

impl ListModulesQuery {
    /// Translate the query string into the repository filter.
    fn into_filter(self) -> Result<ModuleFilter, ApiError> {
        let mut filter = ModuleFilter::default();

        if let Some(status) = &self.status {
            filter.status = Some(ModuleStatus::from_str(status).ok_or_else(|| {
                ApiError::validation_error(format!("Unknown status: {}", status))
            })?);
        }
        if let Some(ordering) = &self.ordering {
            filter.ordering = ModuleOrdering::from_param(ordering).ok_or_else(|| {
                ApiError::validation_error(format!("Unknown ordering: {}", ordering))
            })?;
        }

        filter.name = self.name;
        filter.search = self.search;
        filter.country = self.country;
        filter.countries = split_list(self.countries);
        filter.companies = split_list(self.companies);
        filter.tags_any = parse_id_list(self.tags, "tags")?;
        filter.tags_all = parse_id_list(self.tags_all, "tags_all")?;
        filter.ability = split_list(self.ability);
        filter.usage_status = split_list(self.usage_status);
        filter.has_publications = self.has_publications;
        filter.min_likes = self.min_likes;
        filter.created_by = self.created_by;

        Ok(filter)
    }
}

fn split_list(value: Option<String>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn parse_id_list(value: Option<String>, field: &str) -> Result<Vec<i64>, ApiError> {
    split_list(value)
        .into_iter()
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| ApiError::validation_error(format!("Invalid id in {}: {}", field, s)))
        })
        .collect()
}


/// GET /api/v1/modules - filtered, paginated module listing
pub async fn list_modules(
    State(state): State<AppState>,
    Extension(user): Extension<MaybeUser>,
    Query(query): Query<ListModulesQuery>,
) -> Result<Json<PaginatedResponse<ModuleResponse>>, ApiError> {
    let params = ListParams::new(query.page, query.page_size);
    let filter = query.into_filter()?;

    let page = state
        .module_service
        .list(user.as_user(), filter, &params)
        .await?;

    // One query for all tags on the page instead of one per module
    let ids: Vec<i64> = page.items.iter().map(|m| m.module.id).collect();
    let mut tags_by_module: std::collections::HashMap<i64, Vec<_>> =
        std::collections::HashMap::new();
    for (module_id, tag) in state.module_service.tags_for_modules(&ids).await? {
        tags_by_module.entry(module_id).or_default().push(tag);
    }

    let response = PaginatedResponse::from_paged(page, |m| {
        let tags = tags_by_module.remove(&m.module.id).unwrap_or_default();
        ModuleResponse::from(m).with_tags(tags)
    });

    Ok(Json(response))
}

/// POST /api/v1/modules - create a module in draft status
pub async fn create_module(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    headers: HeaderMap,
    Json(input): Json<CreateModuleInput>,
) -> Result<Response, ApiError> {
    let module = state
        .module_service
        .create(&user.0, input, client_ip(&headers))
        .await?;

    let full = state.module_service.full(Some(&user.0), module.id).await?;
    Ok((StatusCode::CREATED, Json(ModuleDetailResponse::from(full))).into_response())
}

/// GET /api/v1/modules/{id} - full module detail
pub async fn get_module(
    State(state): State<AppState>,
    Extension(user): Extension<MaybeUser>,
    Path(id): Path<i64>,
) -> Result<Json<ModuleDetailResponse>, ApiError> {
    let full = state.module_service.full(user.as_user(), id).await?;
    Ok(Json(ModuleDetailResponse::from(full)))
}

/// GET /api/v1/modules/slug/{slug} - full module detail by slug
pub async fn get_module_by_slug(
    State(state): State<AppState>,
    Extension(user): Extension<MaybeUser>,
    Path(slug): Path<String>,
) -> Result<Json<ModuleDetailResponse>, ApiError> {
    let module = state
        .module_service
        .get_by_slug_visible(user.as_user(), &slug)
        .await?;
    let full = state.module_service.full(user.as_user(), module.id).await?;
    Ok(Json(ModuleDetailResponse::from(full)))
}

/// PUT /api/v1/modules/{id} - update a module (owner or admin)
pub async fn update_module(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(input): Json<UpdateModuleInput>,
) -> Result<Json<ModuleDetailResponse>, ApiError> {
    state
        .module_service
        .update(&user.0, id, input, client_ip(&headers))
        .await?;

    let full = state.module_service.full(Some(&user.0), id).await?;
    Ok(Json(ModuleDetailResponse::from(full)))
}

/// DELETE /api/v1/modules/{id} - delete a module and everything attached
pub async fn delete_module(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    state
        .module_service
        .delete(&user.0, id, client_ip(&headers))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/modules/{id}/like
pub async fn like_module(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<crate::services::LikeOutcome>, ApiError> {
    let outcome = state
        .module_service
        .like(&user.0, id, client_ip(&headers))
        .await?;
    Ok(Json(outcome))
}

/// DELETE /api/v1/modules/{id}/like
pub async fn unlike_module(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<crate::services::LikeOutcome>, ApiError> {
    let outcome = state
        .module_service
        .unlike(&user.0, id, client_ip(&headers))
        .await?;
    Ok(Json(outcome))
}

/// POST /api/v1/modules/{id}/submit - draft/rejected → on_review
pub async fn submit_module(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let module = state
        .module_service
        .submit(&user.0, id, client_ip(&headers))
        .await?;
    Ok(Json(serde_json::json!({
        "message": "Module submitted for review",
        "status": module.status.as_str(),
    })))
}

/// POST /api/v1/modules/{id}/approve - on_review → active (admin)
pub async fn approve_module(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let comment = Some(parse_moderation_body(&body)?.comment).filter(|c| !c.trim().is_empty());
    let module = state
        .module_service
        .approve(&user.0, id, comment, client_ip(&headers))
        .await?;
    Ok(Json(serde_json::json!({
        "message": "Module approved successfully",
        "status": module.status.as_str(),
    })))
}

/// POST /api/v1/modules/{id}/reject - on_review → rejected (admin,
/// comment mandatory)
pub async fn reject_module(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let comment = parse_moderation_body(&body)?.comment;
    let module = state
        .module_service
        .reject(&user.0, id, &comment, client_ip(&headers))
        .await?;
    Ok(Json(serde_json::json!({
        "message": "Module rejected successfully",
        "status": module.status.as_str(),
        "comment": comment,
    })))
}

/// POST /api/v1/modules/{id}/block - active → blocked (admin)
pub async fn block_module(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let module = state
        .module_service
        .block(&user.0, id, client_ip(&headers))
        .await?;
    Ok(Json(serde_json::json!({
        "message": "Module blocked",
        "status": module.status.as_str(),
    })))
}

/// POST /api/v1/modules/{id}/unblock - blocked → active (admin)
pub async fn unblock_module(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let module = state
        .module_service
        .unblock(&user.0, id, client_ip(&headers))
        .await?;
    Ok(Json(serde_json::json!({
        "message": "Module unblocked",
        "status": module.status.as_str(),
    })))
}

/// GET /api/v1/modules/{id}/similar - active modules sharing tags
pub async fn similar_modules(
    State(state): State<AppState>,
    Extension(user): Extension<MaybeUser>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<ModuleResponse>>, ApiError> {
    let similar = state.module_service.similar(user.as_user(), id).await?;

    let ids: Vec<i64> = similar.iter().map(|m| m.module.id).collect();
    let mut tags_by_module: std::collections::HashMap<i64, Vec<_>> =
        std::collections::HashMap::new();
    for (module_id, tag) in state.module_service.tags_for_modules(&ids).await? {
        tags_by_module.entry(module_id).or_default().push(tag);
    }

    Ok(Json(
        similar
            .into_iter()
            .map(|m| {
                let tags = tags_by_module.remove(&m.module.id).unwrap_or_default();
                ModuleResponse::from(m).with_tags(tags)
            })
            .collect(),
    ))
}

/// GET /api/v1/modules/{id}/history - the module's audit trail (admin)
pub async fn module_history(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<crate::models::AuditEntry>>, ApiError> {
    let entries = state
        .audit_service
        .for_entity(crate::models::EntityRef::module(id), 100)
        .await?;
    Ok(Json(entries))
}

/// GET /api/v1/modules/stats - aggregate module statistics
pub async fn module_stats(
    State(state): State<AppState>,
) -> Result<Json<crate::db::repositories::analytics::ModuleStats>, ApiError> {
    let stats = state.analytics_service.module_stats(None, None, None).await?;
    Ok(Json(stats))
}

/// GET /api/v1/modules/export?format=json|csv|xlsx - export the filtered
/// module set
pub async fn export_modules(
    State(state): State<AppState>,
    Extension(user): Extension<MaybeUser>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let format = query.format.to_lowercase();
    if !matches!(format.as_str(), "json" | "csv" | "xlsx") {
        return Err(ApiError::validation_error(
            "Unsupported format. Use: json, csv, xlsx",
        ));
    }

    let filter = query.into_list_query().into_filter()?;
    let rows = state
        .module_service
        .export_rows(user.as_user(), filter)
        .await?;
    let records: Vec<export::ExportRecord> = rows.iter().map(export::module_record).collect();
    let fields = export::default_module_fields();

    let response = match format.as_str() {
        "csv" => {
            let bytes = export::to_csv(&records, &fields).map_err(|e| {
                tracing::error!("CSV export failed: {:#}", e);
                ApiError::internal_error()
            })?;
            (
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                    (
                        header::CONTENT_DISPOSITION,
                        "attachment; filename=\"ai_modules.csv\"",
                    ),
                ],
                bytes,
            )
                .into_response()
        }
        "xlsx" => {
            let bytes = export::to_xlsx(&records, &fields).map_err(|e| {
                tracing::error!("XLSX export failed: {:#}", e);
                ApiError::internal_error()
            })?;
            (
                [
                    (
                        header::CONTENT_TYPE,
                        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                    ),
                    (
                        header::CONTENT_DISPOSITION,
                        "attachment; filename=\"ai_modules.xlsx\"",
                    ),
                ],
                bytes,
            )
                .into_response()
        }
        _ => Json(export::to_json(&records)).into_response(),
    };

    Ok(response)
}

/// Query parameters for the export endpoint
#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    #[serde(default = "default_format")]
    pub format: String,
    pub name: Option<String>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub country: Option<String>,
    pub countries: Option<String>,
    pub companies: Option<String>,
    pub tags: Option<String>,
    pub tags_all: Option<String>,
    pub has_publications: Option<bool>,
    pub min_likes: Option<i64>,
    pub ordering: Option<String>,
}

impl ExportQuery {
    fn into_list_query(self) -> ListModulesQuery {
        ListModulesQuery {
            page: default_page(),
            page_size: default_page_size(),
            name: self.name,
            search: self.search,
            status: self.status,
            country: self.country,
            countries: self.countries,
            companies: self.companies,
            tags: self.tags,
            tags_all: self.tags_all,
            ability: None,
            usage_status: None,
            has_publications: self.has_publications,
            min_likes: self.min_likes,
            created_by: None,
            ordering: self.ordering,
        }
    }
}

fn default_format() -> String {
    "json".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_and_parse_lists() {
        assert_eq!(
            split_list(Some("Russia, China ,".to_string())),
            vec!["Russia".to_string(), "China".to_string()]
        );
        assert!(split_list(None).is_empty());

        assert_eq!(parse_id_list(Some("1,2,3".to_string()), "tags").unwrap(), vec![1, 2, 3]);
        assert!(parse_id_list(Some("1,x".to_string()), "tags").is_err());
    }

    #[test]
    fn test_into_filter_validates_status_and_ordering() {
        let query = ListModulesQuery {
            status: Some("bogus".to_string()),
            ..Default::default()
        };
        assert!(query.into_filter().is_err());

        let query = ListModulesQuery {
            ordering: Some("-like_count".to_string()),
            tags: Some("1,2".to_string()),
            ..Default::default()
        };
        let filter = query.into_filter().unwrap();
        assert_eq!(filter.ordering, ModuleOrdering::LikeCountDesc);
        assert_eq!(filter.tags_any, vec![1, 2]);
    }
}
