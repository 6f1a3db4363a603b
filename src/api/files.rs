//! Module file API endpoints
//!
//! Nested resource under a module: listing, metadata, multipart upload
//! and deletion (which also removes the stored blob).

use axum::{
    extract::{Extension, Multipart, Path, State},
    http::StatusCode,
    Json,
};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser, MaybeUser};
use crate::api::responses::FileResponse;
use crate::models::FileType;

/// GET /api/v1/modules/{id}/files - files of a visible module
pub async fn list_files(
    State(state): State<AppState>,
    Extension(user): Extension<MaybeUser>,
    Path(module_id): Path<i64>,
) -> Result<Json<Vec<FileResponse>>, ApiError> {
    let module = state
        .module_service
        .get_visible(user.as_user(), module_id)
        .await?;

    let files = state.file_service.list(module.id).await?;
    Ok(Json(files.into_iter().map(FileResponse::from).collect()))
}

/// GET /api/v1/modules/{id}/files/{file_id} - file metadata
pub async fn get_file(
    State(state): State<AppState>,
    Extension(user): Extension<MaybeUser>,
    Path((module_id, file_id)): Path<(i64, i64)>,
) -> Result<Json<FileResponse>, ApiError> {
    let module = state
        .module_service
        .get_visible(user.as_user(), module_id)
        .await?;

    let file = state.file_service.get(module.id, file_id).await?;
    Ok(Json(FileResponse::from(file)))
}

/// POST /api/v1/modules/{id}/files - multipart upload (owner or admin)
///
/// Expects a `file` part plus optional `file_type` and `description`
/// fields.
pub async fn upload_file(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(module_id): Path<i64>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<FileResponse>), ApiError> {
    let module = state
        .module_service
        .get_visible(Some(&user.0), module_id)
        .await?;

    let mut file_name: Option<String> = None;
    let mut data: Option<Vec<u8>> = None;
    let mut file_type = FileType::Other;
    let mut description = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation_error(format!("Invalid multipart payload: {}", e)))?
    {
        let part = field.name().unwrap_or_default().to_string();
        match part.as_str() {
            "file" => {
                file_name = field.file_name().map(|n| n.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::validation_error(format!("Failed to read file: {}", e)))?;
                data = Some(bytes.to_vec());
            }
            "file_type" => {
                let value = field.text().await.unwrap_or_default();
                file_type = FileType::from_str(&value).ok_or_else(|| {
                    ApiError::validation_error(format!("Unknown file type: {}", value))
                })?;
            }
            "description" => {
                description = field.text().await.unwrap_or_default();
            }
            _ => {}
        }
    }

    let name = file_name.ok_or_else(|| ApiError::validation_error("A file part is required"))?;
    let data = data.ok_or_else(|| ApiError::validation_error("A file part is required"))?;

    let stored = state
        .file_service
        .store(&user.0, &module, &name, file_type, description, &data)
        .await?;

    Ok((StatusCode::CREATED, Json(FileResponse::from(stored))))
}

/// DELETE /api/v1/modules/{id}/files/{file_id} - delete file and blob
pub async fn delete_file(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path((module_id, file_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    let module = state
        .module_service
        .get_visible(Some(&user.0), module_id)
        .await?;

    state.file_service.delete(&user.0, &module, file_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
