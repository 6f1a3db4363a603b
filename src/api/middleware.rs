//! API middleware
//!
//! Shared application state, the normalized error envelope, JWT request
//! authentication and the admin guard.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::config::Config;
use crate::db::repositories::CountryRepository;
use crate::models::User;
use crate::services::{
    AnalyticsService, AuditService, AuthService, FileService, ModuleService, PublicationService,
    ServiceError, TagService, UserService,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<Config>,
    pub auth_service: Arc<AuthService>,
    pub user_service: Arc<UserService>,
    pub module_service: Arc<ModuleService>,
    pub tag_service: Arc<TagService>,
    pub publication_service: Arc<PublicationService>,
    pub file_service: Arc<FileService>,
    pub analytics_service: Arc<AnalyticsService>,
    pub audit_service: Arc<AuditService>,
    pub country_repo: Arc<dyn CountryRepository>,
}

/// Authenticated user extracted from the request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Caller identity on routes where authentication is optional. Inserted by
/// `optional_auth` for every request, holding `None` for anonymous callers.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl MaybeUser {
    pub fn as_user(&self) -> Option<&User> {
        self.0.as_ref()
    }
}

/// Error response envelope for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn internal_error() -> Self {
        Self::new("INTERNAL_ERROR", "An internal error occurred")
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => Self::validation_error(msg),
            ServiceError::Unauthorized(msg) => Self::unauthorized(msg),
            ServiceError::Forbidden(msg) => Self::forbidden(msg),
            ServiceError::NotFound(msg) => Self::not_found(msg),
            ServiceError::Conflict(msg) => Self::conflict(msg),
            ServiceError::Internal(e) => {
                // Internal detail is logged, never returned to the client
                tracing::error!("Internal error: {:#}", e);
                Self::internal_error()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

/// Extract the bearer token from the Authorization header
fn extract_bearer_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.to_string())
}

/// Authentication middleware: a valid access token is mandatory.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&request)
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let user = state.auth_service.authenticate(&token).await?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

/// Optional authentication middleware: an invalid token is ignored and
/// the request proceeds anonymously.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let mut user = None;
    if let Some(token) = extract_bearer_token(&request) {
        if let Ok(authenticated) = state.auth_service.authenticate(&token).await {
            user = Some(authenticated);
        }
    }
    request.extensions_mut().insert(MaybeUser(user));
    next.run(request).await
}

/// Admin authorization middleware; must run after `require_auth`.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !user.0.is_admin() {
        return Err(ApiError::forbidden("Admin privileges required"));
    }

    Ok(next.run(request).await)
}

/// Best-effort client IP from proxy headers.
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|h| h.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return Some(first.to_string());
            }
        }
    }
    headers
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .map(|ip| ip.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_extract_bearer_token() {
        let request = Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, "Bearer token-123")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_bearer_token(&request), Some("token-123".to_string()));

        let basic = Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, "Basic abc")
            .body(Body::empty())
            .unwrap();
        assert!(extract_bearer_token(&basic).is_none());

        let none = Request::builder().uri("/test").body(Body::empty()).unwrap();
        assert!(extract_bearer_token(&none).is_none());
    }

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "10.1.2.3, 172.16.0.1".parse().unwrap());
        headers.insert("x-real-ip", "192.168.0.5".parse().unwrap());
        assert_eq!(client_ip(&headers), Some("10.1.2.3".to_string()));

        let mut real_only = HeaderMap::new();
        real_only.insert("x-real-ip", "192.168.0.5".parse().unwrap());
        assert_eq!(client_ip(&real_only), Some("192.168.0.5".to_string()));

        assert_eq!(client_ip(&HeaderMap::new()), None);
    }

    #[test]
    fn test_service_error_mapping() {
        let validation: ApiError = ServiceError::validation("bad input").into();
        assert_eq!(validation.error.code, "VALIDATION_ERROR");
        assert_eq!(validation.error.message, "bad input");

        let conflict: ApiError = ServiceError::conflict("wrong state").into();
        assert_eq!(conflict.error.code, "CONFLICT");

        let internal: ApiError = ServiceError::Internal(anyhow::anyhow!("secret detail")).into();
        assert_eq!(internal.error.code, "INTERNAL_ERROR");
        assert!(
            !internal.error.message.contains("secret"),
            "internal detail must not leak"
        );
    }
}
