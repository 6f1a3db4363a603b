//! Auth API endpoints
//!
//! Registration, JWT issuance/refresh/verify, logout (refresh-token
//! blacklist), profile read/update and password change.

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::UserResponse;
use crate::models::{CreateUserInput, UpdateProfileInput};
use crate::services::TokenPair;

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Refresh/logout/verify request body
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub token: Option<String>,
    pub refresh: Option<String>,
}

impl TokenRequest {
    fn any_token(&self) -> Option<&str> {
        self.token.as_deref().or(self.refresh.as_deref())
    }
}

/// Password change request body
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Token pair response
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access: String,
    pub refresh: String,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access: pair.access,
            refresh: pair.refresh,
        }
    }
}

/// Build the public auth router (no token required)
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/token", post(login))
        .route("/token/refresh", post(refresh))
        .route("/token/verify", post(verify))
}

/// Build the protected auth router (valid access token required)
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(profile))
        .route("/profile", put(update_profile))
        .route("/change-password", post(change_password))
        .route("/logout", post(logout))
}

/// POST /api/v1/auth/register - create an account and issue tokens
async fn register(
    State(state): State<AppState>,
    Json(input): Json<CreateUserInput>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let user = state.user_service.register(input).await?;
    let tokens = state.auth_service.issue_pair(&user)?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "User created successfully",
            "tokens": TokenResponse::from(tokens),
            "user": UserResponse::from(&user),
        })),
    ))
}

/// POST /api/v1/auth/token - verify credentials, issue a token pair
async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (user, tokens) = state
        .auth_service
        .login(&input.username, &input.password)
        .await?;

    Ok(Json(serde_json::json!({
        "tokens": TokenResponse::from(tokens),
        "user": UserResponse::from(&user),
    })))
}

/// POST /api/v1/auth/token/refresh - rotate a refresh token
async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = input
        .any_token()
        .ok_or_else(|| ApiError::validation_error("refresh token is required"))?;

    let (_, tokens) = state.auth_service.refresh(token).await?;
    Ok(Json(TokenResponse::from(tokens)))
}

/// POST /api/v1/auth/token/verify - check a token and echo its claims
async fn verify(
    State(state): State<AppState>,
    Json(input): Json<TokenRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let token = input
        .any_token()
        .ok_or_else(|| ApiError::validation_error("token is required"))?;

    let claims = state.auth_service.verify(token)?;
    Ok(Json(serde_json::json!({
        "valid": true,
        "user_id": claims.sub,
        "username": claims.username,
        "token_type": claims.token_type,
        "expires_at": claims.exp,
    })))
}

/// POST /api/v1/auth/logout - blacklist the refresh token
async fn logout(
    State(state): State<AppState>,
    Json(input): Json<TokenRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let token = input
        .any_token()
        .ok_or_else(|| ApiError::validation_error("refresh token is required"))?;

    state.auth_service.logout(token).await?;
    Ok(Json(serde_json::json!({ "message": "Successfully logged out" })))
}

/// GET /api/v1/auth/profile - the caller's own profile
async fn profile(
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<UserResponse>, ApiError> {
    Ok(Json(UserResponse::from(&user.0)))
}

/// PUT /api/v1/auth/profile - update the caller's own profile
async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(input): Json<UpdateProfileInput>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let updated = state.user_service.update_profile(&user.0, input).await?;
    Ok(Json(serde_json::json!({
        "message": "Profile updated successfully",
        "user": UserResponse::from(&updated),
    })))
}

/// POST /api/v1/auth/change-password
async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(input): Json<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .user_service
        .change_password(&user.0, &input.current_password, &input.new_password)
        .await?;
    Ok(Json(serde_json::json!({ "message": "Password changed successfully" })))
}
