//! API layer - HTTP handlers and routing
//!
//! Routes are grouped by access level: public (optional auth for
//! visibility), protected (valid access token) and admin (token plus the
//! admin role).

pub mod analytics;
pub mod auth;
pub mod countries;
pub mod files;
pub mod health;
pub mod middleware;
pub mod modules;
pub mod publications;
pub mod responses;
pub mod tags;
pub mod users;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use middleware::{client_ip, ApiError, AppState, AuthenticatedUser, MaybeUser};

/// Build the `/api/v1` router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Admin routes: token plus the admin role
    let admin_routes = Router::new()
        .route("/modules/{id}/history", get(modules::module_history))
        .route("/analytics/users", get(analytics::users))
        .route("/system/info", get(health::system_info))
        .route_layer(axum_middleware::from_fn(middleware::require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Protected routes: a valid access token is mandatory
    let protected_routes = Router::new()
        .route("/modules", post(modules::create_module))
        .route("/modules/{id}", put(modules::update_module))
        .route("/modules/{id}", delete(modules::delete_module))
        .route("/modules/{id}/like", post(modules::like_module))
        .route("/modules/{id}/like", delete(modules::unlike_module))
        .route("/modules/{id}/submit", post(modules::submit_module))
        .route("/modules/{id}/approve", post(modules::approve_module))
        .route("/modules/{id}/reject", post(modules::reject_module))
        .route("/modules/{id}/block", post(modules::block_module))
        .route("/modules/{id}/unblock", post(modules::unblock_module))
        .route("/modules/{id}/files", post(files::upload_file))
        .route("/modules/{id}/files/{file_id}", delete(files::delete_file))
        .nest("/auth", auth::protected_router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Public routes: authentication is optional but honored for
    // visibility and like state
    let public_routes = Router::new()
        .route("/modules", get(modules::list_modules))
        .route("/modules/stats", get(modules::module_stats))
        .route("/modules/export", get(modules::export_modules))
        .route("/modules/slug/{slug}", get(modules::get_module_by_slug))
        .route("/modules/{id}", get(modules::get_module))
        .route("/modules/{id}/similar", get(modules::similar_modules))
        .route("/modules/{id}/files", get(files::list_files))
        .route("/modules/{id}/files/{file_id}", get(files::get_file))
        .nest("/tags", tags::router())
        .nest("/categories", tags::categories_router())
        .nest("/publications", publications::router())
        .nest("/users", users::router())
        .nest("/countries", countries::router())
        .nest("/analytics", analytics::router())
        .nest("/auth", auth::public_router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::optional_auth,
        ));

    public_routes.merge(protected_routes).merge(admin_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let cors = match cors_origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        Err(_) => {
            tracing::warn!("Invalid CORS origin '{}', allowing none", cors_origin);
            CorsLayer::new()
        }
    };

    Router::new()
        .nest("/api/v1", build_api_router(state.clone()))
        .route("/health", get(health::health))
        .route("/ping", get(health::ping))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
