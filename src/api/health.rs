//! Health and system-info endpoints

use axum::{extract::State, Json};
use chrono::Utc;

use crate::api::middleware::{ApiError, AppState};
use crate::db;

/// GET /health - liveness plus a database ping
pub async fn health(State(state): State<AppState>) -> (axum::http::StatusCode, Json<serde_json::Value>) {
    let database = match db::ping(&state.pool).await {
        Ok(()) => "ok".to_string(),
        Err(e) => {
            tracing::error!("Health check database ping failed: {:#}", e);
            format!("error: {}", e)
        }
    };

    let healthy = database == "ok";
    let body = serde_json::json!({
        "status": if healthy { "ok" } else { "error" },
        "timestamp": Utc::now().to_rfc3339(),
        "checks": {
            "database": database,
        },
    });

    let status = if healthy {
        axum::http::StatusCode::OK
    } else {
        axum::http::StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

/// GET /ping - trivial availability probe
pub async fn ping() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "pong",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// GET /api/v1/system/info - version, platform and entity counts (admin,
/// wired behind the admin guard in the router)
pub async fn system_info(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let mut counts = serde_json::Map::new();
    for (key, sql) in [
        ("total_modules", "SELECT COUNT(*) FROM modules"),
        ("active_modules", "SELECT COUNT(*) FROM modules WHERE status = 'active'"),
        ("total_users", "SELECT COUNT(*) FROM users"),
        ("total_publications", "SELECT COUNT(*) FROM publications"),
        ("total_tags", "SELECT COUNT(*) FROM tags WHERE is_active = 1"),
        ("audit_entries", "SELECT COUNT(*) FROM audit_log"),
    ] {
        let count: i64 = sqlx::query_scalar(sql)
            .fetch_one(&state.pool)
            .await
            .map_err(|e| crate::services::ServiceError::from(anyhow::Error::from(e)))?;
        counts.insert(key.to_string(), serde_json::json!(count));
    }

    let system = serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "os": sysinfo::System::name(),
        "os_version": sysinfo::System::os_version(),
        "host": sysinfo::System::host_name(),
    });

    Ok(Json(serde_json::json!({
        "system": system,
        "database": {
            "engine": "sqlite",
            "url": state.config.database.url,
        },
        "statistics": counts,
    })))
}
