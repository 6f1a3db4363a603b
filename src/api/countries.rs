//! Country API endpoints

use axum::{extract::State, routing::get, Json, Router};

use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::CountryResponse;
use crate::services::ServiceError;

/// Build the countries router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_countries))
        .route("/brics", get(brics_countries))
}

/// GET /api/v1/countries - full reference directory
async fn list_countries(
    State(state): State<AppState>,
) -> Result<Json<Vec<CountryResponse>>, ApiError> {
    let countries = state
        .country_repo
        .list()
        .await
        .map_err(ServiceError::from)?;
    Ok(Json(countries.into_iter().map(CountryResponse::from).collect()))
}

/// GET /api/v1/countries/brics - BRICS members only
async fn brics_countries(
    State(state): State<AppState>,
) -> Result<Json<Vec<CountryResponse>>, ApiError> {
    let countries = state
        .country_repo
        .brics()
        .await
        .map_err(ServiceError::from)?;
    Ok(Json(countries.into_iter().map(CountryResponse::from).collect()))
}
