// src/handlers/dashboard.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::i18n::Locale,
    models::dashboard::Overview,
};

// GET /api/overview
#[utoipa::path(
    get,
    path = "/api/overview",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Antal objekt per status och certifikatläge", body = Overview)
    )
)]
pub async fn get_overview(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let overview = app_state
        .query_service
        .overview()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(overview)))
}
