// src/handlers/certificates.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    handlers::validate_not_blank,
    middleware::{i18n::Locale, session::RequireAdmin},
    models::people::{Certificate, UserCertificate},
    services::query_service::OVERVIEW_EXPIRY_WINDOW_DAYS,
};

// =============================================================================
//  1. CATÁLOGO
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCertificatePayload {
    #[validate(
        custom(function = "validate_not_blank"),
        length(max = 200, message = "Namnet får vara högst 200 tecken.")
    )]
    #[schema(example = "Truckkort A")]
    pub name: String,
    pub description: Option<String>,
}

// POST /api/certificates
#[utoipa::path(
    post,
    path = "/api/certificates",
    tag = "Certificates",
    request_body = CreateCertificatePayload,
    responses(
        (status = 201, description = "Certifikattyp skapad", body = Certificate)
    ),
    security(("session" = []))
)]
pub async fn create_certificate(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: RequireAdmin,
    Json(payload): Json<CreateCertificatePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let certificate = app_state
        .certificate_service
        .create_certificate(payload.name.trim(), payload.description.as_deref())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(certificate)))
}

// GET /api/certificates
#[utoipa::path(
    get,
    path = "/api/certificates",
    tag = "Certificates",
    responses(
        (status = 200, description = "Certifikattyper", body = Vec<Certificate>)
    )
)]
pub async fn list_certificates(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let certificates = app_state
        .certificate_service
        .list_certificates()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(certificates)))
}

// =============================================================================
//  2. CONCESSÕES (USER CERTIFICATES)
// =============================================================================

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrantCertificatePayload {
    pub user_id: Uuid,
    pub certificate_id: Uuid,
    #[schema(example = "2025-06-30")]
    pub expiry_date: NaiveDate,
}

// POST /api/user-certificates
#[utoipa::path(
    post,
    path = "/api/user-certificates",
    tag = "Certificates",
    request_body = GrantCertificatePayload,
    responses(
        (status = 201, description = "Certifikat tilldelat", body = UserCertificate),
        (status = 404, description = "Användaren eller certifikatet finns inte"),
        (status = 409, description = "Användaren har redan certifikatet")
    ),
    security(("session" = []))
)]
pub async fn grant_certificate(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: RequireAdmin,
    Json(payload): Json<GrantCertificatePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let grant = app_state
        .certificate_service
        .add_certificate_to_user(payload.user_id, payload.certificate_id, payload.expiry_date)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(grant)))
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UserCertificatesQuery {
    pub user_id: Option<Uuid>,
}

// GET /api/user-certificates?userId=
#[utoipa::path(
    get,
    path = "/api/user-certificates",
    tag = "Certificates",
    params(UserCertificatesQuery),
    responses(
        (status = 200, description = "Tilldelade certifikat, närmast utgång först", body = Vec<UserCertificate>)
    )
)]
pub async fn list_user_certificates(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<UserCertificatesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let grants = app_state
        .certificate_service
        .list_user_certificates(query.user_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(grants)))
}

fn default_threshold() -> i64 {
    OVERVIEW_EXPIRY_WINDOW_DAYS
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ExpiringQuery {
    #[serde(default = "default_threshold")]
    #[param(example = 30)]
    pub threshold_days: i64,
}

// GET /api/user-certificates/expiring?thresholdDays=
#[utoipa::path(
    get,
    path = "/api/user-certificates/expiring",
    tag = "Certificates",
    params(ExpiringQuery),
    responses(
        (status = 200, description = "Certifikat med färre dagar kvar än tröskeln, mest brådskande först", body = Vec<UserCertificate>)
    )
)]
pub async fn list_expiring_certificates(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<ExpiringQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let grants = app_state
        .query_service
        .expiring_certificates(query.threshold_days)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(grants)))
}
