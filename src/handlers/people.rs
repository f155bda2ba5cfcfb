// src/handlers/people.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    handlers::double_option,
    middleware::{
        i18n::Locale,
        session::{RequireAdmin, SessionUser},
    },
    models::people::{NewProfile, Profile, ProfilePatch, ProfileStatus, Role},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProfilePayload {
    #[validate(length(min = 1, max = 200, message = "Namnet måste vara mellan 1 och 200 tecken."))]
    #[schema(example = "Johan Andersson")]
    pub name: String,
    #[serde(default)]
    pub role: Role,
    pub department: Option<String>,
    pub contact: Option<String>,
    pub hire_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: ProfileStatus,
}

// POST /api/profiles
#[utoipa::path(
    post,
    path = "/api/profiles",
    tag = "People",
    request_body = CreateProfilePayload,
    responses(
        (status = 201, description = "Anställd registrerad", body = Profile),
        (status = 403, description = "Kräver administratör")
    ),
    security(("session" = []))
)]
pub async fn create_profile(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: RequireAdmin,
    Json(payload): Json<CreateProfilePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let new_profile = NewProfile {
        name: payload.name.trim().to_string(),
        role: payload.role,
        department: payload.department,
        contact: payload.contact,
        hire_date: payload.hire_date,
        status: payload.status,
    };

    let profile = app_state
        .catalog_service
        .create_profile(new_profile)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(profile)))
}

// GET /api/profiles
#[utoipa::path(
    get,
    path = "/api/profiles",
    tag = "People",
    responses(
        (status = 200, description = "Alla anställda", body = Vec<Profile>)
    )
)]
pub async fn list_profiles(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let profiles = app_state
        .catalog_service
        .list_profiles()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(profiles)))
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfilePayload {
    #[validate(length(min = 1, max = 200, message = "Namnet måste vara mellan 1 och 200 tecken."))]
    pub name: Option<String>,
    pub role: Option<Role>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub department: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub contact: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<NaiveDate>)]
    pub hire_date: Option<Option<NaiveDate>>,
    pub status: Option<ProfileStatus>,
}

// PATCH /api/profiles/{id}
#[utoipa::path(
    patch,
    path = "/api/profiles/{id}",
    tag = "People",
    request_body = UpdateProfilePayload,
    responses(
        (status = 200, description = "Anställd uppdaterad", body = Profile),
        (status = 404, description = "Användaren finns inte")
    ),
    params(
        ("id" = Uuid, Path, description = "Den anställdes id")
    ),
    security(("session" = []))
)]
pub async fn update_profile(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: RequireAdmin,
    Path(profile_id): Path<Uuid>,
    Json(payload): Json<UpdateProfilePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let patch = ProfilePatch {
        name: payload.name.map(|n| n.trim().to_string()),
        role: payload.role,
        department: payload.department,
        contact: payload.contact,
        hire_date: payload.hire_date,
        status: payload.status,
    };

    let profile = app_state
        .catalog_service
        .update_profile(profile_id, patch)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(profile)))
}

// GET /api/me
#[utoipa::path(
    get,
    path = "/api/me",
    tag = "People",
    responses(
        (status = 200, description = "Den inloggade användaren", body = Profile),
        (status = 401, description = "Ingen session")
    ),
    security(("session" = []))
)]
pub async fn get_me(SessionUser(profile): SessionUser) -> impl IntoResponse {
    (StatusCode::OK, Json(profile))
}
