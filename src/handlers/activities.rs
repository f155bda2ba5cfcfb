// src/handlers/activities.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{i18n::Locale, session::SessionUser},
    models::activity::{Activity, NewActivity, Priority},
};

fn default_limit() -> usize {
    10
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ActivitiesQuery {
    #[serde(default = "default_limit")]
    #[param(example = 10)]
    pub limit: usize,
}

// GET /api/activities?limit=
#[utoipa::path(
    get,
    path = "/api/activities",
    tag = "Activities",
    params(ActivitiesQuery),
    responses(
        (status = 200, description = "Senaste händelserna, nyast först", body = Vec<Activity>)
    )
)]
pub async fn list_activities(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<ActivitiesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let activities = app_state
        .activity_service
        .list(query.limit)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(activities)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateActivityPayload {
    #[validate(length(min = 1, max = 200, message = "Titeln måste vara mellan 1 och 200 tecken."))]
    #[schema(example = "Inventering genomförd")]
    pub title: String,
    pub description: Option<String>,
    pub related_item_id: Option<Uuid>,
    pub priority: Option<Priority>,
}

// POST /api/activities
#[utoipa::path(
    post,
    path = "/api/activities",
    tag = "Activities",
    request_body = CreateActivityPayload,
    responses(
        (status = 201, description = "Händelse registrerad", body = Activity)
    ),
    security(("session" = []))
)]
pub async fn create_activity(
    State(app_state): State<AppState>,
    locale: Locale,
    SessionUser(session): SessionUser,
    Json(payload): Json<CreateActivityPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let activity = app_state
        .activity_service
        .log(NewActivity {
            title: payload.title,
            description: payload.description,
            user_id: Some(session.id),
            related_item_id: payload.related_item_id,
            priority: payload.priority,
        })
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(activity)))
}
