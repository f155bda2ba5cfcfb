// src/middleware/session.rs
//
// Quem está chamando? O cliente manda o id do perfil no cabeçalho X-User-Id
// e o perfil é carregado a cada requisição (sem estado global de "usuário atual").

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::people::Profile,
};

pub const USER_ID_HEADER: &str = "x-user-id";

// Extrator do usuário da sessão
#[derive(Debug, Clone)]
pub struct SessionUser(pub Profile);

impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_request_parts(parts, state).await.unwrap_or_default();

        // A. Lê e converte o cabeçalho
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v.trim()).ok())
            .ok_or_else(|| AppError::MissingSession.to_api_error(&locale))?;

        // B. Carrega o perfil; id desconhecido = sessão inválida
        let profile = app_state
            .catalog_service
            .get_profile(user_id)
            .await
            .map_err(|e| match e {
                AppError::NotFound { .. } => AppError::MissingSession.to_api_error(&locale),
                other => other.to_api_error(&locale),
            })?;

        Ok(SessionUser(profile))
    }
}

// Guardião: só administradores passam
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub Profile);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let SessionUser(profile) = SessionUser::from_request_parts(parts, state).await?;

        if !profile.is_admin() {
            let locale = Locale::from_request_parts(parts, state).await.unwrap_or_default();
            return Err(AppError::Forbidden.to_api_error(&locale));
        }

        Ok(RequireAdmin(profile))
    }
}
