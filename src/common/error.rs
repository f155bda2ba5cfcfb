use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::middleware::i18n::Locale;
use crate::models::inventory::ItemStatus;

// Qual entidade não foi encontrada (usado no NotFound)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Profile,
    Certificate,
    Category,
    Item,
    Assignment,
}

impl Entity {
    fn label(&self, lang: &str) -> &'static str {
        match (self, lang) {
            (Entity::Profile, "en") => "User",
            (Entity::Certificate, "en") => "Certificate",
            (Entity::Category, "en") => "Category",
            (Entity::Item, "en") => "Item",
            (Entity::Assignment, "en") => "Assignment",
            (Entity::Profile, _) => "Användaren",
            (Entity::Certificate, _) => "Certifikatet",
            (Entity::Category, _) => "Kategorin",
            (Entity::Item, _) => "Objektet",
            (Entity::Assignment, _) => "Utlåningen",
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{entity:?} {id} hittades inte")]
    NotFound { entity: Entity, id: Uuid },

    #[error("Objektet {0} är redan utcheckat")]
    AlreadyCheckedOut(Uuid),

    #[error("Objektet {0} är inte utcheckat")]
    NotCheckedOut(Uuid),

    // Violação de integridade: status diz "checked-out" mas não há empréstimo aberto
    #[error("Ingen aktiv utlåning hittades för objektet {0}")]
    NoOpenAssignment(Uuid),

    #[error("Användaren {user_id} har redan certifikatet {certificate_id}")]
    DuplicateGrant { user_id: Uuid, certificate_id: Uuid },

    #[error("Objektet {id} kan inte lånas ut (status: {})", .status.as_str())]
    ItemUnavailable { id: Uuid, status: ItemStatus },

    #[error("Ogiltig statusändring {} -> {}", .from.as_str(), .to.as_str())]
    InvalidStatusTransition { from: ItemStatus, to: ItemStatus },

    #[error("Valideringsfel")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Sessionen saknas eller är ogiltig")]
    MissingSession,

    #[error("Åtgärden kräver administratörsbehörighet")]
    Forbidden,

    #[error("Databasfel: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Internt fel: {0}")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(entity: Entity, id: Uuid) -> Self {
        AppError::NotFound { entity, id }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::AlreadyCheckedOut(_)
            | AppError::NotCheckedOut(_)
            | AppError::DuplicateGrant { .. }
            | AppError::ItemUnavailable { .. } => StatusCode::CONFLICT,
            AppError::InvalidStatusTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::MissingSession => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NoOpenAssignment(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // Mensagem para o usuário final, no idioma do Accept-Language (sv por padrão)
    fn user_message(&self, lang: &str) -> String {
        let en = lang == "en";
        match self {
            AppError::NotFound { entity, .. } if en => format!("{} was not found.", entity.label(lang)),
            AppError::NotFound { entity, .. } => format!("{} hittades inte.", entity.label(lang)),
            AppError::AlreadyCheckedOut(_) if en => "The item is already checked out.".into(),
            AppError::AlreadyCheckedOut(_) => "Objektet är redan utcheckat.".into(),
            AppError::NotCheckedOut(_) if en => "No checked-out item was found.".into(),
            AppError::NotCheckedOut(_) => "Inget utcheckat objekt hittades.".into(),
            AppError::DuplicateGrant { .. } if en => "The user already holds this certificate.".into(),
            AppError::DuplicateGrant { .. } => "Användaren har redan detta certifikat.".into(),
            AppError::ItemUnavailable { status, .. } if en => {
                format!("The item cannot be checked out while its status is '{}'.", status.as_str())
            }
            AppError::ItemUnavailable { status, .. } => {
                format!("Objektet kan inte lånas ut med status '{}'.", status.as_str())
            }
            AppError::InvalidStatusTransition { from, to } if en => {
                format!("Status cannot change from '{}' to '{}'.", from.as_str(), to.as_str())
            }
            AppError::InvalidStatusTransition { from, to } => {
                format!("Status kan inte ändras från '{}' till '{}'.", from.as_str(), to.as_str())
            }
            AppError::ValidationError(_) if en => "One or more fields are invalid.".into(),
            AppError::ValidationError(_) => "Ett eller flera fält är ogiltiga.".into(),
            AppError::MissingSession if en => "Missing or invalid X-User-Id header.".into(),
            AppError::MissingSession => "X-User-Id saknas eller är ogiltig.".into(),
            AppError::Forbidden if en => "This action requires an administrator.".into(),
            AppError::Forbidden => "Åtgärden kräver en administratör.".into(),
            _ if en => "An unexpected error occurred.".into(),
            _ => "Ett oväntat fel inträffade.".into(),
        }
    }

    pub fn to_api_error(&self, locale: &Locale) -> ApiError {
        let status = self.status_code();

        // O `tracing` loga a mensagem detalhada; o cliente só recebe a genérica.
        match self {
            AppError::NoOpenAssignment(item_id) => {
                tracing::error!(%item_id, "Defeito de integridade: item utcheckat sem empréstimo aberto");
            }
            e if status == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!("Erro Interno do Servidor: {}", e);
            }
            _ => {}
        }

        let details = match self {
            AppError::ValidationError(errors) => {
                let mut details = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                Some(json!(details))
            }
            _ => None,
        };

        ApiError {
            status,
            error: self.user_message(&locale.0),
            details,
        }
    }
}

// O erro já "traduzido", pronto para virar resposta HTTP
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflicts_map_to_409() {
        let id = Uuid::new_v4();
        assert_eq!(AppError::AlreadyCheckedOut(id).status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::NotCheckedOut(id).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::DuplicateGrant { user_id: id, certificate_id: id }.status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn integrity_defect_is_a_server_error() {
        assert_eq!(
            AppError::NoOpenAssignment(Uuid::new_v4()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn messages_follow_the_locale() {
        let err = AppError::not_found(Entity::Item, Uuid::new_v4());
        assert_eq!(err.to_api_error(&Locale("sv".into())).error, "Objektet hittades inte.");
        assert_eq!(err.to_api_error(&Locale("en".into())).error, "Item was not found.");
    }
}
