// src/models/activity.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "activity_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

// --- Log de auditoria (append-only) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: Uuid,
    #[schema(example = "Material utlånat")]
    pub title: String,
    pub description: Option<String>,
    pub user_id: Option<Uuid>,
    pub related_item_id: Option<Uuid>,
    pub priority: Priority,
    pub timestamp: DateTime<Utc>,
    // Nomes "congelados" no momento da gravação
    pub user_name: Option<String>,
    pub item_name: Option<String>,

    // "idag", "igår" ou a data (YYYY-MM-DD); recalculado a cada leitura
    #[sqlx(skip)]
    #[schema(example = "idag")]
    pub date: String,
}

// O que os serviços pedem para registrar
#[derive(Debug, Clone, Default)]
pub struct NewActivity {
    pub title: String,
    pub description: Option<String>,
    pub user_id: Option<Uuid>,
    pub related_item_id: Option<Uuid>,
    pub priority: Option<Priority>,
}

// O que de fato vai para o store (com timestamp e nomes resolvidos)
#[derive(Debug, Clone)]
pub struct ActivityRecord {
    pub title: String,
    pub description: Option<String>,
    pub user_id: Option<Uuid>,
    pub related_item_id: Option<Uuid>,
    pub priority: Priority,
    pub timestamp: DateTime<Utc>,
    pub user_name: Option<String>,
    pub item_name: Option<String>,
}
