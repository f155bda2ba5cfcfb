// src/models/people.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "profile_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "profile_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProfileStatus {
    #[default]
    Active,
    Inactive,
    Sick,
    Vacation,
}

// --- Funcionários ---
// Nunca são apagados fisicamente; "inactive" cobre desligamentos.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    #[schema(example = "Johan Andersson")]
    pub name: String,
    pub role: Role,
    #[schema(example = "IT Avdelning")]
    pub department: Option<String>,
    #[schema(example = "johan@example.com")]
    pub contact: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub status: ProfileStatus,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewProfile {
    pub name: String,
    pub role: Role,
    pub department: Option<String>,
    pub contact: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub status: ProfileStatus,
}

#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub role: Option<Role>,
    pub department: Option<Option<String>>,
    pub contact: Option<Option<String>>,
    pub hire_date: Option<Option<NaiveDate>>,
    pub status: Option<ProfileStatus>,
}

impl ProfilePatch {
    pub fn apply(&self, profile: &mut Profile) {
        if let Some(name) = &self.name {
            profile.name = name.clone();
        }
        if let Some(role) = self.role {
            profile.role = role;
        }
        if let Some(department) = &self.department {
            profile.department = department.clone();
        }
        if let Some(contact) = &self.contact {
            profile.contact = contact.clone();
        }
        if let Some(hire_date) = self.hire_date {
            profile.hire_date = hire_date;
        }
        if let Some(status) = self.status {
            profile.status = status;
        }
    }
}

// --- Catálogo de certificados ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub id: Uuid,
    #[schema(example = "Truckkort A")]
    pub name: String,
    #[schema(example = "Certifiering för motviktstruck")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

// --- Certificado concedido a um funcionário ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserCertificate {
    pub id: Uuid,
    pub user_id: Uuid,
    pub certificate_id: Uuid,
    pub expiry_date: NaiveDate,
    pub created_at: DateTime<Utc>,

    // Campos derivados na leitura (nunca gravados)
    #[sqlx(skip)]
    pub certificate_name: Option<String>,
    #[sqlx(skip)]
    pub user_name: Option<String>,
    #[sqlx(skip)]
    #[schema(example = 90)]
    pub days_left: Option<i64>,
    #[sqlx(skip)]
    pub expired: bool,
}

#[derive(Debug, Clone)]
pub struct NewUserCertificate {
    pub user_id: Uuid,
    pub certificate_id: Uuid,
    pub expiry_date: NaiveDate,
}
