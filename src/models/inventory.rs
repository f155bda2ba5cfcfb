// src/models/inventory.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "item_status", rename_all = "kebab-case")] // Banco
#[serde(rename_all = "kebab-case")] // JSON
pub enum ItemStatus {
    Available,  // Vira "available"
    CheckedOut, // Vira "checked-out"
    Maintenance,
    Lost,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Available => "available",
            ItemStatus::CheckedOut => "checked-out",
            ItemStatus::Maintenance => "maintenance",
            ItemStatus::Lost => "lost",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "item_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    #[default]
    Tool,
    Safety,
}

// --- 1. Categorias ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    #[schema(example = "Elverktyg")]
    pub name: String,
    #[schema(example = "Eldrivna verktyg")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

// --- 2. Itens (ferramentas e equipamentos de segurança) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: Uuid,
    #[schema(example = "Borrmaskin Bosch")]
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    #[schema(example = "BOS-18V-001")]
    pub serial_number: Option<String>,
    pub status: ItemStatus,
    pub purchase_date: Option<NaiveDate>,
    pub last_checked: Option<NaiveDate>,
    pub item_type: ItemType,
    // Cache de exibição gravado no checkout (nome de quem está com o item)
    pub assigned_to: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    // Derivado (JOIN com categories), nunca gravado
    #[sqlx(default)]
    pub category_name: Option<String>,
}

// Dados para criação de um item
#[derive(Debug, Clone, Default)]
pub struct NewItem {
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub serial_number: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub last_checked: Option<NaiveDate>,
    pub item_type: Option<ItemType>,
}

// Atualização parcial. O status NÃO entra aqui: só checkout/checkin/override mexem nele.
// `Some(None)` limpa o campo, `None` mantém.
#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub category_id: Option<Option<Uuid>>,
    pub serial_number: Option<Option<String>>,
    pub purchase_date: Option<Option<NaiveDate>>,
    pub last_checked: Option<Option<NaiveDate>>,
    pub item_type: Option<ItemType>,
}

impl ItemPatch {
    pub fn apply(&self, item: &mut Item) {
        if let Some(name) = &self.name {
            item.name = name.clone();
        }
        if let Some(description) = &self.description {
            item.description = description.clone();
        }
        if let Some(category_id) = self.category_id {
            item.category_id = category_id;
        }
        if let Some(serial_number) = &self.serial_number {
            item.serial_number = serial_number.clone();
        }
        if let Some(purchase_date) = self.purchase_date {
            item.purchase_date = purchase_date;
        }
        if let Some(last_checked) = self.last_checked {
            item.last_checked = last_checked;
        }
        if let Some(item_type) = self.item_type {
            item.item_type = item_type;
        }
    }
}

// Condição para a troca de status (UPDATE condicional no banco)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusGuard {
    Any,
    Is(ItemStatus),
    IsNot(ItemStatus),
}

impl StatusGuard {
    pub fn allows(&self, current: ItemStatus) -> bool {
        match self {
            StatusGuard::Any => true,
            StatusGuard::Is(expected) => current == *expected,
            StatusGuard::IsNot(blocked) => current != *blocked,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StatusChange {
    pub status: ItemStatus,
    pub assigned_to: Option<String>,
    pub guard: StatusGuard,
}

// Filtro conjuntivo (AND) para a listagem de itens
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ItemFilter {
    pub category_id: Option<Uuid>,
    pub status: Option<ItemStatus>,
    pub item_type: Option<ItemType>,
}

impl ItemFilter {
    pub fn matches(&self, item: &Item) -> bool {
        self.category_id.is_none_or(|id| item.category_id == Some(id))
            && self.status.is_none_or(|status| item.status == status)
            && self.item_type.is_none_or(|item_type| item.item_type == item_type)
    }
}

// --- 3. Empréstimos (ItemAssignment) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemAssignment {
    pub id: Uuid,
    pub item_id: Uuid,
    pub user_id: Uuid,
    pub assigned_date: DateTime<Utc>,
    // None = empréstimo "aberto"
    pub return_date: Option<DateTime<Utc>>,

    #[sqlx(skip)]
    pub item_name: Option<String>,
    #[sqlx(skip)]
    pub user_name: Option<String>,
}

impl ItemAssignment {
    pub fn is_open(&self) -> bool {
        self.return_date.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AssignmentFilter {
    pub item_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    // Some(true) = só abertos, Some(false) = só devolvidos
    pub open: Option<bool>,
}

impl AssignmentFilter {
    pub fn matches(&self, assignment: &ItemAssignment) -> bool {
        self.item_id.is_none_or(|id| assignment.item_id == id)
            && self.user_id.is_none_or(|id| assignment.user_id == id)
            && self.open.is_none_or(|open| assignment.is_open() == open)
    }
}

// Resultado de um checkout/checkin: o item já atualizado + o empréstimo
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoanReceipt {
    pub item: Item,
    pub assignment: ItemAssignment,
}

// --- 4. Manutenção ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceLog {
    pub id: Uuid,
    pub item_id: Uuid,
    pub user_id: Option<Uuid>,
    pub maintenance_date: NaiveDate,
    #[schema(example = "Rengöring och oljning")]
    pub description: Option<String>,
    pub next_maintenance_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,

    #[sqlx(skip)]
    pub item_name: Option<String>,
    #[sqlx(skip)]
    pub user_name: Option<String>,
}

// O que o chamador informa; a data cai para "hoje" se vier vazia
#[derive(Debug, Clone, Default)]
pub struct MaintenanceInput {
    pub user_id: Option<Uuid>,
    pub maintenance_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub next_maintenance_date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct NewMaintenanceLog {
    pub item_id: Uuid,
    pub user_id: Option<Uuid>,
    pub maintenance_date: NaiveDate,
    pub description: Option<String>,
    pub next_maintenance_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_guard_blocks_only_the_named_status() {
        let guard = StatusGuard::IsNot(ItemStatus::CheckedOut);
        assert!(guard.allows(ItemStatus::Available));
        assert!(guard.allows(ItemStatus::Lost));
        assert!(!guard.allows(ItemStatus::CheckedOut));

        assert!(StatusGuard::Is(ItemStatus::CheckedOut).allows(ItemStatus::CheckedOut));
        assert!(!StatusGuard::Is(ItemStatus::CheckedOut).allows(ItemStatus::Available));
    }

    #[test]
    fn status_serializes_as_kebab_case() {
        let json = serde_json::to_string(&ItemStatus::CheckedOut).unwrap();
        assert_eq!(json, "\"checked-out\"");
        let parsed: ItemStatus = serde_json::from_str("\"maintenance\"").unwrap();
        assert_eq!(parsed, ItemStatus::Maintenance);
    }
}
