// src/models/dashboard.rs

use serde::Serialize;
use utoipa::ToSchema;

use crate::models::inventory::Category;

// Categoria com a contagem de itens (derivada, nunca gravada)
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWithCount {
    #[serde(flatten)]
    pub category: Category,
    pub item_count: usize,
}

// Os cards do topo da "Översikt"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_items: usize,
    pub available: usize,
    pub checked_out: usize,
    pub in_maintenance: usize,
    pub lost: usize,
    pub active_certificates: usize, // days_left >= 0
    pub expiring_certificates: usize, // 0 <= days_left < 30
}
