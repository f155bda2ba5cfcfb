// src/services/query_service.rs
//
// Consultas de leitura para as telas (JOINs feitos aqui, em cima do CRUD do store).

use std::{collections::HashMap, sync::Arc};

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{EntityStore, StoreTx},
    models::{
        dashboard::{CategoryWithCount, Overview},
        inventory::{AssignmentFilter, Item, ItemAssignment, ItemFilter, ItemStatus, MaintenanceLog},
        people::UserCertificate,
    },
    services::certificate_service::CertificateService,
};

// Janela usada no card "utgår snart" da visão geral
pub const OVERVIEW_EXPIRY_WINDOW_DAYS: i64 = 30;

#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn EntityStore>,
    certificates: CertificateService,
}

impl QueryService {
    pub fn new(store: Arc<dyn EntityStore>, certificates: CertificateService) -> Self {
        Self { store, certificates }
    }

    pub async fn categories_with_counts(&self) -> Result<Vec<CategoryWithCount>, AppError> {
        let mut tx = self.store.begin().await?;
        let categories = tx.list_categories().await?;
        let items = tx.list_items(&ItemFilter::default()).await?;
        tx.commit().await?;

        let mut counts: HashMap<Uuid, usize> = HashMap::new();
        for category_id in items.iter().filter_map(|i| i.category_id) {
            *counts.entry(category_id).or_default() += 1;
        }

        Ok(categories
            .into_iter()
            .map(|category| {
                let item_count = counts.get(&category.id).copied().unwrap_or(0);
                CategoryWithCount { category, item_count }
            })
            .collect())
    }

    /// Filtro AND; `assigned_to` vem do empréstimo aberto (não do cache gravado no item).
    pub async fn items_filtered(&self, filter: &ItemFilter) -> Result<Vec<Item>, AppError> {
        let mut tx = self.store.begin().await?;
        let items = tx.list_items(filter).await?;
        let open = tx
            .list_assignments(AssignmentFilter { open: Some(true), ..Default::default() })
            .await?;
        let names = profile_names(&mut *tx).await?;
        tx.commit().await?;

        let holder: HashMap<Uuid, Uuid> = open.iter().map(|a| (a.item_id, a.user_id)).collect();
        Ok(items
            .into_iter()
            .map(|mut item| {
                item.assigned_to = holder
                    .get(&item.id)
                    .and_then(|user_id| names.get(user_id).cloned());
                item
            })
            .collect())
    }

    pub async fn open_assignments(&self, user_id: Option<Uuid>) -> Result<Vec<ItemAssignment>, AppError> {
        self.assignments(AssignmentFilter { user_id, open: Some(true), ..Default::default() })
            .await
    }

    pub async fn closed_assignments(&self, user_id: Option<Uuid>) -> Result<Vec<ItemAssignment>, AppError> {
        self.assignments(AssignmentFilter { user_id, open: Some(false), ..Default::default() })
            .await
    }

    async fn assignments(&self, filter: AssignmentFilter) -> Result<Vec<ItemAssignment>, AppError> {
        let mut tx = self.store.begin().await?;
        let assignments = tx.list_assignments(filter).await?;
        let users = profile_names(&mut *tx).await?;
        let items = item_names(&mut *tx).await?;
        tx.commit().await?;

        Ok(assignments
            .into_iter()
            .map(|mut a| {
                a.user_name = users.get(&a.user_id).cloned();
                a.item_name = items.get(&a.item_id).cloned();
                a
            })
            .collect())
    }

    /// Concessões com `days_left < threshold_days`, mais urgentes primeiro (vencidas incluídas).
    pub async fn expiring_certificates(&self, threshold_days: i64) -> Result<Vec<UserCertificate>, AppError> {
        let grants = self.certificates.list_user_certificates(None).await?;
        Ok(grants
            .into_iter()
            .filter(|g| g.days_left.is_some_and(|d| d < threshold_days))
            .collect())
    }

    pub async fn maintenance_history(&self, item_id: Option<Uuid>) -> Result<Vec<MaintenanceLog>, AppError> {
        let mut tx = self.store.begin().await?;
        let logs = tx.list_maintenance_logs(item_id).await?;
        let users = profile_names(&mut *tx).await?;
        let items = item_names(&mut *tx).await?;
        tx.commit().await?;

        Ok(logs
            .into_iter()
            .map(|mut log| {
                log.user_name = log.user_id.and_then(|id| users.get(&id).cloned());
                log.item_name = items.get(&log.item_id).cloned();
                log
            })
            .collect())
    }

    pub async fn overview(&self) -> Result<Overview, AppError> {
        let mut tx = self.store.begin().await?;
        let items = tx.list_items(&ItemFilter::default()).await?;
        tx.commit().await?;

        let grants = self.certificates.list_user_certificates(None).await?;

        let mut overview = Overview { total_items: items.len(), ..Default::default() };
        for item in &items {
            match item.status {
                ItemStatus::Available => overview.available += 1,
                ItemStatus::CheckedOut => overview.checked_out += 1,
                ItemStatus::Maintenance => overview.in_maintenance += 1,
                ItemStatus::Lost => overview.lost += 1,
            }
        }
        for days in grants.iter().filter_map(|g| g.days_left) {
            if days >= 0 {
                overview.active_certificates += 1;
                if days < OVERVIEW_EXPIRY_WINDOW_DAYS {
                    overview.expiring_certificates += 1;
                }
            }
        }
        Ok(overview)
    }
}

async fn profile_names(tx: &mut dyn StoreTx) -> Result<HashMap<Uuid, String>, AppError> {
    Ok(tx.list_profiles().await?.into_iter().map(|p| (p.id, p.name)).collect())
}

async fn item_names(tx: &mut dyn StoreTx) -> Result<HashMap<Uuid, String>, AppError> {
    Ok(tx
        .list_items(&ItemFilter::default())
        .await?
        .into_iter()
        .map(|i| (i.id, i.name))
        .collect())
}
