// src/services/lifecycle_service.rs
//
// Máquina de estados do item:
//   available --checkout--> checked-out --checkin--> available
//   available <--override--> maintenance / lost   (nunca de/para checked-out)
// Invariante: status == checked-out <=> existe exatamente um empréstimo aberto.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::{
        clock::Clock,
        error::{AppError, Entity},
    },
    db::{EntityStore, StoreTx},
    models::{
        activity::{NewActivity, Priority},
        inventory::{
            Item, ItemPatch, ItemStatus, LoanReceipt, MaintenanceInput, MaintenanceLog, NewItem,
            NewMaintenanceLog, StatusChange, StatusGuard,
        },
    },
    services::activity_service::ActivityService,
};

pub const TITLE_ITEM_LOANED: &str = "Material utlånat";
pub const TITLE_ITEM_RETURNED: &str = "Material återlämnat";
pub const TITLE_ITEM_CREATED: &str = "Nytt material registrerat";
pub const TITLE_ITEM_UPDATED: &str = "Material uppdaterat";
pub const TITLE_STATUS_CHANGED: &str = "Status ändrad";
pub const TITLE_MAINTENANCE_DONE: &str = "Underhåll genomfört";

#[derive(Clone)]
pub struct LifecycleService {
    store: Arc<dyn EntityStore>,
    clock: Arc<dyn Clock>,
    activities: ActivityService,
}

impl LifecycleService {
    pub fn new(store: Arc<dyn EntityStore>, clock: Arc<dyn Clock>, activities: ActivityService) -> Self {
        Self { store, clock, activities }
    }

    async fn ensure_category(tx: &mut dyn StoreTx, category_id: Option<Uuid>) -> Result<(), AppError> {
        if let Some(id) = category_id {
            tx.get_category(id)
                .await?
                .ok_or_else(|| AppError::not_found(Entity::Category, id))?;
        }
        Ok(())
    }

    // --- CHECKOUT (UTLÅNING) ---
    pub async fn checkout(&self, item_id: Uuid, user_id: Uuid) -> Result<LoanReceipt, AppError> {
        let mut tx = self.store.begin().await?;

        // 1. Trava o item e valida as referências
        let item = tx
            .get_item_for_update(item_id)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Item, item_id))?;
        let user = tx
            .get_profile(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Profile, user_id))?;

        // 2. Regra de transição: só sai quem está "available"
        match item.status {
            ItemStatus::Available => {}
            ItemStatus::CheckedOut => return Err(AppError::AlreadyCheckedOut(item_id)),
            status => return Err(AppError::ItemUnavailable { id: item_id, status }),
        }

        // 3. UPDATE condicional: se outro checkout chegou antes, nada é alterado
        let item = tx
            .set_item_status(
                item_id,
                StatusChange {
                    status: ItemStatus::CheckedOut,
                    assigned_to: Some(user.name.clone()),
                    guard: StatusGuard::Is(ItemStatus::Available),
                },
            )
            .await?
            .ok_or(AppError::AlreadyCheckedOut(item_id))?;

        // 4. Abre o empréstimo
        let now = self.clock.now();
        let mut assignment = tx.create_assignment(item_id, user_id, now).await?;

        // 5. Histórico
        self.activities
            .record(
                &mut *tx,
                NewActivity {
                    title: TITLE_ITEM_LOANED.to_string(),
                    description: Some(format!("Material {} har lånats ut till {}", item.name, user.name)),
                    user_id: Some(user_id),
                    related_item_id: Some(item_id),
                    priority: Some(Priority::Low),
                },
            )
            .await?;

        tx.commit().await?;

        tracing::info!(%item_id, %user_id, assignment_id = %assignment.id, "Item emprestado");

        assignment.item_name = Some(item.name.clone());
        assignment.user_name = Some(user.name);
        Ok(LoanReceipt { item, assignment })
    }

    // --- CHECKIN (ÅTERLÄMNING) ---
    pub async fn checkin(&self, item_id: Uuid) -> Result<LoanReceipt, AppError> {
        let mut tx = self.store.begin().await?;

        let item = tx
            .get_item_for_update(item_id)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Item, item_id))?;

        if item.status != ItemStatus::CheckedOut {
            return Err(AppError::NotCheckedOut(item_id));
        }

        // Status diz "checked-out" mas não há empréstimo aberto: defeito de dados, não erro do usuário
        let Some(open) = tx.find_open_assignment(item_id).await? else {
            tracing::error!(%item_id, "Item utcheckat sem empréstimo aberto");
            return Err(AppError::NoOpenAssignment(item_id));
        };

        // return_date nunca antes de assigned_date, mesmo com relógio adiantado/atrasado
        let return_date = self.clock.now().max(open.assigned_date);
        let mut assignment = tx
            .close_assignment(open.id, return_date)
            .await?
            .ok_or(AppError::NoOpenAssignment(item_id))?;

        let item = tx
            .set_item_status(
                item_id,
                StatusChange {
                    status: ItemStatus::Available,
                    assigned_to: None,
                    guard: StatusGuard::Is(ItemStatus::CheckedOut),
                },
            )
            .await?
            .ok_or(AppError::NotCheckedOut(item_id))?;

        let user_name = tx.get_profile(open.user_id).await?.map(|p| p.name);

        self.activities
            .record(
                &mut *tx,
                NewActivity {
                    title: TITLE_ITEM_RETURNED.to_string(),
                    description: Some(format!(
                        "Material {} har lämnats tillbaka av {}",
                        item.name,
                        user_name.as_deref().unwrap_or("okänd användare")
                    )),
                    user_id: Some(open.user_id),
                    related_item_id: Some(item_id),
                    priority: Some(Priority::Low),
                },
            )
            .await?;

        tx.commit().await?;

        tracing::info!(%item_id, user_id = %open.user_id, assignment_id = %assignment.id, "Item devolvido");

        assignment.item_name = Some(item.name.clone());
        assignment.user_name = user_name;
        Ok(LoanReceipt { item, assignment })
    }

    // --- CREATE ITEM ---
    pub async fn create_item(&self, mut new_item: NewItem, actor: Uuid) -> Result<Item, AppError> {
        let mut tx = self.store.begin().await?;

        Self::ensure_category(&mut *tx, new_item.category_id).await?;

        if new_item.last_checked.is_none() {
            new_item.last_checked = Some(self.clock.now().date_naive());
        }
        let item = tx.create_item(new_item).await?;

        self.activities
            .record(
                &mut *tx,
                NewActivity {
                    title: TITLE_ITEM_CREATED.to_string(),
                    description: Some(format!("Material {} har registrerats", item.name)),
                    user_id: Some(actor),
                    related_item_id: Some(item.id),
                    priority: Some(Priority::Low),
                },
            )
            .await?;

        tx.commit().await?;

        tracing::info!(item_id = %item.id, name = %item.name, "Item criado");
        Ok(item)
    }

    // --- UPDATE ITEM ---
    // Não mexe no status; o nome da categoria volta recalculado pelo store.
    pub async fn update_item(&self, item_id: Uuid, patch: ItemPatch, actor: Uuid) -> Result<Item, AppError> {
        let mut tx = self.store.begin().await?;

        if let Some(category_id) = patch.category_id {
            Self::ensure_category(&mut *tx, category_id).await?;
        }

        let item = tx
            .update_item(item_id, patch)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Item, item_id))?;

        self.activities
            .record(
                &mut *tx,
                NewActivity {
                    title: TITLE_ITEM_UPDATED.to_string(),
                    description: Some(format!("Material {} har uppdaterats", item.name)),
                    user_id: Some(actor),
                    related_item_id: Some(item_id),
                    priority: Some(Priority::Low),
                },
            )
            .await?;

        tx.commit().await?;
        Ok(item)
    }

    // --- OVERRIDE DE STATUS (ADMIN) ---
    // Só entre available/maintenance/lost. Empréstimos passam obrigatoriamente por checkout/checkin.
    pub async fn set_status_override(&self, item_id: Uuid, status: ItemStatus, actor: Uuid) -> Result<Item, AppError> {
        let mut tx = self.store.begin().await?;

        let item = tx
            .get_item_for_update(item_id)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Item, item_id))?;

        if status == ItemStatus::CheckedOut || item.status == ItemStatus::CheckedOut {
            return Err(AppError::InvalidStatusTransition { from: item.status, to: status });
        }
        if item.status == status {
            return Ok(item);
        }

        let previous = item.status;
        let item = tx
            .set_item_status(
                item_id,
                StatusChange {
                    status,
                    assigned_to: None,
                    guard: StatusGuard::IsNot(ItemStatus::CheckedOut),
                },
            )
            .await?
            .ok_or(AppError::InvalidStatusTransition { from: ItemStatus::CheckedOut, to: status })?;

        let priority = match status {
            ItemStatus::Lost => Priority::High,
            _ => Priority::Medium,
        };
        self.activities
            .record(
                &mut *tx,
                NewActivity {
                    title: TITLE_STATUS_CHANGED.to_string(),
                    description: Some(format!(
                        "Status för {} ändrad från {} till {}",
                        item.name,
                        previous.as_str(),
                        status.as_str()
                    )),
                    user_id: Some(actor),
                    related_item_id: Some(item_id),
                    priority: Some(priority),
                },
            )
            .await?;

        tx.commit().await?;

        tracing::info!(%item_id, from = previous.as_str(), to = status.as_str(), "Status alterado manualmente");
        Ok(item)
    }

    // --- MANUTENÇÃO ---
    pub async fn log_maintenance(&self, item_id: Uuid, input: MaintenanceInput) -> Result<MaintenanceLog, AppError> {
        let mut tx = self.store.begin().await?;

        let item = tx
            .get_item_for_update(item_id)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Item, item_id))?;
        let user = match input.user_id {
            Some(id) => Some(
                tx.get_profile(id)
                    .await?
                    .ok_or_else(|| AppError::not_found(Entity::Profile, id))?,
            ),
            None => None,
        };

        let maintenance_date = input
            .maintenance_date
            .unwrap_or_else(|| self.clock.now().date_naive());

        let mut log = tx
            .create_maintenance_log(NewMaintenanceLog {
                item_id,
                user_id: input.user_id,
                maintenance_date,
                description: input.description,
                next_maintenance_date: input.next_maintenance_date,
            })
            .await?;

        // last_checked só avança (um registro retroativo não "volta" a data)
        if item.last_checked.is_none_or(|d| d < maintenance_date) {
            tx.touch_item_last_checked(item_id, maintenance_date).await?;
        }

        let description = match &user {
            Some(user) => format!("Underhåll på {} har utförts av {}", item.name, user.name),
            None => format!("Underhåll på {} har utförts", item.name),
        };
        self.activities
            .record(
                &mut *tx,
                NewActivity {
                    title: TITLE_MAINTENANCE_DONE.to_string(),
                    description: Some(description),
                    user_id: input.user_id,
                    related_item_id: Some(item_id),
                    priority: Some(Priority::Medium),
                },
            )
            .await?;

        tx.commit().await?;

        log.item_name = Some(item.name);
        log.user_name = user.map(|u| u.name);
        Ok(log)
    }
}
