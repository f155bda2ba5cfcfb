// src/db/memory_store.rs
//
// Store em memória: usado nos testes e no modo STORE=memory.
// Transações são serializadas por um Mutex assíncrono; cada uma trabalha
// numa cópia do estado que só substitui o original no commit.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::{EntityStore, StoreTx},
    models::{
        activity::{Activity, ActivityRecord},
        inventory::{
            AssignmentFilter, Category, Item, ItemAssignment, ItemFilter, ItemPatch, ItemStatus,
            MaintenanceLog, NewItem, NewMaintenanceLog, StatusChange,
        },
        people::{
            Certificate, NewProfile, NewUserCertificate, Profile, ProfilePatch, UserCertificate,
        },
    },
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    profiles: Vec<Profile>,
    certificates: Vec<Certificate>,
    user_certificates: Vec<UserCertificate>,
    categories: Vec<Category>,
    items: Vec<Item>,
    assignments: Vec<ItemAssignment>,
    maintenance_logs: Vec<MaintenanceLog>,
    activities: Vec<Activity>,
}

impl MemoryState {
    fn category_name(&self, category_id: Option<Uuid>) -> Option<String> {
        let id = category_id?;
        self.categories.iter().find(|c| c.id == id).map(|c| c.name.clone())
    }

    // Equivalente ao LEFT JOIN categories do store Postgres
    fn with_category_name(&self, item: &Item) -> Item {
        let mut item = item.clone();
        item.category_name = self.category_name(item.category_id);
        item
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, AppError> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTx { guard, working }))
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl StoreTx for MemoryTx {
    // ---
    // Funcionários
    // ---

    async fn get_profile(&mut self, id: Uuid) -> Result<Option<Profile>, AppError> {
        Ok(self.working.profiles.iter().find(|p| p.id == id).cloned())
    }

    async fn list_profiles(&mut self) -> Result<Vec<Profile>, AppError> {
        let mut profiles = self.working.profiles.clone();
        profiles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(profiles)
    }

    async fn create_profile(&mut self, profile: NewProfile) -> Result<Profile, AppError> {
        let profile = Profile {
            id: Uuid::new_v4(),
            name: profile.name,
            role: profile.role,
            department: profile.department,
            contact: profile.contact,
            hire_date: profile.hire_date,
            status: profile.status,
            created_at: Utc::now(),
        };
        self.working.profiles.push(profile.clone());
        Ok(profile)
    }

    async fn update_profile(&mut self, id: Uuid, patch: ProfilePatch) -> Result<Option<Profile>, AppError> {
        let Some(profile) = self.working.profiles.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        patch.apply(profile);
        Ok(Some(profile.clone()))
    }

    // ---
    // Certificados
    // ---

    async fn get_certificate(&mut self, id: Uuid) -> Result<Option<Certificate>, AppError> {
        Ok(self.working.certificates.iter().find(|c| c.id == id).cloned())
    }

    async fn list_certificates(&mut self) -> Result<Vec<Certificate>, AppError> {
        let mut certificates = self.working.certificates.clone();
        certificates.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(certificates)
    }

    async fn create_certificate(&mut self, name: &str, description: Option<&str>) -> Result<Certificate, AppError> {
        let certificate = Certificate {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: description.map(str::to_string),
            created_at: Utc::now(),
        };
        self.working.certificates.push(certificate.clone());
        Ok(certificate)
    }

    async fn find_user_certificate(
        &mut self,
        user_id: Uuid,
        certificate_id: Uuid,
    ) -> Result<Option<UserCertificate>, AppError> {
        Ok(self
            .working
            .user_certificates
            .iter()
            .find(|g| g.user_id == user_id && g.certificate_id == certificate_id)
            .cloned())
    }

    async fn create_user_certificate(&mut self, grant: NewUserCertificate) -> Result<UserCertificate, AppError> {
        // Mesma regra da UNIQUE (user_id, certificate_id) do Postgres
        let duplicate = self
            .working
            .user_certificates
            .iter()
            .any(|g| g.user_id == grant.user_id && g.certificate_id == grant.certificate_id);
        if duplicate {
            return Err(AppError::DuplicateGrant {
                user_id: grant.user_id,
                certificate_id: grant.certificate_id,
            });
        }

        let record = UserCertificate {
            id: Uuid::new_v4(),
            user_id: grant.user_id,
            certificate_id: grant.certificate_id,
            expiry_date: grant.expiry_date,
            created_at: Utc::now(),
            certificate_name: None,
            user_name: None,
            days_left: None,
            expired: false,
        };
        self.working.user_certificates.push(record.clone());
        Ok(record)
    }

    async fn list_user_certificates(&mut self, user_id: Option<Uuid>) -> Result<Vec<UserCertificate>, AppError> {
        Ok(self
            .working
            .user_certificates
            .iter()
            .filter(|g| user_id.is_none_or(|id| g.user_id == id))
            .cloned()
            .collect())
    }

    // ---
    // Categorias
    // ---

    async fn get_category(&mut self, id: Uuid) -> Result<Option<Category>, AppError> {
        Ok(self.working.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn list_categories(&mut self) -> Result<Vec<Category>, AppError> {
        let mut categories = self.working.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn create_category(&mut self, name: &str, description: Option<&str>) -> Result<Category, AppError> {
        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: description.map(str::to_string),
            created_at: Utc::now(),
        };
        self.working.categories.push(category.clone());
        Ok(category)
    }

    // ---
    // Itens
    // ---

    async fn get_item(&mut self, id: Uuid) -> Result<Option<Item>, AppError> {
        Ok(self
            .working
            .items
            .iter()
            .find(|i| i.id == id)
            .map(|i| self.working.with_category_name(i)))
    }

    async fn get_item_for_update(&mut self, id: Uuid) -> Result<Option<Item>, AppError> {
        // A transação inteira já segura o Mutex
        self.get_item(id).await
    }

    async fn list_items(&mut self, filter: &ItemFilter) -> Result<Vec<Item>, AppError> {
        let mut items: Vec<Item> = self
            .working
            .items
            .iter()
            .filter(|i| filter.matches(i))
            .map(|i| self.working.with_category_name(i))
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    async fn create_item(&mut self, item: NewItem) -> Result<Item, AppError> {
        let now = Utc::now();
        let item = Item {
            id: Uuid::new_v4(),
            name: item.name,
            description: item.description,
            category_id: item.category_id,
            serial_number: item.serial_number,
            status: ItemStatus::Available,
            purchase_date: item.purchase_date,
            last_checked: item.last_checked,
            item_type: item.item_type.unwrap_or_default(),
            assigned_to: None,
            created_at: now,
            updated_at: now,
            category_name: None,
        };
        self.working.items.push(item.clone());
        Ok(self.working.with_category_name(&item))
    }

    async fn update_item(&mut self, id: Uuid, patch: ItemPatch) -> Result<Option<Item>, AppError> {
        let Some(item) = self.working.items.iter_mut().find(|i| i.id == id) else {
            return Ok(None);
        };
        patch.apply(item);
        item.updated_at = Utc::now();
        let item = item.clone();
        Ok(Some(self.working.with_category_name(&item)))
    }

    async fn set_item_status(&mut self, id: Uuid, change: StatusChange) -> Result<Option<Item>, AppError> {
        let Some(item) = self.working.items.iter_mut().find(|i| i.id == id) else {
            return Ok(None);
        };
        if !change.guard.allows(item.status) {
            return Ok(None);
        }
        item.status = change.status;
        item.assigned_to = change.assigned_to;
        item.updated_at = Utc::now();
        let item = item.clone();
        Ok(Some(self.working.with_category_name(&item)))
    }

    // ---
    // Empréstimos
    // ---

    async fn create_assignment(
        &mut self,
        item_id: Uuid,
        user_id: Uuid,
        assigned_date: DateTime<Utc>,
    ) -> Result<ItemAssignment, AppError> {
        // Mesma regra do índice único parcial (item_id) WHERE return_date IS NULL
        if self.working.assignments.iter().any(|a| a.item_id == item_id && a.is_open()) {
            return Err(AppError::AlreadyCheckedOut(item_id));
        }

        let assignment = ItemAssignment {
            id: Uuid::new_v4(),
            item_id,
            user_id,
            assigned_date,
            return_date: None,
            item_name: None,
            user_name: None,
        };
        self.working.assignments.push(assignment.clone());
        Ok(assignment)
    }

    async fn close_assignment(
        &mut self,
        assignment_id: Uuid,
        return_date: DateTime<Utc>,
    ) -> Result<Option<ItemAssignment>, AppError> {
        let Some(assignment) = self
            .working
            .assignments
            .iter_mut()
            .find(|a| a.id == assignment_id && a.is_open())
        else {
            return Ok(None);
        };
        assignment.return_date = Some(return_date);
        Ok(Some(assignment.clone()))
    }

    async fn find_open_assignment(&mut self, item_id: Uuid) -> Result<Option<ItemAssignment>, AppError> {
        Ok(self
            .working
            .assignments
            .iter()
            .find(|a| a.item_id == item_id && a.is_open())
            .cloned())
    }

    async fn list_assignments(&mut self, filter: AssignmentFilter) -> Result<Vec<ItemAssignment>, AppError> {
        let mut assignments: Vec<ItemAssignment> = self
            .working
            .assignments
            .iter()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        assignments.sort_by(|a, b| b.assigned_date.cmp(&a.assigned_date));
        Ok(assignments)
    }

    // ---
    // Manutenção
    // ---

    async fn create_maintenance_log(&mut self, log: NewMaintenanceLog) -> Result<MaintenanceLog, AppError> {
        let log = MaintenanceLog {
            id: Uuid::new_v4(),
            item_id: log.item_id,
            user_id: log.user_id,
            maintenance_date: log.maintenance_date,
            description: log.description,
            next_maintenance_date: log.next_maintenance_date,
            created_at: Utc::now(),
            item_name: None,
            user_name: None,
        };
        self.working.maintenance_logs.push(log.clone());
        Ok(log)
    }

    async fn list_maintenance_logs(&mut self, item_id: Option<Uuid>) -> Result<Vec<MaintenanceLog>, AppError> {
        let mut logs: Vec<MaintenanceLog> = self
            .working
            .maintenance_logs
            .iter()
            .filter(|l| item_id.is_none_or(|id| l.item_id == id))
            .cloned()
            .collect();
        logs.sort_by(|a, b| b.maintenance_date.cmp(&a.maintenance_date));
        Ok(logs)
    }

    async fn touch_item_last_checked(&mut self, item_id: Uuid, date: NaiveDate) -> Result<(), AppError> {
        if let Some(item) = self.working.items.iter_mut().find(|i| i.id == item_id) {
            item.last_checked = Some(date);
            item.updated_at = Utc::now();
        }
        Ok(())
    }

    // ---
    // Atividades
    // ---

    async fn create_activity(&mut self, activity: ActivityRecord) -> Result<Activity, AppError> {
        let activity = Activity {
            id: Uuid::new_v4(),
            title: activity.title,
            description: activity.description,
            user_id: activity.user_id,
            related_item_id: activity.related_item_id,
            priority: activity.priority,
            timestamp: activity.timestamp,
            user_name: activity.user_name,
            item_name: activity.item_name,
            date: String::new(),
        };
        self.working.activities.push(activity.clone());
        Ok(activity)
    }

    async fn list_activities(&mut self, limit: usize) -> Result<Vec<Activity>, AppError> {
        // sort_by é estável: empates mantêm a ordem de inserção
        let mut activities = self.working.activities.clone();
        activities.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        activities.truncate(limit);
        Ok(activities)
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let MemoryTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
