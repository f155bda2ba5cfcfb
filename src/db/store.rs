// src/db/store.rs
//
// Contrato do "Entity Store Adapter". Nenhuma regra de negócio mora aqui:
// só CRUD e filtros. Tudo acontece dentro de uma transação
// (`begin` -> operações -> `commit`); dropar sem commit = rollback.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        activity::{Activity, ActivityRecord},
        inventory::{
            AssignmentFilter, Category, Item, ItemAssignment, ItemFilter, ItemPatch,
            MaintenanceLog, NewItem, NewMaintenanceLog, StatusChange,
        },
        people::{
            Certificate, NewProfile, NewUserCertificate, Profile, ProfilePatch, UserCertificate,
        },
    },
};

#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, AppError>;
}

#[async_trait]
pub trait StoreTx: Send {
    // --- Funcionários ---
    async fn get_profile(&mut self, id: Uuid) -> Result<Option<Profile>, AppError>;
    async fn list_profiles(&mut self) -> Result<Vec<Profile>, AppError>;
    async fn create_profile(&mut self, profile: NewProfile) -> Result<Profile, AppError>;
    async fn update_profile(&mut self, id: Uuid, patch: ProfilePatch) -> Result<Option<Profile>, AppError>;

    // --- Certificados ---
    async fn get_certificate(&mut self, id: Uuid) -> Result<Option<Certificate>, AppError>;
    async fn list_certificates(&mut self) -> Result<Vec<Certificate>, AppError>;
    async fn create_certificate(&mut self, name: &str, description: Option<&str>) -> Result<Certificate, AppError>;
    async fn find_user_certificate(
        &mut self,
        user_id: Uuid,
        certificate_id: Uuid,
    ) -> Result<Option<UserCertificate>, AppError>;
    /// Falha com `DuplicateGrant` se o par (usuário, certificado) já existir.
    async fn create_user_certificate(&mut self, grant: NewUserCertificate) -> Result<UserCertificate, AppError>;
    async fn list_user_certificates(&mut self, user_id: Option<Uuid>) -> Result<Vec<UserCertificate>, AppError>;

    // --- Categorias ---
    async fn get_category(&mut self, id: Uuid) -> Result<Option<Category>, AppError>;
    async fn list_categories(&mut self) -> Result<Vec<Category>, AppError>;
    async fn create_category(&mut self, name: &str, description: Option<&str>) -> Result<Category, AppError>;

    // --- Itens ---
    async fn get_item(&mut self, id: Uuid) -> Result<Option<Item>, AppError>;
    /// Igual a `get_item`, mas trava a linha até o fim da transação.
    async fn get_item_for_update(&mut self, id: Uuid) -> Result<Option<Item>, AppError>;
    async fn list_items(&mut self, filter: &ItemFilter) -> Result<Vec<Item>, AppError>;
    async fn create_item(&mut self, item: NewItem) -> Result<Item, AppError>;
    async fn update_item(&mut self, id: Uuid, patch: ItemPatch) -> Result<Option<Item>, AppError>;
    /// UPDATE condicional: devolve `None` se o item não existe ou se o guard não bate.
    async fn set_item_status(&mut self, id: Uuid, change: StatusChange) -> Result<Option<Item>, AppError>;

    // --- Empréstimos ---
    /// Falha com `AlreadyCheckedOut` se o item já tiver um empréstimo aberto.
    async fn create_assignment(
        &mut self,
        item_id: Uuid,
        user_id: Uuid,
        assigned_date: DateTime<Utc>,
    ) -> Result<ItemAssignment, AppError>;
    async fn close_assignment(
        &mut self,
        assignment_id: Uuid,
        return_date: DateTime<Utc>,
    ) -> Result<Option<ItemAssignment>, AppError>;
    async fn find_open_assignment(&mut self, item_id: Uuid) -> Result<Option<ItemAssignment>, AppError>;
    async fn list_assignments(&mut self, filter: AssignmentFilter) -> Result<Vec<ItemAssignment>, AppError>;

    // --- Manutenção ---
    async fn create_maintenance_log(&mut self, log: NewMaintenanceLog) -> Result<MaintenanceLog, AppError>;
    async fn list_maintenance_logs(&mut self, item_id: Option<Uuid>) -> Result<Vec<MaintenanceLog>, AppError>;
    async fn touch_item_last_checked(&mut self, item_id: Uuid, date: NaiveDate) -> Result<(), AppError>;

    // --- Atividades ---
    async fn create_activity(&mut self, activity: ActivityRecord) -> Result<Activity, AppError>;
    /// Ordenado por timestamp decrescente.
    async fn list_activities(&mut self, limit: usize) -> Result<Vec<Activity>, AppError>;

    async fn commit(self: Box<Self>) -> Result<(), AppError>;
}
