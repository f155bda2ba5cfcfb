// src/db/pg_store.rs

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::{EntityStore, StoreTx},
    models::{
        activity::{Activity, ActivityRecord},
        inventory::{
            AssignmentFilter, Category, Item, ItemAssignment, ItemFilter, ItemPatch,
            MaintenanceLog, NewItem, NewMaintenanceLog, StatusChange, StatusGuard,
        },
        people::{
            Certificate, NewProfile, NewUserCertificate, Profile, ProfilePatch, UserCertificate,
        },
    },
};

// Colunas de `items` + o nome da categoria (JOIN). O alias da tabela é sempre `i`.
const ITEM_COLUMNS: &str = r#"
    i.id, i.name, i.description, i.category_id, i.serial_number, i.status,
    i.purchase_date, i.last_checked, i.item_type, i.assigned_to,
    i.created_at, i.updated_at, c.name AS category_name
"#;

const ACTIVITY_COLUMNS: &str = r#"
    id, title, description, user_id, related_item_id, priority,
    "timestamp", user_name, item_name
"#;

// Nome do índice único parcial que garante um só empréstimo aberto por item
const OPEN_ASSIGNMENT_INDEX: &str = "item_assignments_one_open_per_item";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntityStore for PgStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, AppError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }
}

pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

impl PgTx {
    // Reescreve o item inteiro (usado depois de aplicar um patch em memória)
    async fn write_item(&mut self, item: &Item) -> Result<Option<Item>, AppError> {
        let sql = format!(
            r#"
            WITH updated AS (
                UPDATE items SET
                    name = $2, description = $3, category_id = $4, serial_number = $5,
                    purchase_date = $6, last_checked = $7, item_type = $8, updated_at = now()
                WHERE id = $1
                RETURNING *
            )
            SELECT {ITEM_COLUMNS} FROM updated i LEFT JOIN categories c ON c.id = i.category_id
            "#
        );
        let item = sqlx::query_as::<_, Item>(&sql)
            .bind(item.id)
            .bind(&item.name)
            .bind(&item.description)
            .bind(item.category_id)
            .bind(&item.serial_number)
            .bind(item.purchase_date)
            .bind(item.last_checked)
            .bind(item.item_type)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(item)
    }
}

#[async_trait]
impl StoreTx for PgTx {
    // =========================================================================
    //  FUNCIONÁRIOS
    // =========================================================================

    async fn get_profile(&mut self, id: Uuid) -> Result<Option<Profile>, AppError> {
        let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(profile)
    }

    async fn list_profiles(&mut self) -> Result<Vec<Profile>, AppError> {
        let profiles = sqlx::query_as::<_, Profile>("SELECT * FROM profiles ORDER BY name ASC")
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(profiles)
    }

    async fn create_profile(&mut self, profile: NewProfile) -> Result<Profile, AppError> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (name, role, department, contact, hire_date, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&profile.name)
        .bind(profile.role)
        .bind(&profile.department)
        .bind(&profile.contact)
        .bind(profile.hire_date)
        .bind(profile.status)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(profile)
    }

    async fn update_profile(&mut self, id: Uuid, patch: ProfilePatch) -> Result<Option<Profile>, AppError> {
        let current = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        let Some(mut profile) = current else {
            return Ok(None);
        };
        patch.apply(&mut profile);

        let profile = sqlx::query_as::<_, Profile>(
            r#"
            UPDATE profiles SET
                name = $2, role = $3, department = $4, contact = $5, hire_date = $6, status = $7
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&profile.name)
        .bind(profile.role)
        .bind(&profile.department)
        .bind(&profile.contact)
        .bind(profile.hire_date)
        .bind(profile.status)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(profile)
    }

    // =========================================================================
    //  CERTIFICADOS
    // =========================================================================

    async fn get_certificate(&mut self, id: Uuid) -> Result<Option<Certificate>, AppError> {
        let certificate = sqlx::query_as::<_, Certificate>("SELECT * FROM certificates WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(certificate)
    }

    async fn list_certificates(&mut self) -> Result<Vec<Certificate>, AppError> {
        let certificates = sqlx::query_as::<_, Certificate>("SELECT * FROM certificates ORDER BY name ASC")
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(certificates)
    }

    async fn create_certificate(&mut self, name: &str, description: Option<&str>) -> Result<Certificate, AppError> {
        let certificate = sqlx::query_as::<_, Certificate>(
            "INSERT INTO certificates (name, description) VALUES ($1, $2) RETURNING *",
        )
        .bind(name)
        .bind(description)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(certificate)
    }

    async fn find_user_certificate(
        &mut self,
        user_id: Uuid,
        certificate_id: Uuid,
    ) -> Result<Option<UserCertificate>, AppError> {
        let grant = sqlx::query_as::<_, UserCertificate>(
            "SELECT * FROM user_certificates WHERE user_id = $1 AND certificate_id = $2",
        )
        .bind(user_id)
        .bind(certificate_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(grant)
    }

    async fn create_user_certificate(&mut self, grant: NewUserCertificate) -> Result<UserCertificate, AppError> {
        sqlx::query_as::<_, UserCertificate>(
            r#"
            INSERT INTO user_certificates (user_id, certificate_id, expiry_date)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(grant.user_id)
        .bind(grant.certificate_id)
        .bind(grant.expiry_date)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| {
            // Converte erro de violação de chave única em um erro mais amigável
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::DuplicateGrant {
                        user_id: grant.user_id,
                        certificate_id: grant.certificate_id,
                    };
                }
            }
            e.into()
        })
    }

    async fn list_user_certificates(&mut self, user_id: Option<Uuid>) -> Result<Vec<UserCertificate>, AppError> {
        let grants = sqlx::query_as::<_, UserCertificate>(
            r#"
            SELECT * FROM user_certificates
            WHERE ($1::uuid IS NULL OR user_id = $1)
            ORDER BY expiry_date ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(grants)
    }

    // =========================================================================
    //  CATEGORIAS
    // =========================================================================

    async fn get_category(&mut self, id: Uuid) -> Result<Option<Category>, AppError> {
        let category = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(category)
    }

    async fn list_categories(&mut self) -> Result<Vec<Category>, AppError> {
        let categories = sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name ASC")
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(categories)
    }

    async fn create_category(&mut self, name: &str, description: Option<&str>) -> Result<Category, AppError> {
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name, description) VALUES ($1, $2) RETURNING *",
        )
        .bind(name)
        .bind(description)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(category)
    }

    // =========================================================================
    //  ITENS
    // =========================================================================

    async fn get_item(&mut self, id: Uuid) -> Result<Option<Item>, AppError> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items i LEFT JOIN categories c ON c.id = i.category_id WHERE i.id = $1"
        );
        let item = sqlx::query_as::<_, Item>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(item)
    }

    async fn get_item_for_update(&mut self, id: Uuid) -> Result<Option<Item>, AppError> {
        // FOR UPDATE OF i: trava só a linha do item, não a categoria
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items i LEFT JOIN categories c ON c.id = i.category_id WHERE i.id = $1 FOR UPDATE OF i"
        );
        let item = sqlx::query_as::<_, Item>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(item)
    }

    async fn list_items(&mut self, filter: &ItemFilter) -> Result<Vec<Item>, AppError> {
        let sql = format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM items i
            LEFT JOIN categories c ON c.id = i.category_id
            WHERE ($1::uuid IS NULL OR i.category_id = $1)
              AND ($2::item_status IS NULL OR i.status = $2)
              AND ($3::item_type IS NULL OR i.item_type = $3)
            ORDER BY i.name ASC
            "#
        );
        let items = sqlx::query_as::<_, Item>(&sql)
            .bind(filter.category_id)
            .bind(filter.status)
            .bind(filter.item_type)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(items)
    }

    async fn create_item(&mut self, item: NewItem) -> Result<Item, AppError> {
        let sql = format!(
            r#"
            WITH inserted AS (
                INSERT INTO items (
                    name, description, category_id, serial_number,
                    purchase_date, last_checked, item_type
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
            )
            SELECT {ITEM_COLUMNS} FROM inserted i LEFT JOIN categories c ON c.id = i.category_id
            "#
        );
        let item = sqlx::query_as::<_, Item>(&sql)
            .bind(&item.name)
            .bind(&item.description)
            .bind(item.category_id)
            .bind(&item.serial_number)
            .bind(item.purchase_date)
            .bind(item.last_checked)
            .bind(item.item_type.unwrap_or_default())
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(item)
    }

    async fn update_item(&mut self, id: Uuid, patch: ItemPatch) -> Result<Option<Item>, AppError> {
        let Some(mut item) = self.get_item_for_update(id).await? else {
            return Ok(None);
        };
        patch.apply(&mut item);
        self.write_item(&item).await
    }

    async fn set_item_status(&mut self, id: Uuid, change: StatusChange) -> Result<Option<Item>, AppError> {
        let (must_be, must_not_be) = match change.guard {
            StatusGuard::Any => (None, None),
            StatusGuard::Is(status) => (Some(status), None),
            StatusGuard::IsNot(status) => (None, Some(status)),
        };

        // UPDATE condicional: se o guard não bate, nenhuma linha volta
        let sql = format!(
            r#"
            WITH updated AS (
                UPDATE items SET status = $2, assigned_to = $3, updated_at = now()
                WHERE id = $1
                  AND ($4::item_status IS NULL OR status = $4)
                  AND ($5::item_status IS NULL OR status <> $5)
                RETURNING *
            )
            SELECT {ITEM_COLUMNS} FROM updated i LEFT JOIN categories c ON c.id = i.category_id
            "#
        );
        let item = sqlx::query_as::<_, Item>(&sql)
            .bind(id)
            .bind(change.status)
            .bind(&change.assigned_to)
            .bind(must_be)
            .bind(must_not_be)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(item)
    }

    // =========================================================================
    //  EMPRÉSTIMOS
    // =========================================================================

    async fn create_assignment(
        &mut self,
        item_id: Uuid,
        user_id: Uuid,
        assigned_date: DateTime<Utc>,
    ) -> Result<ItemAssignment, AppError> {
        sqlx::query_as::<_, ItemAssignment>(
            r#"
            INSERT INTO item_assignments (item_id, user_id, assigned_date)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(item_id)
        .bind(user_id)
        .bind(assigned_date)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation()
                    && db_err.constraint() == Some(OPEN_ASSIGNMENT_INDEX)
                {
                    return AppError::AlreadyCheckedOut(item_id);
                }
            }
            e.into()
        })
    }

    async fn close_assignment(
        &mut self,
        assignment_id: Uuid,
        return_date: DateTime<Utc>,
    ) -> Result<Option<ItemAssignment>, AppError> {
        let assignment = sqlx::query_as::<_, ItemAssignment>(
            r#"
            UPDATE item_assignments SET return_date = $2
            WHERE id = $1 AND return_date IS NULL
            RETURNING *
            "#,
        )
        .bind(assignment_id)
        .bind(return_date)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(assignment)
    }

    async fn find_open_assignment(&mut self, item_id: Uuid) -> Result<Option<ItemAssignment>, AppError> {
        let assignment = sqlx::query_as::<_, ItemAssignment>(
            "SELECT * FROM item_assignments WHERE item_id = $1 AND return_date IS NULL FOR UPDATE",
        )
        .bind(item_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(assignment)
    }

    async fn list_assignments(&mut self, filter: AssignmentFilter) -> Result<Vec<ItemAssignment>, AppError> {
        let assignments = sqlx::query_as::<_, ItemAssignment>(
            r#"
            SELECT * FROM item_assignments
            WHERE ($1::uuid IS NULL OR item_id = $1)
              AND ($2::uuid IS NULL OR user_id = $2)
              AND ($3::boolean IS NULL OR (return_date IS NULL) = $3)
            ORDER BY assigned_date DESC
            "#,
        )
        .bind(filter.item_id)
        .bind(filter.user_id)
        .bind(filter.open)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(assignments)
    }

    // =========================================================================
    //  MANUTENÇÃO
    // =========================================================================

    async fn create_maintenance_log(&mut self, log: NewMaintenanceLog) -> Result<MaintenanceLog, AppError> {
        let log = sqlx::query_as::<_, MaintenanceLog>(
            r#"
            INSERT INTO maintenance_logs (
                item_id, user_id, maintenance_date, description, next_maintenance_date
            )
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(log.item_id)
        .bind(log.user_id)
        .bind(log.maintenance_date)
        .bind(&log.description)
        .bind(log.next_maintenance_date)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(log)
    }

    async fn list_maintenance_logs(&mut self, item_id: Option<Uuid>) -> Result<Vec<MaintenanceLog>, AppError> {
        let logs = sqlx::query_as::<_, MaintenanceLog>(
            r#"
            SELECT * FROM maintenance_logs
            WHERE ($1::uuid IS NULL OR item_id = $1)
            ORDER BY maintenance_date DESC, created_at DESC
            "#,
        )
        .bind(item_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(logs)
    }

    async fn touch_item_last_checked(&mut self, item_id: Uuid, date: NaiveDate) -> Result<(), AppError> {
        sqlx::query("UPDATE items SET last_checked = $2, updated_at = now() WHERE id = $1")
            .bind(item_id)
            .bind(date)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    // =========================================================================
    //  ATIVIDADES
    // =========================================================================

    async fn create_activity(&mut self, activity: ActivityRecord) -> Result<Activity, AppError> {
        let sql = format!(
            r#"
            INSERT INTO activities (
                title, description, user_id, related_item_id, priority,
                "timestamp", user_name, item_name
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ACTIVITY_COLUMNS}
            "#
        );
        let activity = sqlx::query_as::<_, Activity>(&sql)
            .bind(&activity.title)
            .bind(&activity.description)
            .bind(activity.user_id)
            .bind(activity.related_item_id)
            .bind(activity.priority)
            .bind(activity.timestamp)
            .bind(&activity.user_name)
            .bind(&activity.item_name)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(activity)
    }

    async fn list_activities(&mut self, limit: usize) -> Result<Vec<Activity>, AppError> {
        let sql = format!(
            r#"SELECT {ACTIVITY_COLUMNS} FROM activities ORDER BY "timestamp" DESC, seq ASC LIMIT $1"#
        );
        let activities = sqlx::query_as::<_, Activity>(&sql)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(activities)
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let PgTx { tx } = *self;
        tx.commit().await?;
        Ok(())
    }
}
