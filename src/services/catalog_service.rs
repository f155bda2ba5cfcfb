// src/services/catalog_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::{AppError, Entity},
    db::EntityStore,
    models::{
        activity::{NewActivity, Priority},
        inventory::Category,
        people::{NewProfile, Profile, ProfilePatch, Role},
    },
    services::activity_service::ActivityService,
};

pub const TITLE_PROFILE_CREATED: &str = "Ny anställd registrerad";
pub const DEFAULT_CATEGORY_NAME: &str = "Ny kategori";

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn EntityStore>,
    activities: ActivityService,
}

impl CatalogService {
    pub fn new(store: Arc<dyn EntityStore>, activities: ActivityService) -> Self {
        Self { store, activities }
    }

    // --- Funcionários ---

    pub async fn list_profiles(&self) -> Result<Vec<Profile>, AppError> {
        let mut tx = self.store.begin().await?;
        let profiles = tx.list_profiles().await?;
        tx.commit().await?;
        Ok(profiles)
    }

    pub async fn get_profile(&self, id: Uuid) -> Result<Profile, AppError> {
        let mut tx = self.store.begin().await?;
        let profile = tx.get_profile(id).await?;
        tx.commit().await?;
        profile.ok_or_else(|| AppError::not_found(Entity::Profile, id))
    }

    pub async fn create_profile(&self, profile: NewProfile) -> Result<Profile, AppError> {
        let mut tx = self.store.begin().await?;
        let profile = tx.create_profile(profile).await?;

        let description = match &profile.department {
            Some(department) => format!("{} har lagts till i {}", profile.name, department),
            None => format!("{} har lagts till", profile.name),
        };
        self.activities
            .record(
                &mut *tx,
                NewActivity {
                    title: TITLE_PROFILE_CREATED.to_string(),
                    description: Some(description),
                    user_id: Some(profile.id),
                    related_item_id: None,
                    priority: Some(Priority::Low),
                },
            )
            .await?;

        tx.commit().await?;

        tracing::info!(profile_id = %profile.id, "Funcionário cadastrado");
        Ok(profile)
    }

    /// Garante que exista ao menos um administrador (store vazio na primeira subida).
    pub async fn ensure_admin(&self, name: &str) -> Result<Profile, AppError> {
        let mut tx = self.store.begin().await?;
        let existing = tx.list_profiles().await?.into_iter().find(Profile::is_admin);
        tx.commit().await?;

        if let Some(admin) = existing {
            return Ok(admin);
        }

        self.create_profile(NewProfile {
            name: name.to_string(),
            role: Role::Admin,
            ..Default::default()
        })
        .await
    }

    pub async fn update_profile(&self, id: Uuid, patch: ProfilePatch) -> Result<Profile, AppError> {
        let mut tx = self.store.begin().await?;
        let profile = tx
            .update_profile(id, patch)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Profile, id))?;
        tx.commit().await?;
        Ok(profile)
    }

    // --- Categorias ---

    pub async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        let mut tx = self.store.begin().await?;
        let categories = tx.list_categories().await?;
        tx.commit().await?;
        Ok(categories)
    }

    pub async fn create_category(&self, name: Option<&str>, description: Option<&str>) -> Result<Category, AppError> {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_CATEGORY_NAME);

        let mut tx = self.store.begin().await?;
        let category = tx.create_category(name, description).await?;
        tx.commit().await?;
        Ok(category)
    }
}
