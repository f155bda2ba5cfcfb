// src/services/activity_service.rs

use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, Utc};

use crate::{
    common::{
        clock::Clock,
        error::{AppError, Entity},
    },
    db::{EntityStore, StoreTx},
    models::activity::{Activity, ActivityRecord, NewActivity},
};

pub const BUCKET_TODAY: &str = "idag";
pub const BUCKET_YESTERDAY: &str = "igår";

/// Rótulo de data exibido no feed: "idag", "igår" ou a data no formato sueco (YYYY-MM-DD).
/// Os dias de calendário são contados no fuso `offset`.
pub fn date_bucket(timestamp: DateTime<Utc>, now: DateTime<Utc>, offset: FixedOffset) -> String {
    let day = timestamp.with_timezone(&offset).date_naive();
    let today = now.with_timezone(&offset).date_naive();

    if day == today {
        BUCKET_TODAY.to_string()
    } else if today.checked_sub_signed(Duration::days(1)) == Some(day) {
        BUCKET_YESTERDAY.to_string()
    } else {
        day.format("%Y-%m-%d").to_string()
    }
}

#[derive(Clone)]
pub struct ActivityService {
    store: Arc<dyn EntityStore>,
    clock: Arc<dyn Clock>,
    offset: FixedOffset,
}

impl ActivityService {
    pub fn new(store: Arc<dyn EntityStore>, clock: Arc<dyn Clock>, offset: FixedOffset) -> Self {
        Self { store, clock, offset }
    }

    /// Grava a atividade dentro da transação de quem chamou.
    /// Os nomes de usuário/item são "congelados" agora e nunca re-resolvidos.
    pub async fn record(&self, tx: &mut dyn StoreTx, activity: NewActivity) -> Result<Activity, AppError> {
        // Referência inexistente = NotFound (nunca grava atividade "órfã")
        let user_name = match activity.user_id {
            Some(id) => Some(
                tx.get_profile(id)
                    .await?
                    .ok_or_else(|| AppError::not_found(Entity::Profile, id))?
                    .name,
            ),
            None => None,
        };
        let item_name = match activity.related_item_id {
            Some(id) => Some(
                tx.get_item(id)
                    .await?
                    .ok_or_else(|| AppError::not_found(Entity::Item, id))?
                    .name,
            ),
            None => None,
        };

        let now = self.clock.now();
        let record = ActivityRecord {
            title: activity.title,
            description: activity.description,
            user_id: activity.user_id,
            related_item_id: activity.related_item_id,
            priority: activity.priority.unwrap_or_default(),
            timestamp: now,
            user_name,
            item_name,
        };

        let mut created = tx.create_activity(record).await?;
        created.date = date_bucket(created.timestamp, now, self.offset);

        tracing::debug!(title = %created.title, priority = ?created.priority, "Atividade registrada");
        Ok(created)
    }

    /// Registro avulso (sem outra operação junto), na sua própria transação.
    pub async fn log(&self, activity: NewActivity) -> Result<Activity, AppError> {
        let mut tx = self.store.begin().await?;
        let created = self.record(&mut *tx, activity).await?;
        tx.commit().await?;
        Ok(created)
    }

    /// Mais recentes primeiro, estritamente pelo timestamp.
    pub async fn list(&self, limit: usize) -> Result<Vec<Activity>, AppError> {
        let mut tx = self.store.begin().await?;
        let mut activities = tx.list_activities(limit).await?;
        tx.commit().await?;

        let now = self.clock.now();
        for activity in &mut activities {
            activity.date = date_bucket(activity.timestamp, now, self.offset);
        }
        Ok(activities)
    }
}
