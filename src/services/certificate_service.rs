// src/services/certificate_service.rs

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    common::{
        clock::Clock,
        error::{AppError, Entity},
    },
    db::EntityStore,
    models::{
        activity::{NewActivity, Priority},
        people::{Certificate, NewUserCertificate, UserCertificate},
    },
    services::activity_service::ActivityService,
};

pub const TITLE_CERTIFICATE_ADDED: &str = "Nytt certifikat tillagt";

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Dias até o vencimento: floor((expiry - now) / 1 dia), com o vencimento à meia-noite UTC.
/// Negativo = já vencido; nunca é "travado" em zero.
pub fn days_left(expiry_date: NaiveDate, now: DateTime<Utc>) -> i64 {
    let expiry = expiry_date.and_time(chrono::NaiveTime::MIN).and_utc();
    (expiry - now).num_milliseconds().div_euclid(MILLIS_PER_DAY)
}

// Preenche os campos derivados (dias restantes e nomes para exibição)
fn decorate(
    mut grant: UserCertificate,
    now: DateTime<Utc>,
    user_names: &HashMap<Uuid, String>,
    certificate_names: &HashMap<Uuid, String>,
) -> UserCertificate {
    let left = days_left(grant.expiry_date, now);
    grant.days_left = Some(left);
    grant.expired = left < 0;
    grant.user_name = user_names.get(&grant.user_id).cloned();
    grant.certificate_name = certificate_names.get(&grant.certificate_id).cloned();
    grant
}

#[derive(Clone)]
pub struct CertificateService {
    store: Arc<dyn EntityStore>,
    clock: Arc<dyn Clock>,
    activities: ActivityService,
}

impl CertificateService {
    pub fn new(store: Arc<dyn EntityStore>, clock: Arc<dyn Clock>, activities: ActivityService) -> Self {
        Self { store, clock, activities }
    }

    pub async fn list_certificates(&self) -> Result<Vec<Certificate>, AppError> {
        let mut tx = self.store.begin().await?;
        let certificates = tx.list_certificates().await?;
        tx.commit().await?;
        Ok(certificates)
    }

    pub async fn create_certificate(&self, name: &str, description: Option<&str>) -> Result<Certificate, AppError> {
        let mut tx = self.store.begin().await?;
        let certificate = tx.create_certificate(name, description).await?;
        tx.commit().await?;

        tracing::info!(certificate_id = %certificate.id, name = %certificate.name, "Certificado criado");
        Ok(certificate)
    }

    // --- CONCEDER CERTIFICADO ---
    pub async fn add_certificate_to_user(
        &self,
        user_id: Uuid,
        certificate_id: Uuid,
        expiry_date: NaiveDate,
    ) -> Result<UserCertificate, AppError> {
        let mut tx = self.store.begin().await?;

        // 1. Valida as referências
        let user = tx
            .get_profile(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Profile, user_id))?;
        let certificate = tx
            .get_certificate(certificate_id)
            .await?
            .ok_or_else(|| AppError::not_found(Entity::Certificate, certificate_id))?;

        // 2. Nunca sobrescreve uma concessão existente
        if tx.find_user_certificate(user_id, certificate_id).await?.is_some() {
            return Err(AppError::DuplicateGrant { user_id, certificate_id });
        }

        // 3. Grava (a UNIQUE do banco cobre a corrida entre o passo 2 e este)
        let grant = tx
            .create_user_certificate(NewUserCertificate { user_id, certificate_id, expiry_date })
            .await?;

        // 4. Histórico
        self.activities
            .record(
                &mut *tx,
                NewActivity {
                    title: TITLE_CERTIFICATE_ADDED.to_string(),
                    description: Some(format!(
                        "Certifikat {} har lagts till för {}",
                        certificate.name, user.name
                    )),
                    user_id: Some(user_id),
                    related_item_id: None,
                    priority: Some(Priority::High),
                },
            )
            .await?;

        tx.commit().await?;

        tracing::info!(%user_id, %certificate_id, %expiry_date, "Certificado concedido");

        let user_names = HashMap::from([(user.id, user.name)]);
        let certificate_names = HashMap::from([(certificate.id, certificate.name)]);
        Ok(decorate(grant, self.clock.now(), &user_names, &certificate_names))
    }

    /// Todas as concessões (ou só as de um usuário), com `days_left` recalculado agora,
    /// da mais urgente para a menos urgente.
    pub async fn list_user_certificates(&self, user_id: Option<Uuid>) -> Result<Vec<UserCertificate>, AppError> {
        let mut tx = self.store.begin().await?;
        let grants = tx.list_user_certificates(user_id).await?;
        let user_names: HashMap<Uuid, String> =
            tx.list_profiles().await?.into_iter().map(|p| (p.id, p.name)).collect();
        let certificate_names: HashMap<Uuid, String> =
            tx.list_certificates().await?.into_iter().map(|c| (c.id, c.name)).collect();
        tx.commit().await?;

        let now = self.clock.now();
        let mut grants: Vec<UserCertificate> = grants
            .into_iter()
            .map(|g| decorate(g, now, &user_names, &certificate_names))
            .collect();
        // sort_by_key é estável
        grants.sort_by_key(|g| g.days_left);
        Ok(grants)
    }
}
