// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use chrono::FixedOffset;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::clock::{Clock, SystemClock},
    db::{EntityStore, MemoryStore, PgStore},
    services::{ActivityService, CatalogService, CertificateService, LifecycleService, QueryService},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    // Store descartável em memória (demos locais)
    Memory,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub store: StoreKind,
    pub database_url: Option<String>,
    pub bind_addr: String,
    pub max_connections: u32,
    // Fuso usado para "idag"/"igår" no feed (padrão: horário padrão sueco, UTC+1)
    pub activity_utc_offset_minutes: i32,
    // Administrador criado na subida se ainda não houver nenhum
    pub admin_name: String,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let store = match env::var("STORE").as_deref() {
            Ok("memory") => StoreKind::Memory,
            Ok("postgres") | Err(_) => StoreKind::Postgres,
            Ok(other) => anyhow::bail!("STORE inválido: '{other}' (use 'postgres' ou 'memory')"),
        };

        let database_url = env::var("DATABASE_URL").ok();
        if store == StoreKind::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL deve ser definida");
        }

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let max_connections = match env::var("DB_MAX_CONNECTIONS") {
            Ok(v) => v.parse().context("DB_MAX_CONNECTIONS deve ser um número")?,
            Err(_) => 5,
        };

        let activity_utc_offset_minutes = match env::var("ACTIVITY_UTC_OFFSET_MINUTES") {
            Ok(v) => v.parse().context("ACTIVITY_UTC_OFFSET_MINUTES deve ser um número")?,
            Err(_) => 60,
        };

        let admin_name = env::var("ADMIN_NAME").unwrap_or_else(|_| "Administratör".to_string());

        Ok(Self {
            store,
            database_url,
            bind_addr,
            max_connections,
            activity_utc_offset_minutes,
            admin_name,
        })
    }

    pub fn activity_offset(&self) -> anyhow::Result<FixedOffset> {
        FixedOffset::east_opt(self.activity_utc_offset_minutes * 60)
            .context("ACTIVITY_UTC_OFFSET_MINUTES fora do intervalo")
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: Option<PgPool>,
    pub activity_service: ActivityService,
    pub catalog_service: CatalogService,
    pub certificate_service: CertificateService,
    pub lifecycle_service: LifecycleService,
    pub query_service: QueryService,
}

impl AppState {
    pub async fn new(settings: &Settings) -> anyhow::Result<Self> {
        let offset = settings.activity_offset()?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        match (settings.store, &settings.database_url) {
            (StoreKind::Postgres, Some(database_url)) => {
                // Conecta ao banco de dados, usando '?' para propagar erros
                let db_pool = PgPoolOptions::new()
                    .max_connections(settings.max_connections)
                    .acquire_timeout(Duration::from_secs(3))
                    .connect(database_url)
                    .await?;

                tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

                let store: Arc<dyn EntityStore> = Arc::new(PgStore::new(db_pool.clone()));
                let mut state = Self::with_store(store, clock, offset);
                state.db_pool = Some(db_pool);
                Ok(state)
            }
            (StoreKind::Postgres, None) => anyhow::bail!("DATABASE_URL deve ser definida"),
            (StoreKind::Memory, _) => {
                tracing::warn!("Usando store em memória: nada será persistido");
                Ok(Self::with_store(Arc::new(MemoryStore::new()), clock, offset))
            }
        }
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_store(store: Arc<dyn EntityStore>, clock: Arc<dyn Clock>, offset: FixedOffset) -> Self {
        let activity_service = ActivityService::new(store.clone(), clock.clone(), offset);
        let catalog_service = CatalogService::new(store.clone(), activity_service.clone());
        let certificate_service =
            CertificateService::new(store.clone(), clock.clone(), activity_service.clone());
        let lifecycle_service = LifecycleService::new(store.clone(), clock, activity_service.clone());
        let query_service = QueryService::new(store, certificate_service.clone());

        Self {
            db_pool: None,
            activity_service,
            catalog_service,
            certificate_service,
            lifecycle_service,
            query_service,
        }
    }
}
