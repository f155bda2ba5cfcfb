//src/main.rs

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use asset_tracker::{
    config::{AppState, Settings},
    docs::ApiDoc,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let settings = Settings::from_env()?;
    let app_state = AppState::new(&settings).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    if let Some(db_pool) = &app_state.db_pool {
        sqlx::migrate!().run(db_pool).await?;
        tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");
    }

    let admin = app_state.catalog_service.ensure_admin(&settings.admin_name).await?;
    tracing::info!(admin_id = %admin.id, "Administrador disponível (use o id no cabeçalho X-User-Id)");

    let app = asset_tracker::app(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // Inicia o servidor
    let listener = TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
