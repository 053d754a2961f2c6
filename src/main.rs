use std::sync::Arc;

use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use skillforge::core::config::AppConfig;
use skillforge::core::shared::state::AppState;
use skillforge::core::shared::utils::{create_conn, run_migrations};
use skillforge::llm::{GeminiClient, GenerativeModel};
use skillforge::main_module::run_server;
use skillforge::security::jwt::JwtManager;
use skillforge::security::password::PasswordHasher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("skillforge=info,tower_http=info")),
        )
        .init();

    info!("Starting SkillForge {}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::from_env()?;

    let pool = create_conn(&config.database).map_err(|e| {
        error!("Failed to create database pool: {}", e);
        e
    })?;

    run_migrations(&pool).map_err(|e| anyhow::anyhow!("Failed to run migrations: {e}"))?;
    info!("Database migrations applied");

    let jwt = JwtManager::from_settings(&config.jwt)?;
    let hasher = PasswordHasher::with_defaults()?;

    if config.ai.api_key.is_empty() {
        tracing::warn!("GOOGLE_API_KEY not set, AI analysis requests will fail upstream");
    }
    let llm: Arc<dyn GenerativeModel> = Arc::new(GeminiClient::from_config(&config.ai));

    let state = AppState::new(pool, config, jwt, hasher, llm);

    run_server(state).await?;
    info!("Server stopped");
    Ok(())
}
