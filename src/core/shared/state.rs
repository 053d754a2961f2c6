use std::sync::Arc;

use crate::core::config::AppConfig;
use crate::core::shared::utils::DbPool;
use crate::llm::GenerativeModel;
use crate::security::audit::ActivityLogger;
use crate::security::auth_api::AuthConfig;
use crate::security::jwt::JwtManager;
use crate::security::password::PasswordHasher;

pub struct AppState {
    pub conn: DbPool,
    pub config: AppConfig,
    pub auth_config: Arc<AuthConfig>,
    pub jwt: Arc<JwtManager>,
    pub hasher: Arc<PasswordHasher>,
    pub llm_provider: Arc<dyn GenerativeModel>,
    pub activity: ActivityLogger,
}

impl AppState {
    pub fn new(
        conn: DbPool,
        config: AppConfig,
        jwt: JwtManager,
        hasher: PasswordHasher,
        llm_provider: Arc<dyn GenerativeModel>,
    ) -> Self {
        Self {
            activity: ActivityLogger::new(conn.clone()),
            conn,
            config,
            auth_config: Arc::new(AuthConfig::default()),
            jwt: Arc::new(jwt),
            hasher: Arc::new(hasher),
            llm_provider,
        }
    }
}

impl Clone for AppState {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
            config: self.config.clone(),
            auth_config: Arc::clone(&self.auth_config),
            jwt: Arc::clone(&self.jwt),
            hasher: Arc::clone(&self.hasher),
            llm_provider: Arc::clone(&self.llm_provider),
            activity: self.activity.clone(),
        }
    }
}
