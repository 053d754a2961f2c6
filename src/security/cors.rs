use axum::http::{header, HeaderName, HeaderValue, Method};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<Method>,
    pub allowed_headers: Vec<HeaderName>,
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: vec![
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ],
            allowed_headers: vec![header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT],
            max_age_secs: 3600,
        }
    }
}

impl CorsConfig {
    pub fn with_origins(origins: &[String]) -> Self {
        Self {
            allowed_origins: origins.to_vec(),
            ..Self::default()
        }
    }

    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.is_empty() || self.allowed_origins.iter().any(|o| o == "*")
    }

    /// Credentials are only allowed with an explicit origin list; browsers
    /// reject them alongside a wildcard.
    pub fn build(self) -> CorsLayer {
        let cors = CorsLayer::new()
            .allow_methods(self.allowed_methods.clone())
            .allow_headers(self.allowed_headers.clone())
            .max_age(Duration::from_secs(self.max_age_secs));

        if self.allows_any_origin() {
            return cors.allow_origin(Any);
        }

        let origins: Vec<HeaderValue> = self
            .allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin: {}", origin);
                    None
                }
            })
            .collect();

        if origins.is_empty() {
            return cors.allow_origin(Any);
        }
        cors.allow_origin(AllowOrigin::list(origins))
            .allow_credentials(true)
    }
}

pub fn create_cors_layer(origins: &[String]) -> CorsLayer {
    let config = CorsConfig::with_origins(origins);
    if config.allows_any_origin() {
        info!("Creating CORS layer allowing any origin");
    } else {
        info!("Creating CORS layer with {} configured origins", origins.len());
    }
    config.build()
}
