use std::collections::HashMap;

use tracing::warn;

pub const DEV_JWT_SECRET: &str = "dev-secret-key-change-in-production-minimum-32-chars";
pub const MIN_JWT_SECRET_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
    #[error("JWT_SECRET must be at least 32 characters")]
    WeakSecret,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtSettings,
    pub ai: AiConfig,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

#[derive(Clone, Debug)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_expiry_minutes: i64,
    pub refresh_token_expiry_days: i64,
}

#[derive(Clone, Debug)]
pub struct AiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_map(values: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| values.get(key).cloned())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get_str = |key: &str, default: &str| -> String {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let server = ServerConfig {
            host: get_str("SERVER_HOST", "0.0.0.0"),
            port: parse_or(&lookup, "SERVER_PORT", 8080)?,
        };

        let database = DatabaseConfig {
            url: get_str(
                "DATABASE_URL",
                "postgres://skillforge:@localhost:5432/skillforge",
            ),
            pool_size: parse_or(&lookup, "DATABASE_POOL_SIZE", 10)?,
        };

        let secret = match lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) if secret.len() < MIN_JWT_SECRET_LEN => return Err(ConfigError::WeakSecret),
            Some(secret) => secret,
            None => {
                warn!("JWT_SECRET not set, using default development secret - DO NOT USE IN PRODUCTION");
                DEV_JWT_SECRET.to_string()
            }
        };

        let jwt = JwtSettings {
            secret,
            access_token_expiry_minutes: parse_or(&lookup, "JWT_ACCESS_EXPIRY_MINUTES", 60)?,
            refresh_token_expiry_days: parse_or(&lookup, "JWT_REFRESH_EXPIRY_DAYS", 7)?,
        };

        let ai = AiConfig {
            api_key: get_str("GOOGLE_API_KEY", ""),
            base_url: get_str(
                "GOOGLE_AI_BASE_URL",
                "https://generativelanguage.googleapis.com/v1beta",
            )
            .trim_end_matches('/')
            .to_string(),
            model: get_str("GOOGLE_AI_MODEL", "gemini-1.5-flash"),
        };

        let cors_allowed_origins = get_str("CORS_ALLOWED_ORIGINS", "*")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            server,
            database,
            jwt,
            ai,
            cors_allowed_origins,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_map(&HashMap::new()).expect("defaults");

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.pool_size, 10);
        assert_eq!(config.jwt.secret, DEV_JWT_SECRET);
        assert_eq!(config.jwt.access_token_expiry_minutes, 60);
        assert_eq!(config.ai.model, "gemini-1.5-flash");
        assert_eq!(config.cors_allowed_origins, vec!["*".to_string()]);
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_map(&map(&[
            ("SERVER_PORT", "9000"),
            ("JWT_SECRET", "a-perfectly-long-secret-for-signing-tokens"),
            ("GOOGLE_AI_BASE_URL", "http://localhost:1234/v1/"),
            ("CORS_ALLOWED_ORIGINS", "http://a.test, http://b.test"),
        ]))
        .expect("config");

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.ai.base_url, "http://localhost:1234/v1");
        assert_eq!(config.cors_allowed_origins.len(), 2);
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let err = AppConfig::from_map(&map(&[("SERVER_PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_short_secret_is_rejected() {
        let err = AppConfig::from_map(&map(&[("JWT_SECRET", "short")])).unwrap_err();
        assert!(matches!(err, ConfigError::WeakSecret));
    }
}
