use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, TokenData,
    Validation,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::config::{JwtSettings, MIN_JWT_SECRET_LEN};
use crate::security::auth_api::{AuthError, AuthenticatedUser, Role};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
    pub access_token_expiry_minutes: i64,
    pub refresh_token_expiry_days: i64,
    pub leeway_seconds: u64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            issuer: "skillforge".into(),
            audience: "skillforge-api".into(),
            access_token_expiry_minutes: 60,
            refresh_token_expiry_days: 7,
            leeway_seconds: 30,
        }
    }
}

impl JwtConfig {
    pub fn from_settings(settings: &JwtSettings) -> Self {
        Self {
            access_token_expiry_minutes: settings.access_token_expiry_minutes,
            refresh_token_expiry_days: settings.refresh_token_expiry_days,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub role: String,
    #[serde(rename = "type")]
    pub token_type: String,
    pub jti: String,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(
        user_id: i64,
        username: &str,
        role: Role,
        config: &JwtConfig,
        token_type: TokenType,
        expiry: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.to_string(),
            username: username.to_string(),
            role: role.stored_name().to_string(),
            token_type: token_type.as_str().to_string(),
            jti: Uuid::new_v4().to_string(),
            iss: config.issuer.clone(),
            aud: config.audience.clone(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expiry.timestamp(),
        }
    }

    pub fn user_id(&self) -> Result<i64, AuthError> {
        self.sub.parse().map_err(|_| AuthError::InvalidToken)
    }

    pub fn role(&self) -> Result<Role, AuthError> {
        Role::parse(&self.role).ok_or(AuthError::InvalidToken)
    }

    pub fn is_access_token(&self) -> bool {
        self.token_type == TokenType::Access.as_str()
    }

    pub fn is_refresh_token(&self) -> bool {
        self.token_type == TokenType::Refresh.as_str()
    }

    pub fn to_authenticated_user(&self) -> Result<AuthenticatedUser, AuthError> {
        Ok(
            AuthenticatedUser::new(self.user_id()?, self.username.clone(), self.role()?)
                .with_token(self.jti.clone(), self.exp),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

impl TokenPair {
    pub fn bearer(access_token: String, refresh_token: String) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "Bearer".into(),
        }
    }
}

/// HS256 token issuer and validator with an in-memory revocation list.
///
/// Revoked jtis are kept with their `exp` and forgotten once the token
/// could no longer validate anyway.
pub struct JwtManager {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    blacklist: Arc<RwLock<HashMap<String, i64>>>,
}

impl JwtManager {
    pub fn new(config: JwtConfig, secret: &str) -> Result<Self> {
        if secret.len() < MIN_JWT_SECRET_LEN {
            return Err(anyhow!(
                "JWT secret must be at least {MIN_JWT_SECRET_LEN} characters"
            ));
        }

        Ok(Self {
            config,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            blacklist: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    pub fn from_settings(settings: &JwtSettings) -> Result<Self> {
        Self::new(JwtConfig::from_settings(settings), &settings.secret)
    }

    pub fn config(&self) -> &JwtConfig {
        &self.config
    }

    pub fn encode_claims(&self, claims: &Claims) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| anyhow!("Failed to encode {} token: {e}", claims.token_type))
    }

    pub fn generate_access_token(&self, user_id: i64, username: &str, role: Role) -> Result<String> {
        let expiry = Utc::now() + Duration::minutes(self.config.access_token_expiry_minutes);
        let claims = Claims::new(user_id, username, role, &self.config, TokenType::Access, expiry);
        self.encode_claims(&claims)
    }

    pub fn generate_refresh_token(&self, user_id: i64, username: &str, role: Role) -> Result<String> {
        let expiry = Utc::now() + Duration::days(self.config.refresh_token_expiry_days);
        let claims = Claims::new(user_id, username, role, &self.config, TokenType::Refresh, expiry);
        self.encode_claims(&claims)
    }

    pub fn generate_token_pair(&self, user_id: i64, username: &str, role: Role) -> Result<TokenPair> {
        let access_token = self.generate_access_token(user_id, username, role)?;
        let refresh_token = self.generate_refresh_token(user_id, username, role)?;
        debug!("Issued token pair for user {user_id}");
        Ok(TokenPair::bearer(access_token, refresh_token))
    }

    /// Signature, issuer, audience and expiry; ignores token type and revocation.
    pub fn validate_token(&self, token: &str) -> Result<TokenData<Claims>, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);
        validation.leeway = self.config.leeway_seconds;
        validation.validate_nbf = true;

        decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
            _ => {
                debug!("Token validation failed: {e}");
                AuthError::InvalidToken
            }
        })
    }

    async fn validate_typed(&self, token: &str, expected: TokenType) -> Result<Claims, AuthError> {
        let claims = self.validate_token(token)?.claims;

        if claims.token_type != expected.as_str() {
            return Err(AuthError::WrongTokenType);
        }
        if self.is_revoked(&claims.jti).await {
            return Err(AuthError::RevokedToken);
        }

        Ok(claims)
    }

    pub async fn validate_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.validate_typed(token, TokenType::Access).await
    }

    pub async fn validate_refresh_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.validate_typed(token, TokenType::Refresh).await
    }

    /// `expires_at` is the token's `exp` in seconds since the epoch.
    pub async fn revoke_token(&self, jti: &str, expires_at: i64) {
        let now = Utc::now().timestamp();
        let leeway = self.leeway();
        let mut blacklist = self.blacklist.write().await;
        blacklist.retain(|_, exp| *exp + leeway >= now);
        blacklist.insert(jti.to_string(), expires_at);
        debug!("Revoked token {jti}");
    }

    pub async fn revoke_by_token(&self, token: &str) -> Result<(), AuthError> {
        let claims = self.validate_token(token)?.claims;
        self.revoke_token(&claims.jti, claims.exp).await;
        Ok(())
    }

    pub async fn is_revoked(&self, jti: &str) -> bool {
        let blacklist = self.blacklist.read().await;
        blacklist.contains_key(jti)
    }

    /// Drops revocations for tokens that expired before `now`, allowing for
    /// the validation leeway. Returns how many were removed.
    pub async fn cleanup_blacklist(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now.timestamp() - self.leeway();
        let mut blacklist = self.blacklist.write().await;
        let before = blacklist.len();
        blacklist.retain(|_, exp| *exp >= cutoff);
        let removed = before - blacklist.len();
        if removed > 0 {
            info!("Cleaned up {removed} entries from token blacklist");
        }
        removed
    }

    pub async fn revoked_count(&self) -> usize {
        self.blacklist.read().await.len()
    }

    fn leeway(&self) -> i64 {
        i64::try_from(self.config.leeway_seconds).unwrap_or(i64::MAX / 2)
    }
}

/// Strips the authorization scheme (`prefix`, e.g. `"Bearer "`), comparing it
/// case-insensitively.
pub fn extract_bearer_token<'a>(auth_header: &'a str, prefix: &str) -> Option<&'a str> {
    let scheme = auth_header.get(..prefix.len())?;
    if !scheme.eq_ignore_ascii_case(prefix) {
        return None;
    }
    Some(auth_header[prefix.len()..].trim()).filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_manager() -> JwtManager {
        let config = JwtConfig {
            leeway_seconds: 0,
            ..JwtConfig::default()
        };
        JwtManager::new(config, "this-is-a-very-long-secret-key-for-testing-purposes-only")
            .expect("Failed to create manager")
    }

    #[test]
    fn test_short_secret_rejected() {
        assert!(JwtManager::new(JwtConfig::default(), "short").is_err());
    }

    #[tokio::test]
    async fn test_access_token_round_trip() {
        let manager = create_test_manager();
        let pair = manager
            .generate_token_pair(42, "alice", Role::Instructor)
            .expect("Failed to generate");

        assert_eq!(pair.token_type, "Bearer");

        let claims = manager
            .validate_access_token(&pair.access_token)
            .await
            .expect("Validation failed");

        assert_eq!(claims.user_id().expect("user id"), 42);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, "ROLE_INSTRUCTOR");
        assert_eq!(claims.iss, "skillforge");
        assert!(claims.is_access_token());

        let user = claims.to_authenticated_user().expect("user");
        assert_eq!(user.role, Role::Instructor);
        assert_eq!(user.token_id, claims.jti);
    }

    #[tokio::test]
    async fn test_wrong_token_type() {
        let manager = create_test_manager();
        let pair = manager
            .generate_token_pair(1, "bob", Role::Student)
            .expect("Failed to generate");

        assert_eq!(
            manager.validate_refresh_token(&pair.access_token).await.unwrap_err(),
            AuthError::WrongTokenType
        );
        assert_eq!(
            manager.validate_access_token(&pair.refresh_token).await.unwrap_err(),
            AuthError::WrongTokenType
        );
        assert!(manager.validate_refresh_token(&pair.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_expired_token() {
        let manager = create_test_manager();
        let claims = Claims::new(
            1,
            "bob",
            Role::Student,
            manager.config(),
            TokenType::Access,
            Utc::now() - Duration::minutes(5),
        );
        let token = manager.encode_claims(&claims).expect("encode");

        assert_eq!(
            manager.validate_access_token(&token).await.unwrap_err(),
            AuthError::ExpiredToken
        );
    }

    #[tokio::test]
    async fn test_foreign_signature_rejected() {
        let manager = create_test_manager();
        let other = JwtManager::new(
            JwtConfig::default(),
            "another-very-long-secret-key-that-does-not-match",
        )
        .expect("manager");
        let token = other
            .generate_access_token(1, "mallory", Role::Admin)
            .expect("token");

        assert_eq!(
            manager.validate_access_token(&token).await.unwrap_err(),
            AuthError::InvalidToken
        );
        assert!(manager.validate_token("invalid.token.here").is_err());
    }

    #[tokio::test]
    async fn test_token_revocation() {
        let manager = create_test_manager();
        let token = manager
            .generate_access_token(7, "carol", Role::Admin)
            .expect("token");

        manager.revoke_by_token(&token).await.expect("revoke");

        assert_eq!(
            manager.validate_access_token(&token).await.unwrap_err(),
            AuthError::RevokedToken
        );
    }

    #[tokio::test]
    async fn test_expired_revocations_are_forgotten() {
        let manager = create_test_manager();
        let now = Utc::now();

        manager.revoke_token("live", (now + Duration::minutes(10)).timestamp()).await;
        manager.revoke_token("stale", (now - Duration::minutes(10)).timestamp()).await;
        assert_eq!(manager.revoked_count().await, 2);

        assert_eq!(manager.cleanup_blacklist(now).await, 1);
        assert!(!manager.is_revoked("stale").await);
        assert!(manager.is_revoked("live").await);
    }

    #[tokio::test]
    async fn test_revoking_prunes_expired_entries() {
        let manager = create_test_manager();
        let now = Utc::now();

        manager.revoke_token("old", (now - Duration::hours(1)).timestamp()).await;
        manager.revoke_token("fresh", (now + Duration::hours(1)).timestamp()).await;

        assert_eq!(manager.revoked_count().await, 1);
        assert!(manager.is_revoked("fresh").await);
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc123", "Bearer "), Some("abc123"));
        assert_eq!(extract_bearer_token("bearer abc123", "Bearer "), Some("abc123"));
        assert_eq!(extract_bearer_token("Bearer ", "Bearer "), None);
        assert_eq!(extract_bearer_token("Basic abc123", "Bearer "), None);
        assert_eq!(extract_bearer_token("Bear", "Bearer "), None);
        assert_eq!(extract_bearer_token("Token abc123", "Token "), Some("abc123"));
    }

    #[test]
    fn test_token_pair_serializes_camel_case() {
        let json = serde_json::to_value(TokenPair::bearer("a".into(), "r".into())).expect("json");
        assert_eq!(json["accessToken"], "a");
        assert_eq!(json["refreshToken"], "r");
        assert_eq!(json["tokenType"], "Bearer");
    }
}
