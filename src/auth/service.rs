use std::sync::Arc;

use diesel::Connection;
use tracing::{info, warn};

use super::{LoginRequest, RefreshRequest, RegisterRequest};
use crate::core::error::{ApiError, ApiResult};
use crate::core::shared::state::AppState;
use crate::core::shared::utils::with_conn;
use crate::directory::{self, role_of, NewAccount, UserWithRole};
use crate::security::audit::ActivityAction;
use crate::security::auth_api::Role;
use crate::security::jwt::TokenPair;
use crate::security::password::PasswordHasher;

const INVALID_CREDENTIALS: &str = "Invalid username or password";
const INVALID_TOKEN: &str = "Invalid token";

/// Credential checks and token issuance for the `/api/auth` endpoints.
pub struct AuthService<'a> {
    state: &'a AppState,
}

impl<'a> AuthService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    pub async fn login(&self, req: LoginRequest) -> ApiResult<TokenPair> {
        req.validate()?;

        let username = req.username.clone();
        let found = with_conn(&self.state.conn, move |conn| {
            Ok(directory::find_user_by_username(conn, &username)?)
        })
        .await?;

        let Some((user, role)) = found else {
            info!("Login rejected for unknown user");
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };

        let hasher = Arc::clone(&self.state.hasher);
        let stored_hash = user.password_hash.clone();
        let password = req.password;
        let matches = verify_password(hasher, password, stored_hash).await?;
        if !matches {
            info!("Login rejected for user {}", user.id);
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let pair = self
            .state
            .jwt
            .generate_token_pair(user.id, &user.username, role_of(&role))?;

        info!("User {} logged in", user.id);
        self.state.activity.log(user.id, ActivityAction::Login).await;
        Ok(pair)
    }

    pub async fn register(&self, req: RegisterRequest) -> ApiResult<TokenPair> {
        req.validate()?;
        let role = Role::from_requested(req.roles.as_deref().unwrap_or_default())?;

        let password_hash =
            hash_password(Arc::clone(&self.state.hasher), req.password.clone()).await?;

        let (user, role_record): UserWithRole = with_conn(&self.state.conn, move |conn| {
            conn.transaction(|conn| {
                if directory::username_exists(conn, &req.username)? {
                    return Err(ApiError::bad_request("Username already exists"));
                }
                if directory::email_taken(conn, &req.email, None)? {
                    return Err(ApiError::bad_request("Email already exists"));
                }
                Ok(directory::insert_user(
                    conn,
                    NewAccount {
                        username: &req.username,
                        email: &req.email,
                        password_hash: &password_hash,
                        full_name: Some(req.full_name.trim()),
                        role,
                    },
                )?)
            })
        })
        .await?;

        let pair = self
            .state
            .jwt
            .generate_token_pair(user.id, &user.username, role_of(&role_record))?;

        info!("Registered user {} as {}", user.id, role_record.name);
        self.state.activity.log(user.id, ActivityAction::Register).await;
        Ok(pair)
    }

    /// New access token for the user's current role; the refresh token is
    /// returned unchanged.
    pub async fn refresh(&self, req: RefreshRequest) -> ApiResult<TokenPair> {
        let claims = self
            .state
            .jwt
            .validate_refresh_token(req.refresh_token.trim())
            .await
            .map_err(|e| {
                info!("Refresh rejected: {e}");
                ApiError::bad_request(INVALID_TOKEN)
            })?;
        let user_id = claims
            .user_id()
            .map_err(|_| ApiError::bad_request(INVALID_TOKEN))?;

        let found = with_conn(&self.state.conn, move |conn| {
            Ok(directory::find_user(conn, user_id)?)
        })
        .await?;
        let (user, role) = found.ok_or_else(|| ApiError::bad_request(INVALID_TOKEN))?;

        let access_token =
            self.state
                .jwt
                .generate_access_token(user.id, &user.username, role_of(&role))?;

        Ok(TokenPair::bearer(access_token, req.refresh_token))
    }

    pub async fn logout(
        &self,
        user_id: i64,
        access_jti: &str,
        access_expires_at: i64,
        refresh_token: Option<&str>,
    ) {
        self.state.jwt.revoke_token(access_jti, access_expires_at).await;

        if let Some(token) = refresh_token.filter(|t| !t.trim().is_empty()) {
            match self.state.jwt.validate_refresh_token(token.trim()).await {
                Ok(claims) if claims.user_id().ok() == Some(user_id) => {
                    self.state.jwt.revoke_token(&claims.jti, claims.exp).await;
                }
                Ok(_) => warn!("User {user_id} tried to revoke a refresh token of another user"),
                Err(e) => info!("Ignoring unusable refresh token on logout: {e}"),
            }
        }

        info!("User {user_id} logged out");
        self.state.activity.log(user_id, ActivityAction::Logout).await;
    }
}

async fn hash_password(hasher: Arc<PasswordHasher>, password: String) -> ApiResult<String> {
    let hash = tokio::task::spawn_blocking(move || hasher.hash(&password)).await??;
    Ok(hash)
}

async fn verify_password(
    hasher: Arc<PasswordHasher>,
    password: String,
    hash: String,
) -> ApiResult<bool> {
    let matches = tokio::task::spawn_blocking(move || hasher.verify(&password, &hash)).await??;
    Ok(matches)
}
