use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Deserialize;

use crate::core::error::ApiResult;
use crate::core::middleware::AppJson;
use crate::core::shared::state::AppState;
use crate::security::auth_api::AuthenticatedUser;
use crate::security::jwt::TokenPair;
use crate::security::password::{MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};
use crate::security::validation::Validator;

pub mod service;

pub use service::AuthService;

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> ApiResult<()> {
        Validator::new()
            .not_blank(&self.username, "username")
            .not_blank(&self.password, "password")
            .validate()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub full_name: String,
    pub roles: Option<Vec<String>>,
}

impl RegisterRequest {
    pub fn validate(&self) -> ApiResult<()> {
        Validator::new()
            .not_blank(&self.username, "username")
            .length(&self.username, "username", 3, 100)
            .not_blank(&self.email, "email")
            .email(&self.email, "email")
            .not_blank(&self.password, "password")
            .length(
                &self.password,
                "password",
                MIN_PASSWORD_LENGTH,
                MAX_PASSWORD_LENGTH,
            )
            .not_blank(&self.full_name, "fullName")
            .validate()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    pub refresh_token: Option<String>,
}

pub async fn handle_login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> ApiResult<Json<TokenPair>> {
    AuthService::new(&state).login(req).await.map(Json)
}

pub async fn handle_register(
    State(state): State<AppState>,
    AppJson(req): AppJson<RegisterRequest>,
) -> ApiResult<Json<TokenPair>> {
    AuthService::new(&state).register(req).await.map(Json)
}

pub async fn handle_refresh(
    State(state): State<AppState>,
    AppJson(req): AppJson<RefreshRequest>,
) -> ApiResult<Json<TokenPair>> {
    AuthService::new(&state).refresh(req).await.map(Json)
}

/// The body is optional; a missing or unreadable one only revokes the
/// access token.
pub async fn handle_logout(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    body: Option<Json<LogoutRequest>>,
) -> StatusCode {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    AuthService::new(&state)
        .logout(
            user.user_id,
            &user.token_id,
            user.expires_at,
            req.refresh_token.as_deref(),
        )
        .await;
    StatusCode::NO_CONTENT
}

pub fn configure() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(handle_login))
        .route("/api/auth/register", post(handle_register))
        .route("/api/auth/refresh", post(handle_refresh))
        .route("/api/auth/logout", post(handle_logout))
}
