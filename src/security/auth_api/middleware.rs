use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use super::{
    error::AuthError,
    types::{AuthenticatedUser, Role},
};
use crate::core::shared::state::AppState;

/// Validates the bearer access token on every protected path and stores the
/// resulting [`AuthenticatedUser`] in the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let path = request.uri().path().to_string();

    if !state.auth_config.requires_auth(request.method(), &path) {
        return Ok(next.run(request).await);
    }

    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| state.auth_config.bearer_token(v))
        .ok_or(AuthError::MissingToken)?;

    let claims = state.jwt.validate_access_token(token).await?;
    let user = claims.to_authenticated_user()?;

    debug!(
        "Authenticated user={} role={} for {} {}",
        user.username,
        user.role,
        request.method(),
        path
    );

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

pub fn require_role(user: &AuthenticatedUser, role: Role) -> Result<(), AuthError> {
    if user.has_role(role) {
        Ok(())
    } else {
        Err(AuthError::InsufficientPermissions)
    }
}

pub fn require_any_role(user: &AuthenticatedUser, roles: &[Role]) -> Result<(), AuthError> {
    if user.has_any_role(roles) {
        Ok(())
    } else {
        Err(AuthError::InsufficientPermissions)
    }
}

pub fn require_admin(user: &AuthenticatedUser) -> Result<(), AuthError> {
    require_role(user, Role::Admin)
}
