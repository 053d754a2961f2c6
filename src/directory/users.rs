use axum::{extract::State, http::StatusCode, response::Json};
use diesel::Connection;
use serde::Deserialize;
use tracing::info;

use super::UserResponse;
use crate::core::error::{ApiError, ApiResult};
use crate::core::middleware::{AppJson, AppPath};
use crate::core::shared::state::AppState;
use crate::core::shared::utils::with_conn;
use crate::security::audit::ActivityAction;
use crate::security::auth_api::{require_admin, AuthenticatedUser, Role};
use crate::security::validation::Validator;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
}

impl UpdateProfileRequest {
    pub fn validate(&self) -> ApiResult<()> {
        Validator::new()
            .not_blank(&self.full_name, "fullName")
            .not_blank(&self.email, "email")
            .email(&self.email, "email")
            .validate()
    }
}

pub async fn list_users(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<Vec<UserResponse>>> {
    require_admin(&user)?;
    let rows = with_conn(&state.conn, |conn| Ok(super::list_users(conn, None)?)).await?;
    Ok(Json(rows.into_iter().map(UserResponse::from).collect()))
}

pub async fn list_users_by_role(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    AppPath(role): AppPath<String>,
) -> ApiResult<Json<Vec<UserResponse>>> {
    require_admin(&user)?;
    let role: Role = role.parse()?;
    let rows = with_conn(&state.conn, move |conn| Ok(super::list_users(conn, Some(role))?)).await?;
    Ok(Json(rows.into_iter().map(UserResponse::from).collect()))
}

pub async fn get_current_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<UserResponse>> {
    fetch_user(&state, user.user_id).await.map(Json)
}

pub async fn get_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    AppPath(user_id): AppPath<i64>,
) -> ApiResult<Json<UserResponse>> {
    require_admin(&user)?;
    fetch_user(&state, user_id).await.map(Json)
}

async fn fetch_user(state: &AppState, user_id: i64) -> ApiResult<UserResponse> {
    with_conn(&state.conn, move |conn| {
        super::find_user(conn, user_id)?
            .map(UserResponse::from)
            .ok_or_else(|| ApiError::not_found("User not found"))
    })
    .await
}

pub async fn update_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    AppPath(user_id): AppPath<i64>,
    AppJson(req): AppJson<UpdateProfileRequest>,
) -> ApiResult<Json<UserResponse>> {
    if !user.can_manage_user(user_id) {
        return Err(ApiError::forbidden("You can only update your own profile"));
    }
    req.validate()?;

    let updated = with_conn(&state.conn, move |conn| {
        conn.transaction(|conn| {
            if super::find_user(conn, user_id)?.is_none() {
                return Err(ApiError::not_found("User not found"));
            }
            if super::email_taken(conn, &req.email, Some(user_id))? {
                return Err(ApiError::bad_request("Email already in use"));
            }
            Ok(super::update_profile(
                conn,
                user_id,
                req.full_name.trim(),
                &req.email,
            )?)
        })
    })
    .await?;

    info!("User {} updated profile of user {}", user.username, user_id);
    state
        .activity
        .log(user.user_id, ActivityAction::UpdateProfile)
        .await;

    Ok(Json(updated.into()))
}

pub async fn delete_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    AppPath(user_id): AppPath<i64>,
) -> ApiResult<StatusCode> {
    require_admin(&user)?;

    let removed = with_conn(&state.conn, move |conn| Ok(super::delete_user(conn, user_id)?)).await?;
    if !removed {
        return Err(ApiError::not_found("User not found"));
    }

    info!("User {} deleted user {}", user.username, user_id);
    // Fails its foreign key when an admin deletes themselves; only warned.
    state.activity.log(user.user_id, ActivityAction::DeleteUser).await;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_roles(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    AppPath(user_id): AppPath<i64>,
    AppJson(requested): AppJson<Vec<String>>,
) -> ApiResult<Json<UserResponse>> {
    require_admin(&user)?;
    let role = Role::from_requested(&requested)?;

    let updated = with_conn(&state.conn, move |conn| {
        conn.transaction(|conn| {
            if super::find_user(conn, user_id)?.is_none() {
                return Err(ApiError::not_found("User not found"));
            }
            Ok(super::assign_role(conn, user_id, role)?)
        })
    })
    .await?;

    info!("User {} assigned {} to user {}", user.username, role, user_id);
    state.activity.log(user.user_id, ActivityAction::SetRole).await;

    Ok(Json(updated.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_profile_validation() {
        let ok = UpdateProfileRequest {
            full_name: "Jane Doe".into(),
            email: "jane@example.com".into(),
        };
        assert!(ok.validate().is_ok());

        let bad = UpdateProfileRequest {
            full_name: " ".into(),
            email: "not-an-email".into(),
        };
        match bad.validate().unwrap_err() {
            ApiError::Validation(details) => {
                assert!(details.contains(&"fullName: must not be blank".to_string()));
                assert!(details.contains(&"email: must be a well-formed email address".to_string()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
