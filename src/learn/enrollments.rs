use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use tracing::info;

use super::{EnrollRequest, EnrollmentResponse, LearnEngine, ProgressRequest};
use crate::core::error::ApiResult;
use crate::core::middleware::{AppJson, AppPath};
use crate::core::shared::state::AppState;
use crate::security::audit::ActivityAction;
use crate::security::auth_api::{require_role, AuthenticatedUser, Role};

pub async fn enroll(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    AppJson(req): AppJson<EnrollRequest>,
) -> ApiResult<Json<EnrollmentResponse>> {
    require_role(&user, Role::Student)?;

    let engine = LearnEngine::new(state.conn.clone());
    let (enrollment, created) = engine.enroll(user.user_id, req.course_id).await?;

    if created {
        info!("User {} enrolled in course {}", user.username, req.course_id);
        state.activity.log(user.user_id, ActivityAction::Enroll).await;
    }

    Ok(Json(enrollment))
}

pub async fn list_enrollments(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<Vec<EnrollmentResponse>>> {
    require_role(&user, Role::Student)?;

    let engine = LearnEngine::new(state.conn.clone());
    Ok(Json(engine.list_enrollments(user.user_id).await?))
}

pub async fn update_progress(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    AppJson(req): AppJson<ProgressRequest>,
) -> ApiResult<Json<EnrollmentResponse>> {
    require_role(&user, Role::Student)?;
    req.validate()?;

    let engine = LearnEngine::new(state.conn.clone());
    let enrollment = engine.update_progress(user.user_id, req).await?;

    state
        .activity
        .log(user.user_id, ActivityAction::UpdateProgress)
        .await;

    Ok(Json(enrollment))
}

pub async fn unenroll(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    AppPath(course_id): AppPath<i64>,
) -> ApiResult<StatusCode> {
    require_role(&user, Role::Student)?;

    let engine = LearnEngine::new(state.conn.clone());
    engine.unenroll(user.user_id, course_id).await?;

    info!("User {} left course {}", user.username, course_id);
    state.activity.log(user.user_id, ActivityAction::Unenroll).await;

    Ok(StatusCode::NO_CONTENT)
}

pub fn configure() -> Router<AppState> {
    Router::new()
        .route(
            "/api/enrollments",
            get(list_enrollments).post(enroll).put(update_progress),
        )
        .route("/api/enrollments/:course_id", delete(unenroll))
}
