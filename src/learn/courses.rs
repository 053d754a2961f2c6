use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::info;

use super::{CourseQuery, CourseRequest, CourseResponse, LearnEngine, RosterEntry};
use crate::core::error::ApiResult;
use crate::core::middleware::{AppJson, AppPath, AppQuery};
use crate::core::shared::state::AppState;
use crate::security::audit::ActivityAction;
use crate::security::auth_api::{require_any_role, AuthenticatedUser, Role};

const COURSE_EDITORS: [Role; 2] = [Role::Instructor, Role::Admin];

pub async fn list_courses(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<CourseQuery>,
) -> ApiResult<Json<Vec<CourseResponse>>> {
    let engine = LearnEngine::new(state.conn.clone());
    let search = query.search_term().map(str::to_string);
    Ok(Json(engine.list_courses(search).await?))
}

pub async fn get_course(
    State(state): State<AppState>,
    AppPath(course_id): AppPath<i64>,
) -> ApiResult<Json<CourseResponse>> {
    let engine = LearnEngine::new(state.conn.clone());
    Ok(Json(engine.get_course(course_id).await?))
}

pub async fn list_instructor_courses(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    AppPath(instructor_id): AppPath<i64>,
) -> ApiResult<Json<Vec<CourseResponse>>> {
    let engine = LearnEngine::new(state.conn.clone());
    Ok(Json(engine.list_courses_by_instructor(instructor_id).await?))
}

pub async fn create_course(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    AppJson(req): AppJson<CourseRequest>,
) -> ApiResult<Json<CourseResponse>> {
    require_any_role(&user, &COURSE_EDITORS)?;
    req.validate()?;

    let engine = LearnEngine::new(state.conn.clone());
    let course = engine.create_course(req, user.user_id).await?;

    info!("User {} created course {}", user.username, course.id);
    state.activity.log(user.user_id, ActivityAction::CreateCourse).await;

    Ok(Json(course))
}

pub async fn update_course(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    AppPath(course_id): AppPath<i64>,
    AppJson(req): AppJson<CourseRequest>,
) -> ApiResult<Json<CourseResponse>> {
    require_any_role(&user, &COURSE_EDITORS)?;
    req.validate()?;

    let engine = LearnEngine::new(state.conn.clone());
    engine.owned_course(&user, course_id).await?;
    let course = engine.update_course(course_id, req).await?;

    info!("User {} updated course {}", user.username, course_id);
    state.activity.log(user.user_id, ActivityAction::UpdateCourse).await;

    Ok(Json(course))
}

pub async fn delete_course(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    AppPath(course_id): AppPath<i64>,
) -> ApiResult<StatusCode> {
    require_any_role(&user, &COURSE_EDITORS)?;

    let engine = LearnEngine::new(state.conn.clone());
    engine.owned_course(&user, course_id).await?;
    engine.delete_course(course_id).await?;

    info!("User {} deleted course {}", user.username, course_id);
    state.activity.log(user.user_id, ActivityAction::DeleteCourse).await;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_course_students(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    AppPath(course_id): AppPath<i64>,
) -> ApiResult<Json<Vec<RosterEntry>>> {
    require_any_role(&user, &COURSE_EDITORS)?;

    let engine = LearnEngine::new(state.conn.clone());
    engine.owned_course(&user, course_id).await?;
    Ok(Json(engine.roster(course_id).await?))
}

pub fn configure() -> Router<AppState> {
    Router::new()
        .route("/api/courses", get(list_courses).post(create_course))
        .route(
            "/api/courses/:id",
            get(get_course).put(update_course).delete(delete_course),
        )
        .route("/api/courses/:id/students", get(list_course_students))
        .route(
            "/api/courses/instructor/:instructor_id",
            get(list_instructor_courses),
        )
}
