//! Activity log: one row per user-visible action, readable by administrators.

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::error::ApiResult;
use crate::core::middleware::AppQuery;
use crate::core::shared::models::{ActivityLog, NewActivityLog};
use crate::core::shared::schema::{activity_logs, users};
use crate::core::shared::state::AppState;
use crate::core::shared::utils::{with_conn, DbPool};
use crate::security::auth_api::{require_admin, AuthenticatedUser};

pub const DEFAULT_LOG_LIMIT: i64 = 100;
pub const MAX_LOG_LIMIT: i64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityAction {
    Login,
    Register,
    Logout,
    UpdateProfile,
    DeleteUser,
    SetRole,
    CreateCourse,
    UpdateCourse,
    DeleteCourse,
    Enroll,
    Unenroll,
    UpdateProgress,
    AiAnalyze,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "LOGIN",
            Self::Register => "REGISTER",
            Self::Logout => "LOGOUT",
            Self::UpdateProfile => "UPDATE_PROFILE",
            Self::DeleteUser => "DELETE_USER",
            Self::SetRole => "SET_ROLE",
            Self::CreateCourse => "CREATE_COURSE",
            Self::UpdateCourse => "UPDATE_COURSE",
            Self::DeleteCourse => "DELETE_COURSE",
            Self::Enroll => "ENROLL",
            Self::Unenroll => "UNENROLL",
            Self::UpdateProgress => "UPDATE_PROGRESS",
            Self::AiAnalyze => "AI_ANALYZE",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogResponse {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub action: String,
    pub timestamp: DateTime<Utc>,
}

impl ActivityLogResponse {
    fn from_row((log, username): (ActivityLog, String)) -> Self {
        Self {
            id: log.id,
            user_id: log.user_id,
            username,
            action: log.action,
            timestamp: log.timestamp,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogQuery {
    pub user_id: Option<i64>,
    pub limit: Option<i64>,
}

impl LogQuery {
    pub fn effective_limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LOG_LIMIT).clamp(1, MAX_LOG_LIMIT)
    }
}

#[derive(Clone)]
pub struct ActivityLogger {
    pool: DbPool,
}

impl ActivityLogger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Best effort: a failed insert is logged and never surfaces to the caller.
    pub async fn log(&self, user_id: i64, action: ActivityAction) {
        let result = with_conn(&self.pool, move |conn| {
            diesel::insert_into(activity_logs::table)
                .values(&NewActivityLog {
                    user_id,
                    action: action.as_str(),
                    timestamp: Utc::now(),
                })
                .execute(conn)?;
            Ok(())
        })
        .await;

        if let Err(e) = result {
            warn!("Failed to record {} for user {user_id}: {e}", action.as_str());
        }
    }

    pub async fn recent(&self, query: LogQuery) -> ApiResult<Vec<ActivityLogResponse>> {
        let limit = query.effective_limit();
        let user_filter = query.user_id;

        with_conn(&self.pool, move |conn| {
            let mut statement = activity_logs::table
                .inner_join(users::table)
                .select((ActivityLog::as_select(), users::username))
                .into_boxed();

            if let Some(user_id) = user_filter {
                statement = statement.filter(activity_logs::user_id.eq(user_id));
            }

            let rows: Vec<(ActivityLog, String)> = statement
                .order((activity_logs::timestamp.desc(), activity_logs::id.desc()))
                .limit(limit)
                .load(conn)?;

            Ok(rows.into_iter().map(ActivityLogResponse::from_row).collect())
        })
        .await
    }
}

pub async fn handle_list_logs(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    AppQuery(query): AppQuery<LogQuery>,
) -> ApiResult<Json<Vec<ActivityLogResponse>>> {
    require_admin(&user)?;
    Ok(Json(state.activity.recent(query).await?))
}

pub fn configure() -> Router<AppState> {
    Router::new().route("/api/logs", get(handle_list_logs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_names() {
        assert_eq!(ActivityAction::Login.as_str(), "LOGIN");
        assert_eq!(ActivityAction::UpdateProgress.as_str(), "UPDATE_PROGRESS");
        assert_eq!(ActivityAction::AiAnalyze.as_str(), "AI_ANALYZE");
        assert_eq!(
            serde_json::to_value(ActivityAction::DeleteCourse).expect("json"),
            "DELETE_COURSE"
        );
    }

    #[test]
    fn test_limit_defaults_and_bounds() {
        assert_eq!(LogQuery::default().effective_limit(), 100);
        assert_eq!(
            LogQuery { user_id: None, limit: Some(5000) }.effective_limit(),
            1000
        );
        assert_eq!(LogQuery { user_id: None, limit: Some(0) }.effective_limit(), 1);
        assert_eq!(LogQuery { user_id: Some(3), limit: Some(25) }.effective_limit(), 25);
    }
}
