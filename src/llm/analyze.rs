use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::error::ApiResult;
use crate::core::middleware::AppJson;
use crate::core::shared::models::{AiRequest, NewAiRequest};
use crate::core::shared::schema::ai_requests;
use crate::core::shared::state::AppState;
use crate::core::shared::utils::with_conn;
use crate::security::audit::ActivityAction;
use crate::security::auth_api::AuthenticatedUser;
use crate::security::validation::Validator;

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiRequestResponse {
    pub id: i64,
    pub user_id: i64,
    pub input_text: String,
    pub ai_response: String,
    pub timestamp: DateTime<Utc>,
}

impl From<AiRequest> for AiRequestResponse {
    fn from(r: AiRequest) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            input_text: r.input_text,
            ai_response: r.ai_response,
            timestamp: r.timestamp,
        }
    }
}

pub async fn handle_analyze(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    AppJson(req): AppJson<AnalyzeRequest>,
) -> ApiResult<Json<AiRequestResponse>> {
    Validator::new().not_blank(&req.prompt, "prompt").validate()?;

    // Nothing is stored when the provider call fails.
    let answer = state.llm_provider.generate(&req.prompt).await?;

    let user_id = user.user_id;
    let prompt = req.prompt;
    let saved = with_conn(&state.conn, move |conn| {
        let row = diesel::insert_into(ai_requests::table)
            .values(&NewAiRequest {
                user_id,
                input_text: &prompt,
                ai_response: &answer,
                timestamp: Utc::now(),
            })
            .returning(AiRequest::as_returning())
            .get_result(conn)?;
        Ok(row)
    })
    .await?;

    info!("Stored AI request {} for user {}", saved.id, user.username);
    state.activity.log(user_id, ActivityAction::AiAnalyze).await;

    Ok(Json(saved.into()))
}

pub async fn handle_history(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<Vec<AiRequestResponse>>> {
    let user_id = user.user_id;
    let rows = with_conn(&state.conn, move |conn| {
        let rows = ai_requests::table
            .filter(ai_requests::user_id.eq(user_id))
            .order((ai_requests::timestamp.desc(), ai_requests::id.desc()))
            .select(AiRequest::as_select())
            .load(conn)?;
        Ok(rows)
    })
    .await?;

    Ok(Json(rows.into_iter().map(AiRequestResponse::from).collect()))
}

pub fn configure() -> Router<AppState> {
    Router::new()
        .route("/api/ai/analyze", post(handle_analyze))
        .route("/api/ai/history", get(handle_history))
}
