//! Health check

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::core::shared::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub database: bool,
}

impl HealthStatus {
    pub fn from_database(db_ok: bool) -> (StatusCode, Self) {
        let code = if db_ok {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        (
            code,
            Self {
                status: if db_ok { "healthy" } else { "degraded" },
                service: "skillforge",
                version: env!("CARGO_PKG_VERSION"),
                database: db_ok,
            },
        )
    }
}

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let pool = state.conn.clone();
    // r2d2 blocks for up to its connection timeout
    let db_ok = tokio::task::spawn_blocking(move || pool.get().is_ok())
        .await
        .unwrap_or(false);

    let (code, body) = HealthStatus::from_database(db_ok);
    (code, Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_codes() {
        let (code, body) = HealthStatus::from_database(true);
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body.status, "healthy");

        let (code, body) = HealthStatus::from_database(false);
        assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.status, "degraded");
        assert!(!body.database);
    }
}
