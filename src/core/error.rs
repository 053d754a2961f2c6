//! Uniform error payloads for every HTTP handler.
//!
//! Handlers return [`ApiResult`]; the [`ApiError`] renders as a JSON body with
//! a timestamp, status, reason phrase, message and field-level details. The
//! request path is filled in afterwards by
//! [`crate::core::middleware::error_path_middleware`], which is the only layer
//! that still sees the request URI.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request")]
    Validation(Vec<String>),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Upstream service error: {0}")]
    Upstream(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Serialized error payload. Kept in the response extensions so the path can
/// be patched in by middleware.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub timestamp: DateTime<Utc>,
    pub status: u16,
    pub error: String,
    pub message: String,
    pub path: String,
    pub details: Vec<String>,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Self::Validation(_) => "Validation Error",
            Self::BadRequest(_) => "Bad Request",
            Self::Unauthorized(_) => "Unauthorized",
            Self::Forbidden(_) => "Forbidden",
            Self::NotFound(_) => "Not Found",
            Self::Conflict(_) => "Conflict",
            Self::Upstream(_) => "Bad Gateway",
            Self::Internal(_) => "Server Error",
        }
    }

    pub fn body(&self) -> ErrorBody {
        let (message, details) = match self {
            Self::Validation(details) => ("Invalid request".to_string(), details.clone()),
            Self::Upstream(_) => ("The AI service is currently unavailable".to_string(), Vec::new()),
            Self::Internal(_) => ("An internal error occurred".to_string(), Vec::new()),
            other => (other.to_string(), Vec::new()),
        };

        ErrorBody {
            timestamp: Utc::now(),
            status: self.status_code().as_u16(),
            error: self.reason().to_string(),
            message,
            path: String::new(),
            details,
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Internal(detail) => error!("Internal error: {detail}"),
            Self::Upstream(detail) => error!("Upstream failure: {detail}"),
            _ => {}
        }

        let status = self.status_code();
        let body = self.body();
        let mut response = (status, Json(body.clone())).into_response();
        response.extensions_mut().insert(body);
        response
    }
}

impl From<DieselError> for ApiError {
    fn from(e: DieselError) -> Self {
        match e {
            DieselError::NotFound => Self::NotFound("Resource not found".to_string()),
            // Constraint names stay in the log, not in the response.
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                warn!("Unique violation: {}", info.message());
                Self::Conflict("Duplicate value".to_string())
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                warn!("Foreign key violation: {}", info.message());
                Self::BadRequest("Referenced record does not exist".to_string())
            }
            DieselError::DatabaseError(DatabaseErrorKind::CheckViolation, info) => {
                warn!("Check violation: {}", info.message());
                Self::BadRequest("Constraint violated".to_string())
            }
            other => Self::Internal(format!("Database error: {other}")),
        }
    }
}

impl From<diesel::r2d2::PoolError> for ApiError {
    fn from(e: diesel::r2d2::PoolError) -> Self {
        Self::Internal(format!("Connection pool error: {e}"))
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Internal(format!("Blocking task failed: {e}"))
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::Validation(vec![]).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::bad_request("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Unauthorized("x".into()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::forbidden("x").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(ApiError::Upstream("x".into()).status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            ApiError::Internal("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_validation_body_carries_details() {
        let err = ApiError::Validation(vec!["username: must not be blank".to_string()]);
        let body = err.body();

        assert_eq!(body.status, 400);
        assert_eq!(body.error, "Validation Error");
        assert_eq!(body.message, "Invalid request");
        assert_eq!(body.details, vec!["username: must not be blank".to_string()]);
        assert!(body.path.is_empty());
    }

    #[test]
    fn test_internal_error_hides_detail() {
        let body = ApiError::Internal("relation \"users\" does not exist".into()).body();
        assert_eq!(body.error, "Server Error");
        assert!(!body.message.contains("relation"));
    }

    #[test]
    fn test_diesel_not_found_maps_to_404() {
        let err: ApiError = DieselError::NotFound.into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    struct PgInfo(&'static str);

    impl diesel::result::DatabaseErrorInformation for PgInfo {
        fn message(&self) -> &str {
            self.0
        }
        fn details(&self) -> Option<&str> {
            None
        }
        fn hint(&self) -> Option<&str> {
            None
        }
        fn table_name(&self) -> Option<&str> {
            Some("users")
        }
        fn column_name(&self) -> Option<&str> {
            None
        }
        fn constraint_name(&self) -> Option<&str> {
            Some("users_email_key")
        }
        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn db_error(kind: DatabaseErrorKind, message: &'static str) -> ApiError {
        DieselError::DatabaseError(kind, Box::new(PgInfo(message))).into()
    }

    #[test]
    fn test_unique_violation_hides_constraint_name() {
        let err = db_error(
            DatabaseErrorKind::UniqueViolation,
            "duplicate key value violates unique constraint \"users_email_key\"",
        );
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        let body = err.body();
        assert_eq!(body.message, "Duplicate value");
        assert!(!body.message.contains("users_email_key"));
    }

    #[test]
    fn test_constraint_errors_use_generic_messages() {
        let fk = db_error(
            DatabaseErrorKind::ForeignKeyViolation,
            "insert or update on table \"courses\" violates foreign key constraint \"courses_instructor_id_fkey\"",
        );
        assert_eq!(fk.body().message, "Referenced record does not exist");

        let check = db_error(
            DatabaseErrorKind::CheckViolation,
            "new row for relation \"enrollments\" violates check constraint \"ck_enrollments_progress\"",
        );
        assert_eq!(check.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(check.body().message, "Constraint violated");
    }

    #[test]
    fn test_response_keeps_body_in_extensions() {
        let response = ApiError::not_found("Course not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = response
            .extensions()
            .get::<ErrorBody>()
            .expect("error body extension");
        assert_eq!(body.message, "Course not found");
    }
}
