use bigdecimal::{BigDecimal, RoundingMode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::ApiResult;
use crate::core::shared::models::{Course, Enrollment};
use crate::security::validation::Validator;

pub const MAX_DESCRIPTION_LENGTH: usize = 2000;

// ============================================================================
// Courses
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CourseRequest {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
}

impl CourseRequest {
    pub fn validate(&self) -> ApiResult<()> {
        let mut validator = Validator::new().not_blank(&self.title, "title");
        if let Some(description) = &self.description {
            validator = validator.length(description, "description", 0, MAX_DESCRIPTION_LENGTH);
        }
        validator.validate()
    }

    pub fn trimmed_title(&self) -> &str {
        self.title.trim()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseQuery {
    pub q: Option<String>,
}

impl CourseQuery {
    pub fn search_term(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseResponse {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub instructor_id: i64,
    pub instructor_name: String,
    pub created_at: DateTime<Utc>,
}

/// Course row joined with its instructor's username and full name.
pub type CourseRow = (Course, String, Option<String>);

impl From<CourseRow> for CourseResponse {
    fn from((course, username, full_name): CourseRow) -> Self {
        Self {
            id: course.id,
            title: course.title,
            description: course.description,
            instructor_id: course.instructor_id,
            instructor_name: display_name(username, full_name),
            created_at: course.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub enrollment_id: i64,
    pub student_id: i64,
    pub username: String,
    pub full_name: Option<String>,
    pub progress: String,
    pub enrolled_at: DateTime<Utc>,
}

pub fn display_name(username: String, full_name: Option<String>) -> String {
    full_name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(username)
}

// ============================================================================
// Enrollments
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollRequest {
    pub course_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRequest {
    pub course_id: i64,
    pub progress: BigDecimal,
}

impl ProgressRequest {
    pub fn validate(&self) -> ApiResult<()> {
        Validator::new()
            .range(
                &self.progress,
                "progress",
                &BigDecimal::from(0),
                &BigDecimal::from(100),
            )
            .validate()
    }

    pub fn normalized_progress(&self) -> BigDecimal {
        normalize_progress(&self.progress)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentResponse {
    pub id: i64,
    pub student_id: i64,
    pub course_id: i64,
    pub course_title: String,
    pub progress: String,
    pub enrolled_at: DateTime<Utc>,
}

impl From<(Enrollment, String)> for EnrollmentResponse {
    fn from((enrollment, course_title): (Enrollment, String)) -> Self {
        Self {
            id: enrollment.id,
            student_id: enrollment.student_id,
            course_id: enrollment.course_id,
            course_title,
            progress: format_progress(&enrollment.progress),
            enrolled_at: enrollment.enrolled_at,
        }
    }
}

/// Two fractional digits, half-up, matching the NUMERIC(5,2) column.
pub fn normalize_progress(progress: &BigDecimal) -> BigDecimal {
    progress.with_scale_round(2, RoundingMode::HalfUp)
}

pub fn format_progress(progress: &BigDecimal) -> String {
    normalize_progress(progress).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ApiError;
    use std::str::FromStr;

    fn progress(value: &str) -> ProgressRequest {
        ProgressRequest {
            course_id: 1,
            progress: BigDecimal::from_str(value).expect("decimal"),
        }
    }

    #[test]
    fn test_progress_bounds() {
        assert!(progress("0").validate().is_ok());
        assert!(progress("100").validate().is_ok());
        assert!(progress("42.5").validate().is_ok());

        match progress("100.01").validate().unwrap_err() {
            ApiError::Validation(details) => {
                assert_eq!(details, vec!["progress: must be between 0 and 100".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(progress("-1").validate().is_err());
    }

    #[test]
    fn test_progress_formatting() {
        assert_eq!(format_progress(&BigDecimal::from(50)), "50.00");
        assert_eq!(format_progress(&BigDecimal::from_str("33.335").expect("decimal")), "33.34");
        assert_eq!(progress("12.3").normalized_progress().to_string(), "12.30");
    }

    #[test]
    fn test_progress_request_accepts_number_or_string() {
        let from_number: ProgressRequest =
            serde_json::from_str(r#"{"courseId":3,"progress":75}"#).expect("number");
        let from_string: ProgressRequest =
            serde_json::from_str(r#"{"courseId":3,"progress":"75.5"}"#).expect("string");

        assert_eq!(from_number.normalized_progress().to_string(), "75.00");
        assert_eq!(from_string.normalized_progress().to_string(), "75.50");
    }

    #[test]
    fn test_course_request_validation() {
        let ok = CourseRequest {
            title: "Rust 101".into(),
            description: None,
        };
        assert!(ok.validate().is_ok());

        let blank = CourseRequest {
            title: "   ".into(),
            description: Some("x".repeat(MAX_DESCRIPTION_LENGTH + 1)),
        };
        match blank.validate().unwrap_err() {
            ApiError::Validation(details) => assert_eq!(details.len(), 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_search_term_ignores_blank_query() {
        assert_eq!(CourseQuery { q: Some("  ".into()) }.search_term(), None);
        assert_eq!(CourseQuery { q: Some(" rust ".into()) }.search_term(), Some("rust"));
        assert_eq!(CourseQuery::default().search_term(), None);
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        assert_eq!(display_name("jdoe".into(), Some("Jane Doe".into())), "Jane Doe");
        assert_eq!(display_name("jdoe".into(), Some(" ".into())), "jdoe");
        assert_eq!(display_name("jdoe".into(), None), "jdoe");
    }
}
