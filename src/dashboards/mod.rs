//! Role-specific landing pages: a student's progress with suggestions, an
//! instructor's course analytics and the admin system overview.

pub mod recommendations;
pub mod storage;
pub mod types;

use axum::{extract::State, response::Json, routing::get, Router};
use bigdecimal::BigDecimal;

use crate::core::error::ApiResult;
use crate::core::shared::state::AppState;
use crate::core::shared::utils::with_conn;
use crate::learn::format_progress;
use crate::security::auth_api::{require_role, AuthenticatedUser, Role};

pub use recommendations::build_recommendations;
pub use types::*;

pub async fn handle_student_dashboard(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<StudentDashboard>> {
    require_role(&user, Role::Student)?;
    let student_id = user.user_id;

    let (progress, unenrolled) = with_conn(&state.conn, move |conn| {
        let progress = storage::student_progress(conn, student_id)?;
        let unenrolled = storage::unenrolled_course_titles(conn, student_id)?;
        Ok((progress, unenrolled))
    })
    .await?;

    let ai_recommendations =
        build_recommendations(&storage::to_course_progress(&progress), &unenrolled);
    let enrollments = progress
        .into_iter()
        .map(|(enrollment, course_title)| EnrollmentSummary {
            course_id: enrollment.course_id,
            course_title,
            progress: format_progress(&enrollment.progress),
        })
        .collect();

    Ok(Json(StudentDashboard {
        enrollments,
        ai_recommendations,
    }))
}

pub async fn handle_instructor_dashboard(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<InstructorDashboard>> {
    require_role(&user, Role::Instructor)?;
    let instructor_id = user.user_id;

    let stats = with_conn(&state.conn, move |conn| {
        Ok(storage::instructor_stats(conn, instructor_id)?)
    })
    .await?;

    let total_enrollments = stats.courses.iter().map(|(_, count)| count).sum();
    let average_progress = stats.average_progress.unwrap_or_else(|| BigDecimal::from(0));
    let courses: Vec<InstructorCourseSummary> = stats
        .courses
        .into_iter()
        .map(|(course, enrolled_count)| InstructorCourseSummary {
            id: course.id,
            title: course.title,
            enrolled_count,
        })
        .collect();

    Ok(Json(InstructorDashboard {
        analytics: InstructorAnalytics {
            total_courses: courses.len() as i64,
            total_enrollments,
            average_progress: format_progress(&average_progress),
        },
        courses,
    }))
}

pub async fn handle_admin_dashboard(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<Json<AdminDashboard>> {
    require_role(&user, Role::Admin)?;

    let system_overview =
        with_conn(&state.conn, |conn| Ok(storage::system_overview(conn)?)).await?;

    Ok(Json(AdminDashboard {
        system_overview,
        access_control: admin_access_control(),
    }))
}

pub fn configure() -> Router<AppState> {
    Router::new()
        .route("/api/dashboard/student", get(handle_student_dashboard))
        .route("/api/dashboard/instructor", get(handle_instructor_dashboard))
        .route("/api/dashboard/admin", get(handle_admin_dashboard))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_payload_shape() {
        let payload = AdminDashboard {
            system_overview: SystemOverview {
                users: 3,
                courses: 2,
                enrollments: 4,
                ai_requests: 1,
            },
            access_control: admin_access_control(),
        };
        let json = serde_json::to_value(payload).expect("json");

        assert_eq!(json["systemOverview"]["users"], 3);
        assert_eq!(json["systemOverview"]["aiRequests"], 1);
        assert_eq!(json["accessControl"][0], "Manage Roles");
        assert_eq!(json["accessControl"][1], "Audit Logs");
    }

    #[test]
    fn test_instructor_payload_shape() {
        let payload = InstructorDashboard {
            courses: vec![InstructorCourseSummary {
                id: 7,
                title: "Rust".into(),
                enrolled_count: 2,
            }],
            analytics: InstructorAnalytics {
                total_courses: 1,
                total_enrollments: 2,
                average_progress: format_progress(&BigDecimal::from(40)),
            },
        };
        let json = serde_json::to_value(payload).expect("json");

        assert_eq!(json["courses"][0]["enrolledCount"], 2);
        assert_eq!(json["analytics"]["totalCourses"], 1);
        assert_eq!(json["analytics"]["averageProgress"], "40.00");
    }
}
