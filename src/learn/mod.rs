//! # Learn Module
//!
//! Course catalogue and student enrollments.
//!
//! - Courses: public catalogue browsing, instructor-owned CRUD, rosters
//! - Enrollments: idempotent enroll, progress tracking, unenroll
//!
//! [`LearnEngine`] holds the queries; the handlers in [`courses`] and
//! [`enrollments`] add authorization, validation and activity logging.

use axum::Router;
use bigdecimal::BigDecimal;
use chrono::Utc;
use diesel::prelude::*;

use crate::core::error::{ApiError, ApiResult};
use crate::core::shared::models::{Course, Enrollment, NewCourse, NewEnrollment};
use crate::core::shared::schema;
use crate::core::shared::state::AppState;
use crate::core::shared::utils::{with_conn, DbPool};
use crate::security::auth_api::AuthenticatedUser;

pub mod courses;
pub mod enrollments;
pub mod types;

pub use types::*;

pub struct LearnEngine {
    db: DbPool,
}

impl LearnEngine {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    // ----- Course Operations -----

    pub async fn list_courses(&self, search: Option<String>) -> ApiResult<Vec<CourseResponse>> {
        with_conn(&self.db, move |conn| {
            let mut query = schema::courses::table
                .inner_join(schema::users::table)
                .select((Course::as_select(), schema::users::username, schema::users::full_name))
                .into_boxed();

            if let Some(term) = search {
                query = query.filter(schema::courses::title.ilike(format!("%{}%", escape_like(&term))));
            }

            let rows: Vec<CourseRow> = query.order(schema::courses::id.asc()).load(conn)?;
            Ok(rows.into_iter().map(CourseResponse::from).collect())
        })
        .await
    }

    pub async fn list_courses_by_instructor(
        &self,
        instructor_id: i64,
    ) -> ApiResult<Vec<CourseResponse>> {
        with_conn(&self.db, move |conn| {
            let rows: Vec<CourseRow> = schema::courses::table
                .inner_join(schema::users::table)
                .filter(schema::courses::instructor_id.eq(instructor_id))
                .select((Course::as_select(), schema::users::username, schema::users::full_name))
                .order(schema::courses::id.asc())
                .load(conn)?;
            Ok(rows.into_iter().map(CourseResponse::from).collect())
        })
        .await
    }

    pub async fn get_course(&self, course_id: i64) -> ApiResult<CourseResponse> {
        with_conn(&self.db, move |conn| {
            let row: Option<CourseRow> = schema::courses::table
                .inner_join(schema::users::table)
                .filter(schema::courses::id.eq(course_id))
                .select((Course::as_select(), schema::users::username, schema::users::full_name))
                .first(conn)
                .optional()?;
            row.map(CourseResponse::from)
                .ok_or_else(|| ApiError::not_found("Course not found"))
        })
        .await
    }

    pub async fn create_course(
        &self,
        req: CourseRequest,
        instructor_id: i64,
    ) -> ApiResult<CourseResponse> {
        let course_id = with_conn(&self.db, move |conn| {
            let id = diesel::insert_into(schema::courses::table)
                .values(&NewCourse {
                    title: req.trimmed_title(),
                    description: req.description.as_deref(),
                    instructor_id,
                    created_at: Utc::now(),
                })
                .returning(schema::courses::id)
                .get_result::<i64>(conn)?;
            Ok(id)
        })
        .await?;

        self.get_course(course_id).await
    }

    /// Instructors may only touch their own courses; admins may touch any.
    pub async fn owned_course(&self, user: &AuthenticatedUser, course_id: i64) -> ApiResult<Course> {
        let course = with_conn(&self.db, move |conn| {
            schema::courses::table
                .find(course_id)
                .select(Course::as_select())
                .first(conn)
                .optional()?
                .ok_or_else(|| ApiError::not_found("Course not found"))
        })
        .await?;

        if !user.is_admin() && course.instructor_id != user.user_id {
            return Err(ApiError::forbidden("You can only modify your own courses"));
        }
        Ok(course)
    }

    pub async fn update_course(&self, course_id: i64, req: CourseRequest) -> ApiResult<CourseResponse> {
        with_conn(&self.db, move |conn| {
            diesel::update(schema::courses::table.find(course_id))
                .set((
                    schema::courses::title.eq(req.trimmed_title()),
                    schema::courses::description.eq(req.description.as_deref()),
                ))
                .execute(conn)?;
            Ok(())
        })
        .await?;

        self.get_course(course_id).await
    }

    pub async fn delete_course(&self, course_id: i64) -> ApiResult<()> {
        let removed = with_conn(&self.db, move |conn| {
            Ok(diesel::delete(schema::courses::table.find(course_id)).execute(conn)?)
        })
        .await?;

        if removed == 0 {
            return Err(ApiError::not_found("Course not found"));
        }
        Ok(())
    }

    pub async fn roster(&self, course_id: i64) -> ApiResult<Vec<RosterEntry>> {
        with_conn(&self.db, move |conn| {
            let rows: Vec<(Enrollment, String, Option<String>)> = schema::enrollments::table
                .inner_join(schema::users::table.on(schema::users::id.eq(schema::enrollments::student_id)))
                .filter(schema::enrollments::course_id.eq(course_id))
                .select((Enrollment::as_select(), schema::users::username, schema::users::full_name))
                .order(schema::enrollments::enrolled_at.asc())
                .load(conn)?;

            Ok(rows
                .into_iter()
                .map(|(enrollment, username, full_name)| RosterEntry {
                    enrollment_id: enrollment.id,
                    student_id: enrollment.student_id,
                    username,
                    full_name,
                    progress: format_progress(&enrollment.progress),
                    enrolled_at: enrollment.enrolled_at,
                })
                .collect())
        })
        .await
    }

    // ----- Enrollment Operations -----

    async fn require_course(&self, course_id: i64) -> ApiResult<()> {
        let exists = with_conn(&self.db, move |conn| {
            let exists = diesel::select(diesel::dsl::exists(schema::courses::table.find(course_id)))
                .get_result::<bool>(conn)?;
            Ok(exists)
        })
        .await?;

        if exists {
            Ok(())
        } else {
            Err(ApiError::not_found("Course not found"))
        }
    }

    /// Find-or-create. The flag is true when a new enrollment was created.
    pub async fn enroll(&self, student_id: i64, course_id: i64) -> ApiResult<(EnrollmentResponse, bool)> {
        self.require_course(course_id).await?;

        with_conn(&self.db, move |conn| {
            let inserted = diesel::insert_into(schema::enrollments::table)
                .values(&NewEnrollment {
                    student_id,
                    course_id,
                    progress: BigDecimal::from(0),
                    enrolled_at: Utc::now(),
                })
                .on_conflict((schema::enrollments::student_id, schema::enrollments::course_id))
                .do_nothing()
                .execute(conn)?;

            let row = find_enrollment(conn, student_id, course_id)?
                .ok_or_else(|| ApiError::Internal("Enrollment vanished after insert".into()))?;
            Ok((EnrollmentResponse::from(row), inserted > 0))
        })
        .await
    }

    pub async fn list_enrollments(&self, student_id: i64) -> ApiResult<Vec<EnrollmentResponse>> {
        with_conn(&self.db, move |conn| {
            let rows: Vec<(Enrollment, String)> = schema::enrollments::table
                .inner_join(schema::courses::table)
                .filter(schema::enrollments::student_id.eq(student_id))
                .select((Enrollment::as_select(), schema::courses::title))
                .order((schema::enrollments::enrolled_at.asc(), schema::enrollments::id.asc()))
                .load(conn)?;
            Ok(rows.into_iter().map(EnrollmentResponse::from).collect())
        })
        .await
    }

    pub async fn update_progress(
        &self,
        student_id: i64,
        req: ProgressRequest,
    ) -> ApiResult<EnrollmentResponse> {
        let course_id = req.course_id;
        self.require_course(course_id).await?;
        let progress = req.normalized_progress();

        with_conn(&self.db, move |conn| {
            let updated = diesel::update(
                schema::enrollments::table
                    .filter(schema::enrollments::student_id.eq(student_id))
                    .filter(schema::enrollments::course_id.eq(course_id)),
            )
            .set(schema::enrollments::progress.eq(progress))
            .execute(conn)?;

            if updated == 0 {
                return Err(ApiError::bad_request("Not enrolled"));
            }

            find_enrollment(conn, student_id, course_id)?
                .map(EnrollmentResponse::from)
                .ok_or_else(|| ApiError::bad_request("Not enrolled"))
        })
        .await
    }

    pub async fn unenroll(&self, student_id: i64, course_id: i64) -> ApiResult<()> {
        let removed = with_conn(&self.db, move |conn| {
            Ok(diesel::delete(
                schema::enrollments::table
                    .filter(schema::enrollments::student_id.eq(student_id))
                    .filter(schema::enrollments::course_id.eq(course_id)),
            )
            .execute(conn)?)
        })
        .await?;

        if removed == 0 {
            return Err(ApiError::not_found("Not enrolled"));
        }
        Ok(())
    }
}

fn find_enrollment(
    conn: &mut PgConnection,
    student_id: i64,
    course_id: i64,
) -> QueryResult<Option<(Enrollment, String)>> {
    schema::enrollments::table
        .inner_join(schema::courses::table)
        .filter(schema::enrollments::student_id.eq(student_id))
        .filter(schema::enrollments::course_id.eq(course_id))
        .select((Enrollment::as_select(), schema::courses::title))
        .first(conn)
        .optional()
}

/// Escapes LIKE wildcards so user input matches literally.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

pub fn configure() -> Router<AppState> {
    Router::new()
        .merge(courses::configure())
        .merge(enrollments::configure())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("rust"), "rust");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("c:\\"), "c:\\\\");
    }
}
