use bigdecimal::BigDecimal;
use diesel::dsl::{avg, count_star, not};
use diesel::prelude::*;
use std::collections::HashMap;

use crate::core::shared::models::{Course, Enrollment};
use crate::core::shared::schema::{ai_requests, courses, enrollments, users};

use super::recommendations::{CourseProgress, MAX_RECOMMENDATIONS};
use super::types::SystemOverview;

/// Enrollments of one student with their course titles, oldest first.
pub fn student_progress(
    conn: &mut PgConnection,
    student_id: i64,
) -> QueryResult<Vec<(Enrollment, String)>> {
    enrollments::table
        .inner_join(courses::table)
        .filter(enrollments::student_id.eq(student_id))
        .select((Enrollment::as_select(), courses::title))
        .order((enrollments::enrolled_at.asc(), enrollments::id.asc()))
        .load(conn)
}

/// Newest courses the student has not enrolled in.
pub fn unenrolled_course_titles(
    conn: &mut PgConnection,
    student_id: i64,
) -> QueryResult<Vec<String>> {
    let enrolled = enrollments::table
        .filter(enrollments::student_id.eq(student_id))
        .select(enrollments::course_id);

    courses::table
        .filter(not(courses::id.eq_any(enrolled)))
        .select(courses::title)
        .order((courses::created_at.desc(), courses::id.desc()))
        .limit(MAX_RECOMMENDATIONS as i64)
        .load(conn)
}

pub fn to_course_progress(rows: &[(Enrollment, String)]) -> Vec<CourseProgress> {
    rows.iter()
        .map(|(enrollment, title)| CourseProgress {
            title: title.clone(),
            progress: enrollment.progress.clone(),
        })
        .collect()
}

pub struct InstructorStats {
    pub courses: Vec<(Course, i64)>,
    pub average_progress: Option<BigDecimal>,
}

pub fn instructor_stats(conn: &mut PgConnection, instructor_id: i64) -> QueryResult<InstructorStats> {
    let owned: Vec<Course> = courses::table
        .filter(courses::instructor_id.eq(instructor_id))
        .select(Course::as_select())
        .order(courses::id.asc())
        .load(conn)?;

    let ids: Vec<i64> = owned.iter().map(|c| c.id).collect();

    let counts: HashMap<i64, i64> = enrollments::table
        .filter(enrollments::course_id.eq_any(ids.clone()))
        .group_by(enrollments::course_id)
        .select((enrollments::course_id, count_star()))
        .load::<(i64, i64)>(conn)?
        .into_iter()
        .collect();

    let average_progress = enrollments::table
        .filter(enrollments::course_id.eq_any(ids))
        .select(avg(enrollments::progress))
        .first::<Option<BigDecimal>>(conn)?;

    let courses = owned
        .into_iter()
        .map(|course| {
            let count = counts.get(&course.id).copied().unwrap_or(0);
            (course, count)
        })
        .collect();

    Ok(InstructorStats {
        courses,
        average_progress,
    })
}

pub fn system_overview(conn: &mut PgConnection) -> QueryResult<SystemOverview> {
    Ok(SystemOverview {
        users: users::table.count().get_result(conn)?,
        courses: courses::table.count().get_result(conn)?,
        enrollments: enrollments::table.count().get_result(conn)?,
        ai_requests: ai_requests::table.count().get_result(conn)?,
    })
}
