use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDashboard {
    pub enrollments: Vec<EnrollmentSummary>,
    pub ai_recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentSummary {
    pub course_id: i64,
    pub course_title: String,
    pub progress: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructorDashboard {
    pub courses: Vec<InstructorCourseSummary>,
    pub analytics: InstructorAnalytics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructorCourseSummary {
    pub id: i64,
    pub title: String,
    pub enrolled_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructorAnalytics {
    pub total_courses: i64,
    pub total_enrollments: i64,
    pub average_progress: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboard {
    pub system_overview: SystemOverview,
    pub access_control: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemOverview {
    pub users: i64,
    pub courses: i64,
    pub enrollments: i64,
    pub ai_requests: i64,
}

pub fn admin_access_control() -> Vec<String> {
    vec!["Manage Roles".to_string(), "Audit Logs".to_string()]
}
