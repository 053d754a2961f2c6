use bigdecimal::{BigDecimal, RoundingMode};

pub const MAX_RECOMMENDATIONS: usize = 5;
pub const MAX_CONTINUE: usize = 3;
pub const FALLBACK_RECOMMENDATION: &str = "Browse the course catalogue to get started";

#[derive(Debug, Clone)]
pub struct CourseProgress {
    pub title: String,
    pub progress: BigDecimal,
}

/// Builds the student dashboard suggestions.
///
/// Unfinished enrollments come first, least progress first, followed by
/// courses the student has not joined. `unenrolled` is expected newest first.
pub fn build_recommendations(enrolled: &[CourseProgress], unenrolled: &[String]) -> Vec<String> {
    let hundred = BigDecimal::from(100);

    let mut unfinished: Vec<&CourseProgress> =
        enrolled.iter().filter(|c| c.progress < hundred).collect();
    unfinished.sort_by(|a, b| a.progress.cmp(&b.progress));

    let mut out: Vec<String> = unfinished
        .into_iter()
        .take(MAX_CONTINUE)
        .map(|c| {
            format!(
                "Continue {} ({}% complete)",
                c.title,
                c.progress.with_scale_round(0, RoundingMode::HalfUp)
            )
        })
        .collect();

    let room = MAX_RECOMMENDATIONS.saturating_sub(out.len());
    out.extend(
        unenrolled
            .iter()
            .take(room)
            .map(|title| format!("Explore {title}")),
    );

    if out.is_empty() {
        out.push(FALLBACK_RECOMMENDATION.to_string());
    }
    out
}
