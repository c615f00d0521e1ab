//! Overall result aggregation
//!
//! Combines the enabled category reports into one overall score, grade,
//! and status. Zero enabled categories is a defined case, not an error.

use crate::models::{grade_from_score, CategoryReport, ComplianceStatus};

pub const NO_CATEGORIES_RECOMMENDATION: &str = "No scan categories selected";
pub const FULL_SCAN_HINT: &str =
    "Consider running a full scan to get comprehensive compliance insights";
pub const GENERIC_PRIORITY_HINT: &str =
    "Review and address the identified issues to improve compliance score";

const MAX_RECOMMENDATIONS: usize = 10;
const MAX_PRIORITY_ISSUES: usize = 5;

/// Aggregated view across enabled categories
#[derive(Debug, Clone)]
pub struct OverallResult {
    pub score: u32,
    pub grade: String,
    pub status: ComplianceStatus,
    pub total_issues: usize,
    pub priority_issues: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Aggregate the enabled category reports.
///
/// Overall score is the rounded mean. Categories scoring below 50
/// contribute their first issue to the priority list, capped at 5.
/// Recommendations concatenate in category order, capped at 10, with a
/// full-scan hint appended when fewer than three categories ran.
pub fn aggregate(reports: &[CategoryReport]) -> OverallResult {
    if reports.is_empty() {
        return OverallResult {
            score: 0,
            grade: "F".to_string(),
            status: ComplianceStatus::Critical,
            total_issues: 0,
            priority_issues: Vec::new(),
            recommendations: vec![NO_CATEGORIES_RECOMMENDATION.to_string()],
        };
    }

    let total: u64 = reports.iter().map(|r| r.score as u64).sum();
    let score = ((total as f64 / reports.len() as f64).round()) as u32;

    let total_issues: usize = reports.iter().map(|r| r.issues.len()).sum();

    let mut priority_issues: Vec<String> = Vec::new();
    for report in reports {
        if report.score < 50 {
            let first = report
                .issues
                .first()
                .cloned()
                .unwrap_or_else(|| "Critical issues found".to_string());
            priority_issues.push(format!(
                "{}: {}",
                report.category.as_str().to_uppercase(),
                first
            ));
        }
    }

    let mut recommendations: Vec<String> = reports
        .iter()
        .flat_map(|r| r.recommendations.iter().cloned())
        .collect();
    if reports.len() < 3 {
        recommendations.push(FULL_SCAN_HINT.to_string());
    }
    if priority_issues.is_empty() && score < 80 {
        priority_issues.push(GENERIC_PRIORITY_HINT.to_string());
    }

    recommendations.truncate(MAX_RECOMMENDATIONS);
    priority_issues.truncate(MAX_PRIORITY_ISSUES);

    OverallResult {
        score,
        grade: grade_from_score(score),
        status: ComplianceStatus::from_score(score),
        total_issues,
        priority_issues,
        recommendations,
    }
}
