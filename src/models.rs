//! Core data models for sitegrade
//!
//! These models are used throughout the codebase for representing
//! analysis categories, per-category reports, jobs, and monitored
//! endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// One compliance dimension scored by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Gdpr,
    Accessibility,
    Security,
    Performance,
    Seo,
}

impl Category {
    /// All categories in scoring order
    pub const ALL: [Category; 5] = [
        Category::Gdpr,
        Category::Accessibility,
        Category::Security,
        Category::Performance,
        Category::Seo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Gdpr => "gdpr",
            Category::Accessibility => "accessibility",
            Category::Security => "security",
            Category::Performance => "performance",
            Category::Seo => "seo",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gdpr" | "privacy" => Ok(Category::Gdpr),
            "accessibility" | "a11y" => Ok(Category::Accessibility),
            "security" => Ok(Category::Security),
            "performance" | "perf" => Ok(Category::Performance),
            "seo" => Ok(Category::Seo),
            other => Err(format!("unknown category '{other}'")),
        }
    }
}

/// Result of scoring one category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryReport {
    pub category: Category,
    /// Clamped to [0, 100]
    pub score: u32,
    pub grade: String,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
    /// Rule id -> whether the check passed
    #[serde(default)]
    pub signals: Map<String, Value>,
}

/// Detected platform characteristics; informational, never scored
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fingerprint {
    pub hosting: String,
    pub frameworks: Vec<String>,
    pub cms: Vec<String>,
    pub technologies: Vec<String>,
}

/// Page-level facts captured during retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMeta {
    pub final_url: String,
    pub status: u16,
    pub https: bool,
    pub load_time_ms: u64,
    pub page_size_bytes: u64,
}

/// Complete result of one analysis pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub page: PageMeta,
    pub categories: Vec<CategoryReport>,
    pub fingerprint: Fingerprint,
    pub overall_score: u32,
    pub overall_grade: String,
    pub status: ComplianceStatus,
    pub total_issues: usize,
    pub priority_issues: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Overall compliance status label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplianceStatus {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

impl ComplianceStatus {
    pub fn from_score(score: u32) -> Self {
        match score {
            s if s >= 90 => ComplianceStatus::Excellent,
            s if s >= 80 => ComplianceStatus::Good,
            s if s >= 70 => ComplianceStatus::Fair,
            s if s >= 50 => ComplianceStatus::Poor,
            _ => ComplianceStatus::Critical,
        }
    }
}

impl std::fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ComplianceStatus::Excellent => "excellent",
            ComplianceStatus::Good => "good",
            ComplianceStatus::Fair => "fair",
            ComplianceStatus::Poor => "poor",
            ComplianceStatus::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// Calculate letter grade from a 0-100 score
pub fn grade_from_score(score: u32) -> String {
    match score {
        s if s >= 90 => "A".to_string(),
        s if s >= 80 => "B".to_string(),
        s if s >= 70 => "C".to_string(),
        s if s >= 60 => "D".to_string(),
        _ => "F".to_string(),
    }
}

/// Privacy category grade bands
pub fn compliance_level(score: u32) -> String {
    match score {
        s if s >= 80 => "compliant".to_string(),
        s if s >= 50 => "partially-compliant".to_string(),
        _ => "non-compliant".to_string(),
    }
}

/// Accessibility category grade bands (WCAG conformance levels)
pub fn wcag_level(score: u32) -> String {
    match score {
        s if s >= 90 => "AAA".to_string(),
        s if s >= 80 => "AA".to_string(),
        s if s >= 70 => "A".to_string(),
        _ => "non-conformant".to_string(),
    }
}

/// Security category grade bands
pub fn security_level(score: u32) -> String {
    match score {
        s if s >= 80 => "high".to_string(),
        s if s >= 60 => "medium".to_string(),
        s if s >= 40 => "low".to_string(),
        _ => "critical".to_string(),
    }
}

/// Lifecycle states for an analysis job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobState {
    /// Whether a job in this state blocks a new submission for the same target
    pub fn in_flight(&self) -> bool {
        matches!(self, JobState::Pending | JobState::Running)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobState::Pending => "pending",
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One analysis request and its lifecycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: Uuid,
    /// Normalized target URL
    pub target: String,
    pub categories: Vec<Category>,
    pub state: JobState,
    pub result: Option<Analysis>,
    pub error: Option<String>,
    pub duration_ms: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    pub fn pending(target: String, categories: Vec<Category>) -> Self {
        Self {
            id: Uuid::new_v4(),
            target,
            categories,
            state: JobState::Pending,
            result: None,
            error: None,
            duration_ms: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }
}

/// Polling cadence tiers for monitored endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PollInterval {
    #[serde(rename = "1m")]
    Minute,
    #[default]
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "30m")]
    HalfHour,
}

impl PollInterval {
    pub fn as_duration(&self) -> std::time::Duration {
        match self {
            PollInterval::Minute => std::time::Duration::from_secs(60),
            PollInterval::FiveMinutes => std::time::Duration::from_secs(300),
            PollInterval::HalfHour => std::time::Duration::from_secs(1800),
        }
    }
}

impl std::str::FromStr for PollInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1m" => Ok(PollInterval::Minute),
            "5m" => Ok(PollInterval::FiveMinutes),
            "30m" => Ok(PollInterval::HalfHour),
            other => Err(format!("unknown interval '{other}' (expected 1m, 5m, 30m)")),
        }
    }
}

/// Reachability status of a monitored endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointStatus {
    /// Never checked yet
    #[default]
    Unknown,
    Online,
    Offline,
    /// Probe-side fault, not a confirmed outage
    Warning,
}

impl std::fmt::Display for EndpointStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EndpointStatus::Unknown => "unknown",
            EndpointStatus::Online => "online",
            EndpointStatus::Offline => "offline",
            EndpointStatus::Warning => "warning",
        };
        f.write_str(s)
    }
}

/// A URL under continuous uptime monitoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoredEndpoint {
    pub id: String,
    pub url: String,
    pub interval: PollInterval,
    pub active: bool,
    pub status: EndpointStatus,
    pub total_checks: u64,
    pub successful_checks: u64,
    pub failed_checks: u64,
    pub response_time_ms: Option<u64>,
    /// successful / total, as a percentage
    pub uptime: f64,
    pub last_check: Option<DateTime<Utc>>,
    pub last_up_time: Option<DateTime<Utc>>,
    pub last_down_time: Option<DateTime<Utc>>,
}

impl MonitoredEndpoint {
    pub fn new(id: String, url: String, interval: PollInterval) -> Self {
        Self {
            id,
            url,
            interval,
            active: true,
            status: EndpointStatus::Unknown,
            total_checks: 0,
            successful_checks: 0,
            failed_checks: 0,
            response_time_ms: None,
            uptime: 100.0,
            last_check: None,
            last_up_time: None,
            last_down_time: None,
        }
    }
}

/// Why a notification fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    AnalysisCompleted,
    AnalysisFailed,
    EndpointOnline,
    EndpointOffline,
}

/// Fire-and-forget event emitted by the job runner and the health monitor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub target: String,
    /// Job id for analysis events, endpoint id for monitoring events
    pub subject_id: String,
    pub summary: String,
    pub at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_bands() {
        assert_eq!(grade_from_score(90), "A");
        assert_eq!(grade_from_score(89), "B");
        assert_eq!(grade_from_score(80), "B");
        assert_eq!(grade_from_score(79), "C");
        assert_eq!(grade_from_score(70), "C");
        assert_eq!(grade_from_score(60), "D");
        assert_eq!(grade_from_score(59), "F");
        assert_eq!(grade_from_score(0), "F");
    }

    #[test]
    fn compliance_level_bands() {
        assert_eq!(compliance_level(80), "compliant");
        assert_eq!(compliance_level(79), "partially-compliant");
        assert_eq!(compliance_level(50), "partially-compliant");
        assert_eq!(compliance_level(49), "non-compliant");
    }

    #[test]
    fn wcag_level_bands() {
        assert_eq!(wcag_level(90), "AAA");
        assert_eq!(wcag_level(80), "AA");
        assert_eq!(wcag_level(70), "A");
        assert_eq!(wcag_level(69), "non-conformant");
    }

    #[test]
    fn security_level_bands() {
        assert_eq!(security_level(80), "high");
        assert_eq!(security_level(60), "medium");
        assert_eq!(security_level(40), "low");
        assert_eq!(security_level(39), "critical");
    }

    #[test]
    fn status_bands() {
        assert_eq!(ComplianceStatus::from_score(90), ComplianceStatus::Excellent);
        assert_eq!(ComplianceStatus::from_score(80), ComplianceStatus::Good);
        assert_eq!(ComplianceStatus::from_score(70), ComplianceStatus::Fair);
        assert_eq!(ComplianceStatus::from_score(50), ComplianceStatus::Poor);
        assert_eq!(ComplianceStatus::from_score(49), ComplianceStatus::Critical);
    }

    #[test]
    fn in_flight_states() {
        assert!(JobState::Pending.in_flight());
        assert!(JobState::Running.in_flight());
        assert!(!JobState::Completed.in_flight());
        assert!(!JobState::Failed.in_flight());
    }

    #[test]
    fn category_parse() {
        assert_eq!("gdpr".parse::<Category>().unwrap(), Category::Gdpr);
        assert_eq!("a11y".parse::<Category>().unwrap(), Category::Accessibility);
        assert!("bogus".parse::<Category>().is_err());
    }
}
